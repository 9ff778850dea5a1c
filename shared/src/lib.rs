//! Shared types and models for the Inventory POS platform
//!
//! This crate contains the domain types and pure stock/sale arithmetic shared
//! between the backend and the point-of-sale frontend (via WASM).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
