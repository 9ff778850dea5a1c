//! Domain models for the Inventory POS platform

mod inventory;
mod product;
mod sale;
mod user;

pub use inventory::*;
pub use product::*;
pub use sale::*;
pub use user::*;
