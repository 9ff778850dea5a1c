//! Business logic services for the Inventory POS platform

pub mod catalog;
pub mod ledger;
pub mod sales;
pub mod stock;

pub use catalog::CatalogService;
pub use ledger::{InventoryLedger, LedgerQuery, StockAudit};
pub use sales::SaleRecorder;
pub use stock::StockCoordinator;
