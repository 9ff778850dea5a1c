//! Persistence seam for variant stock, sales and the inventory ledger
//!
//! A [`StockUnit`] is one atomic unit of work: every write made through it
//! becomes visible together on [`StockUnit::commit`], and dropping the unit
//! without committing discards all of them. Only the stock coordinator opens
//! units; nothing else writes `product_variants.quantity`.

use async_trait::async_trait;
use uuid::Uuid;

use shared::models::{
    InventoryLogEntry, InventoryLogView, LogFilter, NewLogEntry, NewSale, NewVariant,
    ProductVariant, Sale, SaleFilter, SaleView, VariantDetails,
};

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStockStore;
pub use postgres::PgStockStore;

/// Backing store for the stock subsystem
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Open an atomic unit of work
    async fn begin(&self) -> AppResult<Box<dyn StockUnit>>;

    /// Ledger entries matching `filter`, newest first, at most `filter.limit`
    async fn query_logs(&self, filter: &LogFilter) -> AppResult<Vec<InventoryLogView>>;

    /// Sales matching `filter`, newest first
    async fn list_sales(&self, filter: &SaleFilter) -> AppResult<Vec<SaleView>>;

    async fn find_sale(&self, id: Uuid) -> AppResult<Option<SaleView>>;
}

/// One atomic unit of work against the store
#[async_trait]
pub trait StockUnit: Send {
    /// Read a variant and hold it exclusively until the unit ends
    async fn lock_variant(&mut self, id: Uuid) -> AppResult<Option<ProductVariant>>;

    /// Insert a variant under `product_id` with `variant.quantity` as its stock
    async fn insert_variant(
        &mut self,
        product_id: Uuid,
        variant: &NewVariant,
    ) -> AppResult<ProductVariant>;

    /// Replace the non-stock fields of a locked variant
    async fn update_variant_details(
        &mut self,
        id: Uuid,
        details: &VariantDetails,
    ) -> AppResult<ProductVariant>;

    /// Move stock from `expected` to `new_quantity`.
    ///
    /// Fails with `ConcurrencyConflict` if the stored value is no longer
    /// `expected`, and with `InsufficientStock` if `new_quantity` is negative.
    async fn set_quantity(
        &mut self,
        id: Uuid,
        expected: i32,
        new_quantity: i32,
    ) -> AppResult<ProductVariant>;

    async fn insert_sale(&mut self, sale: &NewSale) -> AppResult<Sale>;

    /// Append one ledger row. Ledger rows are never updated or removed.
    async fn append_log(&mut self, entry: &NewLogEntry) -> AppResult<InventoryLogEntry>;

    /// Every ledger entry for a variant in creation order, as seen by this unit.
    /// Read after `lock_variant`, it cannot interleave with a stock change.
    async fn variant_history(&mut self, variant_id: Uuid) -> AppResult<Vec<InventoryLogEntry>>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Guard shared by store implementations: stock never goes below zero
pub(crate) fn ensure_non_negative(expected: i32, new_quantity: i32) -> AppResult<()> {
    if new_quantity < 0 {
        return Err(crate::error::AppError::InsufficientStock {
            available: expected,
            requested: expected.saturating_sub(new_quantity),
        });
    }
    Ok(())
}
