//! Inventory ledger queries, audit and export
//!
//! Read side only. Ledger rows are written exclusively by the stock
//! coordinator inside its units.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use shared::models::{InventoryAction, InventoryLogEntry, InventoryLogView, LogFilter};
use shared::{replay_quantity, DateRange};

use crate::config::LedgerConfig;
use crate::error::{AppError, AppResult};
use crate::store::StockStore;

/// Caller-supplied ledger filters before limits are applied
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    pub variant_id: Option<Uuid>,
    pub action: Option<InventoryAction>,
    pub period: DateRange,
    pub limit: Option<u32>,
}

/// Result of replaying a variant's ledger against its stored quantity
#[derive(Debug, Clone, Serialize)]
pub struct StockAudit {
    pub variant_id: Uuid,
    /// Quantity reached by replaying the ledger; `None` if the replay broke
    pub ledger_quantity: Option<i32>,
    pub current_quantity: i32,
    pub consistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    pub entries: Vec<InventoryLogEntry>,
}

/// Flat CSV row for ledger export
#[derive(Debug, Serialize)]
struct LedgerCsvRow<'a> {
    id: Uuid,
    created_at: DateTime<Utc>,
    action: &'static str,
    quantity_change: i32,
    previous_quantity: i32,
    new_quantity: i32,
    variant_id: Option<Uuid>,
    variant_sku: Option<&'a str>,
    variant_name: Option<&'a str>,
    product_name: Option<&'a str>,
    performed_by: Option<Uuid>,
    performed_by_name: Option<&'a str>,
    notes: Option<&'a str>,
}

impl<'a> From<&'a InventoryLogView> for LedgerCsvRow<'a> {
    fn from(view: &'a InventoryLogView) -> Self {
        let entry = &view.entry;
        Self {
            id: entry.id,
            created_at: entry.created_at,
            action: entry.action.as_str(),
            quantity_change: entry.quantity_change,
            previous_quantity: entry.previous_quantity,
            new_quantity: entry.new_quantity,
            variant_id: entry.variant_id,
            variant_sku: view.variant_sku.as_deref(),
            variant_name: view.variant_name.as_deref(),
            product_name: view.product_name.as_deref(),
            performed_by: entry.performed_by,
            performed_by_name: view.performed_by_name.as_deref(),
            notes: entry.notes.as_deref(),
        }
    }
}

/// Inventory ledger service
#[derive(Clone)]
pub struct InventoryLedger {
    store: Arc<dyn StockStore>,
    limits: LedgerConfig,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn StockStore>, limits: LedgerConfig) -> Self {
        Self { store, limits }
    }

    /// Rows to return: the default when absent or zero, never above the cap
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .filter(|limit| *limit > 0)
            .unwrap_or(self.limits.default_limit)
            .min(self.limits.max_limit)
    }

    /// Matching entries, newest first
    pub async fn query(&self, query: LedgerQuery) -> AppResult<Vec<InventoryLogView>> {
        let filter = LogFilter {
            variant_id: query.variant_id,
            action: query.action,
            period: query.period,
            limit: self.effective_limit(query.limit),
        };
        self.store.query_logs(&filter).await
    }

    /// Replay a variant's ledger and compare it with the stored quantity.
    ///
    /// The variant is locked while its history is read so both come from the
    /// same point in time; the unit writes nothing.
    pub async fn audit(&self, variant_id: Uuid) -> AppResult<StockAudit> {
        let mut unit = self.store.begin().await?;
        let variant = unit
            .lock_variant(variant_id)
            .await?
            .ok_or(AppError::VariantNotFound(variant_id))?;
        let entries = unit.variant_history(variant_id).await?;
        unit.commit().await?;

        let (ledger_quantity, problem) = match replay_quantity(&entries) {
            Ok(quantity) => (Some(quantity), None),
            Err(err) => (None, Some(err.to_string())),
        };
        let consistent = ledger_quantity == Some(variant.quantity);
        if !consistent {
            tracing::warn!(
                %variant_id,
                ?ledger_quantity,
                current_quantity = variant.quantity,
                "ledger does not reproduce stored quantity"
            );
        }

        Ok(StockAudit {
            variant_id,
            ledger_quantity,
            current_quantity: variant.quantity,
            consistent,
            problem,
            entries,
        })
    }

    /// Export ledger rows as CSV
    pub fn export_to_csv(rows: &[InventoryLogView]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for row in rows {
            wtr.serialize(LedgerCsvRow::from(row))
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
