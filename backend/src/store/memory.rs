//! In-memory stock store
//!
//! Used by tests and local demos. A unit holds the store mutex for its whole
//! lifetime and stages its writes; they are applied only on commit, so a
//! dropped unit leaves no trace. Faults can be injected to exercise the
//! coordinator's rollback and retry paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use shared::models::{
    InventoryLogEntry, InventoryLogView, LogFilter, NewLogEntry, NewSale, NewVariant,
    ProductVariant, Sale, SaleFilter, SaleView, VariantDetails,
};

use super::{ensure_non_negative, StockStore, StockUnit};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct MemoryState {
    products: HashMap<Uuid, String>,
    users: HashMap<Uuid, String>,
    variants: HashMap<Uuid, ProductVariant>,
    sales: Vec<Sale>,
    logs: Vec<InventoryLogEntry>,
    last_seq: i64,
}

impl MemoryState {
    fn log_view(&self, entry: &InventoryLogEntry) -> InventoryLogView {
        let variant = entry.variant_id.and_then(|id| self.variants.get(&id));
        InventoryLogView {
            entry: entry.clone(),
            variant_name: variant.map(|v| v.variant_name.clone()),
            variant_sku: variant.map(|v| v.sku.clone()),
            product_name: variant.and_then(|v| self.products.get(&v.product_id).cloned()),
            performed_by_name: entry.performed_by.and_then(|id| self.users.get(&id).cloned()),
        }
    }

    fn sale_view(&self, sale: &Sale) -> SaleView {
        let variant = self.variants.get(&sale.variant_id);
        SaleView {
            sale: sale.clone(),
            variant_name: variant.map(|v| v.variant_name.clone()),
            variant_sku: variant.map(|v| v.sku.clone()),
            product_name: variant.and_then(|v| self.products.get(&v.product_id).cloned()),
            sold_by_name: sale.sold_by.and_then(|id| self.users.get(&id).cloned()),
        }
    }
}

#[derive(Default)]
struct Faults {
    fail_next_append: AtomicBool,
    conflicts: AtomicU32,
}

/// Stock store kept entirely in process memory
#[derive(Clone, Default)]
pub struct InMemoryStockStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product that variants can be created under
    pub async fn add_product(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().await.products.insert(id, name.to_string());
        id
    }

    /// Register a display name for a user id
    pub async fn register_user(&self, id: Uuid, name: &str) {
        self.state.lock().await.users.insert(id, name.to_string());
    }

    pub async fn sale_count(&self) -> usize {
        self.state.lock().await.sales.len()
    }

    pub async fn log_count(&self) -> usize {
        self.state.lock().await.logs.len()
    }

    /// Committed state of a variant
    pub async fn variant(&self, id: Uuid) -> Option<ProductVariant> {
        self.state.lock().await.variants.get(&id).cloned()
    }

    /// Committed ledger entries for a variant in creation order
    pub async fn variant_history(&self, variant_id: Uuid) -> Vec<InventoryLogEntry> {
        self.state
            .lock()
            .await
            .logs
            .iter()
            .filter(|e| e.variant_id == Some(variant_id))
            .cloned()
            .collect()
    }

    /// The next ledger append fails with an internal error
    pub fn fail_next_ledger_append(&self) {
        self.faults.fail_next_append.store(true, Ordering::SeqCst);
    }

    /// The next `count` quantity writes report a concurrent modification
    pub fn inject_conflicts(&self, count: u32) {
        self.faults.conflicts.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn begin(&self) -> AppResult<Box<dyn StockUnit>> {
        let state = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryUnit {
            state,
            faults: self.faults.clone(),
            variants: HashMap::new(),
            sales: Vec::new(),
            logs: Vec::new(),
        }))
    }

    async fn query_logs(&self, filter: &LogFilter) -> AppResult<Vec<InventoryLogView>> {
        let state = self.state.lock().await;
        Ok(state
            .logs
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .take(filter.limit as usize)
            .map(|e| state.log_view(e))
            .collect())
    }

    async fn list_sales(&self, filter: &SaleFilter) -> AppResult<Vec<SaleView>> {
        let state = self.state.lock().await;
        let mut sales: Vec<&Sale> = state
            .sales
            .iter()
            .rev()
            .filter(|s| filter.period.contains(s.sale_date))
            .collect();
        sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
        Ok(sales.into_iter().map(|s| state.sale_view(s)).collect())
    }

    async fn find_sale(&self, id: Uuid) -> AppResult<Option<SaleView>> {
        let state = self.state.lock().await;
        Ok(state
            .sales
            .iter()
            .find(|s| s.id == id)
            .map(|s| state.sale_view(s)))
    }
}

struct MemoryUnit {
    state: OwnedMutexGuard<MemoryState>,
    faults: Arc<Faults>,
    variants: HashMap<Uuid, ProductVariant>,
    sales: Vec<Sale>,
    logs: Vec<InventoryLogEntry>,
}

impl MemoryUnit {
    fn visible(&self, id: Uuid) -> Option<&ProductVariant> {
        self.variants.get(&id).or_else(|| self.state.variants.get(&id))
    }

    fn sku_taken(&self, sku: &str, except: Option<Uuid>) -> bool {
        let staged = self.variants.values();
        let stored = self
            .state
            .variants
            .values()
            .filter(|v| !self.variants.contains_key(&v.id));
        staged
            .chain(stored)
            .any(|v| Some(v.id) != except && v.sku == sku)
    }
}

#[async_trait]
impl StockUnit for MemoryUnit {
    async fn lock_variant(&mut self, id: Uuid) -> AppResult<Option<ProductVariant>> {
        Ok(self.visible(id).cloned())
    }

    async fn insert_variant(
        &mut self,
        product_id: Uuid,
        variant: &NewVariant,
    ) -> AppResult<ProductVariant> {
        ensure_non_negative(0, variant.quantity)?;
        if !self.state.products.contains_key(&product_id) {
            return Err(AppError::NotFound("Product".to_string()));
        }
        let sku = variant.sku.trim();
        if self.sku_taken(sku, None) {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        let now = Utc::now();
        let created = ProductVariant {
            id: Uuid::new_v4(),
            product_id,
            variant_name: variant.variant_name.clone(),
            sku: sku.to_string(),
            purchase_price: variant.purchase_price,
            selling_price: variant.selling_price,
            quantity: variant.quantity,
            min_stock_level: variant.min_stock_level,
            created_at: now,
            updated_at: now,
        };
        self.variants.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_variant_details(
        &mut self,
        id: Uuid,
        details: &VariantDetails,
    ) -> AppResult<ProductVariant> {
        let mut variant = self.visible(id).cloned().ok_or(AppError::VariantNotFound(id))?;
        let sku = details.sku.trim();
        if self.sku_taken(sku, Some(id)) {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        variant.variant_name = details.variant_name.clone();
        variant.sku = sku.to_string();
        variant.purchase_price = details.purchase_price;
        variant.selling_price = details.selling_price;
        variant.min_stock_level = details.min_stock_level;
        variant.updated_at = Utc::now();

        self.variants.insert(id, variant.clone());
        Ok(variant)
    }

    async fn set_quantity(
        &mut self,
        id: Uuid,
        expected: i32,
        new_quantity: i32,
    ) -> AppResult<ProductVariant> {
        let injected = self
            .faults
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(AppError::ConcurrencyConflict);
        }
        ensure_non_negative(expected, new_quantity)?;

        let mut variant = self.visible(id).cloned().ok_or(AppError::VariantNotFound(id))?;
        if variant.quantity != expected {
            return Err(AppError::ConcurrencyConflict);
        }
        variant.quantity = new_quantity;
        variant.updated_at = Utc::now();

        self.variants.insert(id, variant.clone());
        Ok(variant)
    }

    async fn insert_sale(&mut self, sale: &NewSale) -> AppResult<Sale> {
        if self.visible(sale.variant_id).is_none() {
            return Err(AppError::VariantNotFound(sale.variant_id));
        }
        let created = Sale {
            id: Uuid::new_v4(),
            variant_id: sale.variant_id,
            quantity: sale.quantity,
            unit_price: sale.unit_price,
            total_amount: sale.totals.total_amount,
            profit: sale.totals.profit,
            sold_by: sale.sold_by,
            customer_name: sale.customer.customer_name.clone(),
            customer_phone: sale.customer.customer_phone.clone(),
            notes: sale.customer.notes.clone(),
            sale_date: Utc::now(),
        };
        self.sales.push(created.clone());
        Ok(created)
    }

    async fn append_log(&mut self, entry: &NewLogEntry) -> AppResult<InventoryLogEntry> {
        if self.faults.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal("ledger append failed".to_string()));
        }
        let adds_up = entry.previous_quantity.checked_add(entry.quantity_change)
            == Some(entry.new_quantity);
        if entry.quantity_change == 0 || !adds_up {
            return Err(AppError::Internal(format!(
                "rejected ledger row {} + {} -> {}",
                entry.previous_quantity, entry.quantity_change, entry.new_quantity
            )));
        }

        let sequence = self.state.last_seq + self.logs.len() as i64 + 1;
        let created = InventoryLogEntry {
            id: Uuid::new_v4(),
            sequence,
            variant_id: Some(entry.variant_id),
            action: entry.action,
            quantity_change: entry.quantity_change,
            previous_quantity: entry.previous_quantity,
            new_quantity: entry.new_quantity,
            performed_by: entry.performed_by,
            notes: Some(entry.notes.clone()),
            created_at: Utc::now(),
        };
        self.logs.push(created.clone());
        Ok(created)
    }

    async fn variant_history(&mut self, variant_id: Uuid) -> AppResult<Vec<InventoryLogEntry>> {
        Ok(self
            .state
            .logs
            .iter()
            .chain(self.logs.iter())
            .filter(|e| e.variant_id == Some(variant_id))
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnit {
            mut state,
            variants,
            sales,
            logs,
            ..
        } = *self;

        if let Some(last) = logs.last() {
            state.last_seq = last.sequence;
        }
        state.variants.extend(variants);
        state.sales.extend(sales);
        state.logs.extend(logs);
        Ok(())
    }
}
