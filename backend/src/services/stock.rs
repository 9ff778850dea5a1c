//! Stock transaction coordinator
//!
//! The only code path that changes a variant's quantity. Every change runs
//! inside one store unit together with its ledger entry (and sale row, for
//! sales), so either all of them commit or none do. Units that lose a race
//! are retried a bounded number of times; business rule failures are not.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{
    CustomerInfo, InventoryAction, NewLogEntry, NewSale, NewVariant, ProductVariant, Sale,
    VariantUpdate,
};
use shared::{
    check_price, compute_sale_totals, has_sufficient_stock, validate_new_variant,
    validate_quantity_change, validate_sale_quantity, validate_variant_update, Principal,
};

use crate::config::StockConfig;
use crate::error::{AppError, AppResult};
use crate::store::{StockStore, StockUnit};

const ADJUSTMENT_NOTE: &str = "Stock adjustment";
const INITIAL_STOCK_NOTE: &str = "Initial stock added";
const EDIT_NOTE: &str = "Stock updated";

/// Coordinates every quantity-changing operation on product variants
#[derive(Clone)]
pub struct StockCoordinator {
    store: Arc<dyn StockStore>,
    policy: StockConfig,
}

impl StockCoordinator {
    pub fn new(store: Arc<dyn StockStore>, policy: StockConfig) -> Self {
        Self { store, policy }
    }

    /// Sell `quantity` units of a variant at `unit_price`.
    ///
    /// Totals are computed from the purchase price read under the row lock.
    #[tracing::instrument(
        skip(self, principal, customer),
        fields(user_id = %principal.user_id)
    )]
    pub async fn record_sale(
        &self,
        variant_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        principal: &Principal,
        customer: CustomerInfo,
    ) -> AppResult<Sale> {
        validate_sale_quantity(quantity).map_err(|message| {
            AppError::validation("quantity", message, "La cantidad debe ser al menos 1")
        })?;
        check_price(&unit_price).map_err(|message| {
            AppError::validation(
                "unit_price",
                message,
                "El precio debe ser positivo, con hasta dos decimales y no mayor a 9999999999.99",
            )
        })?;

        let customer = &customer;
        let sale = self
            .with_retry("record_sale", move || {
                self.try_record_sale(variant_id, quantity, unit_price, principal, customer)
            })
            .await?;

        tracing::info!(sale_id = %sale.id, total = %sale.total_amount, "sale recorded");
        Ok(sale)
    }

    /// Add (positive) or remove (negative) stock by hand
    #[tracing::instrument(
        skip(self, principal, notes),
        fields(user_id = %principal.user_id)
    )]
    pub async fn adjust_stock(
        &self,
        variant_id: Uuid,
        quantity_change: i32,
        principal: &Principal,
        notes: Option<String>,
    ) -> AppResult<ProductVariant> {
        validate_quantity_change(quantity_change).map_err(|message| {
            AppError::validation(
                "quantity_change",
                message,
                "El cambio de cantidad debe ser un entero distinto de cero",
            )
        })?;

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ADJUSTMENT_NOTE.to_string());
        let notes = notes.as_str();

        self.with_retry("adjust_stock", move || {
            self.try_adjust_stock(variant_id, quantity_change, principal, notes)
        })
        .await
    }

    /// Create a variant and record its opening stock in the ledger
    #[tracing::instrument(
        skip(self, input, principal),
        fields(sku = %input.sku, quantity = input.quantity)
    )]
    pub async fn create_variant(
        &self,
        product_id: Uuid,
        input: NewVariant,
        principal: &Principal,
    ) -> AppResult<ProductVariant> {
        validate_new_variant(&input)?;

        let input = &input;
        self.with_retry("create_variant", move || {
            self.try_create_variant(product_id, input, principal)
        })
        .await
    }

    /// Replace a variant's editable fields.
    ///
    /// A changed quantity is logged as an `updated` movement; edits that leave
    /// the quantity alone produce no ledger entry.
    #[tracing::instrument(
        skip(self, input, principal),
        fields(quantity = input.quantity)
    )]
    pub async fn update_variant(
        &self,
        variant_id: Uuid,
        input: VariantUpdate,
        principal: &Principal,
    ) -> AppResult<ProductVariant> {
        validate_variant_update(&input)?;

        let input = &input;
        self.with_retry("update_variant", move || {
            self.try_update_variant(variant_id, input, principal)
        })
        .await
    }

    async fn try_record_sale(
        &self,
        variant_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        principal: &Principal,
        customer: &CustomerInfo,
    ) -> AppResult<Sale> {
        let mut unit = self.store.begin().await?;
        let variant = lock(&mut *unit, variant_id).await?;

        if !has_sufficient_stock(variant.quantity, quantity) {
            tracing::info!(
                available = variant.quantity,
                requested = quantity,
                "sale rejected: insufficient stock"
            );
            return Err(AppError::InsufficientStock {
                available: variant.quantity,
                requested: quantity,
            });
        }

        let totals = compute_sale_totals(unit_price, variant.purchase_price, quantity)
            .map_err(|_| {
                AppError::validation(
                    "unit_price",
                    "Sale total exceeds the supported maximum",
                    "El total de la venta excede el máximo permitido",
                )
            })?;
        let sale = unit
            .insert_sale(&NewSale {
                variant_id,
                quantity,
                unit_price,
                totals,
                sold_by: Some(principal.user_id),
                customer: customer.clone(),
            })
            .await?;

        let new_quantity = variant.quantity - quantity;
        unit.set_quantity(variant_id, variant.quantity, new_quantity)
            .await?;
        append_movement(
            &mut *unit,
            variant_id,
            InventoryAction::Sold,
            variant.quantity,
            new_quantity,
            principal,
            format!("Sale: {} units", quantity),
        )
        .await?;

        unit.commit().await?;
        Ok(sale)
    }

    async fn try_adjust_stock(
        &self,
        variant_id: Uuid,
        quantity_change: i32,
        principal: &Principal,
        notes: &str,
    ) -> AppResult<ProductVariant> {
        let mut unit = self.store.begin().await?;
        let variant = lock(&mut *unit, variant_id).await?;

        let new_quantity = variant.quantity.checked_add(quantity_change).ok_or_else(|| {
            AppError::validation(
                "quantity_change",
                "Quantity change is out of range",
                "El cambio de cantidad está fuera de rango",
            )
        })?;
        if new_quantity < 0 {
            tracing::info!(
                available = variant.quantity,
                change = quantity_change,
                "adjustment rejected: insufficient stock"
            );
            return Err(AppError::InsufficientStock {
                available: variant.quantity,
                requested: quantity_change.saturating_neg(),
            });
        }

        let updated = unit
            .set_quantity(variant_id, variant.quantity, new_quantity)
            .await?;
        append_movement(
            &mut *unit,
            variant_id,
            InventoryAction::for_adjustment(quantity_change),
            variant.quantity,
            new_quantity,
            principal,
            notes,
        )
        .await?;

        unit.commit().await?;
        tracing::info!(
            previous = variant.quantity,
            new = new_quantity,
            "stock adjusted"
        );
        Ok(updated)
    }

    async fn try_create_variant(
        &self,
        product_id: Uuid,
        input: &NewVariant,
        principal: &Principal,
    ) -> AppResult<ProductVariant> {
        let mut unit = self.store.begin().await?;
        let variant = unit.insert_variant(product_id, input).await?;

        if variant.quantity > 0 {
            append_movement(
                &mut *unit,
                variant.id,
                InventoryAction::Added,
                0,
                variant.quantity,
                principal,
                INITIAL_STOCK_NOTE,
            )
            .await?;
        }

        unit.commit().await?;
        tracing::info!(variant_id = %variant.id, "variant created");
        Ok(variant)
    }

    async fn try_update_variant(
        &self,
        variant_id: Uuid,
        input: &VariantUpdate,
        principal: &Principal,
    ) -> AppResult<ProductVariant> {
        let mut unit = self.store.begin().await?;
        let current = lock(&mut *unit, variant_id).await?;

        let mut updated = unit
            .update_variant_details(variant_id, &input.details())
            .await?;

        if input.quantity != current.quantity {
            updated = unit
                .set_quantity(variant_id, current.quantity, input.quantity)
                .await?;
            append_movement(
                &mut *unit,
                variant_id,
                InventoryAction::Updated,
                current.quantity,
                input.quantity,
                principal,
                EDIT_NOTE,
            )
            .await?;
        }

        unit.commit().await?;
        Ok(updated)
    }

    /// Run `attempt` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent. Each call opens its own unit, so a failed
    /// attempt has already rolled back when the next one starts.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && tries < max_attempts => {
                    tracing::warn!(
                        operation,
                        attempt = tries,
                        max_attempts,
                        "stock conflict, retrying"
                    );
                    let backoff = self.policy.retry_backoff_ms.saturating_mul(u64::from(tries));
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    tries += 1;
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(operation, attempts = tries, "stock conflict, giving up");
                    return Err(err);
                }
                result => return result,
            }
        }
    }
}

async fn lock(unit: &mut dyn StockUnit, variant_id: Uuid) -> AppResult<ProductVariant> {
    unit.lock_variant(variant_id)
        .await?
        .ok_or(AppError::VariantNotFound(variant_id))
}

async fn append_movement(
    unit: &mut dyn StockUnit,
    variant_id: Uuid,
    action: InventoryAction,
    previous: i32,
    new: i32,
    principal: &Principal,
    notes: impl Into<String>,
) -> AppResult<()> {
    let entry = NewLogEntry::movement(
        variant_id,
        action,
        previous,
        new,
        Some(principal.user_id),
        notes,
    )
    .ok_or_else(|| AppError::Internal(format!("no stock movement from {} to {}", previous, new)))?;
    unit.append_log(&entry).await?;
    Ok(())
}
