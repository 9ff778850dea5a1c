//! PostgreSQL stock store
//!
//! Each unit is a database transaction. The variant row is taken with
//! `SELECT ... FOR UPDATE` and the quantity write is conditional on the value
//! read, so a concurrent writer can never slip between the stock check and
//! the update. `lock_timeout` bounds how long a unit waits for that lock.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{
    InventoryLogEntry, InventoryLogView, LogFilter, NewLogEntry, NewSale, NewVariant,
    ProductVariant, Sale, SaleFilter, SaleView, VariantDetails,
};

use super::{ensure_non_negative, StockStore, StockUnit};
use crate::error::{AppError, AppResult};

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Stock store backed by PostgreSQL
#[derive(Clone)]
pub struct PgStockStore {
    db: PgPool,
    lock_timeout_ms: u64,
}

impl PgStockStore {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Postgres reads a zero `lock_timeout` as "wait forever", so it is raised to 1ms
    pub fn with_lock_timeout_ms(mut self, lock_timeout_ms: u64) -> Self {
        self.lock_timeout_ms = lock_timeout_ms.max(1);
        self
    }
}

struct PgStockUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockStore for PgStockStore {
    async fn begin(&self) -> AppResult<Box<dyn StockUnit>> {
        let mut tx = self.db.begin().await.map_err(classify_db_error)?;

        // SET does not take bind parameters; the value is a plain integer
        sqlx::query(&format!("SET LOCAL lock_timeout = {}", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;

        Ok(Box::new(PgStockUnit { tx }))
    }

    async fn query_logs(&self, filter: &LogFilter) -> AppResult<Vec<InventoryLogView>> {
        let rows = sqlx::query_as::<_, InventoryLogView>(
            r#"
            SELECT il.id, il.seq, il.variant_id, il.action, il.quantity_change,
                   il.previous_quantity, il.new_quantity, il.performed_by, il.notes,
                   il.created_at,
                   pv.variant_name,
                   pv.sku AS variant_sku,
                   p.name AS product_name,
                   NULLIF(CONCAT_WS(' ', u.first_name, u.last_name), '') AS performed_by_name
            FROM inventory_logs il
            LEFT JOIN product_variants pv ON pv.id = il.variant_id
            LEFT JOIN products p ON p.id = pv.product_id
            LEFT JOIN users u ON u.id = il.performed_by
            WHERE ($1::uuid IS NULL OR il.variant_id = $1)
              AND ($2::inventory_action IS NULL OR il.action = $2)
              AND ($3::timestamptz IS NULL OR il.created_at >= $3)
              AND ($4::timestamptz IS NULL OR il.created_at <= $4)
            ORDER BY il.seq DESC
            LIMIT $5
            "#,
        )
        .bind(filter.variant_id)
        .bind(filter.action)
        .bind(filter.period.start)
        .bind(filter.period.end)
        .bind(i64::from(filter.limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn list_sales(&self, filter: &SaleFilter) -> AppResult<Vec<SaleView>> {
        let rows = sqlx::query_as::<_, SaleView>(
            r#"
            SELECT s.id, s.variant_id, s.quantity, s.unit_price, s.total_amount, s.profit,
                   s.sold_by, s.customer_name, s.customer_phone, s.notes, s.sale_date,
                   pv.variant_name,
                   pv.sku AS variant_sku,
                   p.name AS product_name,
                   NULLIF(CONCAT_WS(' ', u.first_name, u.last_name), '') AS sold_by_name
            FROM sales s
            JOIN product_variants pv ON pv.id = s.variant_id
            JOIN products p ON p.id = pv.product_id
            LEFT JOIN users u ON u.id = s.sold_by
            WHERE ($1::timestamptz IS NULL OR s.sale_date >= $1)
              AND ($2::timestamptz IS NULL OR s.sale_date <= $2)
            ORDER BY s.sale_date DESC
            "#,
        )
        .bind(filter.period.start)
        .bind(filter.period.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn find_sale(&self, id: Uuid) -> AppResult<Option<SaleView>> {
        let row = sqlx::query_as::<_, SaleView>(
            r#"
            SELECT s.id, s.variant_id, s.quantity, s.unit_price, s.total_amount, s.profit,
                   s.sold_by, s.customer_name, s.customer_phone, s.notes, s.sale_date,
                   pv.variant_name,
                   pv.sku AS variant_sku,
                   p.name AS product_name,
                   NULLIF(CONCAT_WS(' ', u.first_name, u.last_name), '') AS sold_by_name
            FROM sales s
            JOIN product_variants pv ON pv.id = s.variant_id
            JOIN products p ON p.id = pv.product_id
            LEFT JOIN users u ON u.id = s.sold_by
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl StockUnit for PgStockUnit {
    async fn lock_variant(&mut self, id: Uuid) -> AppResult<Option<ProductVariant>> {
        sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, variant_name, sku, purchase_price, selling_price,
                   quantity, min_stock_level, created_at, updated_at
            FROM product_variants
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify_db_error)
    }

    async fn insert_variant(
        &mut self,
        product_id: Uuid,
        variant: &NewVariant,
    ) -> AppResult<ProductVariant> {
        ensure_non_negative(0, variant.quantity)?;

        sqlx::query_as::<_, ProductVariant>(
            r#"
            INSERT INTO product_variants (
                product_id, variant_name, sku, purchase_price, selling_price,
                quantity, min_stock_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, product_id, variant_name, sku, purchase_price, selling_price,
                      quantity, min_stock_level, created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(&variant.variant_name)
        .bind(variant.sku.trim())
        .bind(variant.purchase_price)
        .bind(variant.selling_price)
        .bind(variant.quantity)
        .bind(variant.min_stock_level)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match classify_db_error(e) {
            AppError::NotFound(_) => AppError::NotFound("Product".to_string()),
            other => other,
        })
    }

    async fn update_variant_details(
        &mut self,
        id: Uuid,
        details: &VariantDetails,
    ) -> AppResult<ProductVariant> {
        sqlx::query_as::<_, ProductVariant>(
            r#"
            UPDATE product_variants
            SET variant_name = $2, sku = $3, purchase_price = $4, selling_price = $5,
                min_stock_level = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING id, product_id, variant_name, sku, purchase_price, selling_price,
                      quantity, min_stock_level, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&details.variant_name)
        .bind(details.sku.trim())
        .bind(details.purchase_price)
        .bind(details.selling_price)
        .bind(details.min_stock_level)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify_db_error)?
        .ok_or(AppError::VariantNotFound(id))
    }

    async fn set_quantity(
        &mut self,
        id: Uuid,
        expected: i32,
        new_quantity: i32,
    ) -> AppResult<ProductVariant> {
        ensure_non_negative(expected, new_quantity)?;

        // Zero rows means the stored quantity moved since it was read
        sqlx::query_as::<_, ProductVariant>(
            r#"
            UPDATE product_variants
            SET quantity = $3, updated_at = NOW()
            WHERE id = $1 AND quantity = $2
            RETURNING id, product_id, variant_name, sku, purchase_price, selling_price,
                      quantity, min_stock_level, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new_quantity)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify_db_error)?
        .ok_or(AppError::ConcurrencyConflict)
    }

    async fn insert_sale(&mut self, sale: &NewSale) -> AppResult<Sale> {
        sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                variant_id, quantity, unit_price, total_amount, profit, sold_by,
                customer_name, customer_phone, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, variant_id, quantity, unit_price, total_amount, profit, sold_by,
                      customer_name, customer_phone, notes, sale_date
            "#,
        )
        .bind(sale.variant_id)
        .bind(sale.quantity)
        .bind(sale.unit_price)
        .bind(sale.totals.total_amount)
        .bind(sale.totals.profit)
        .bind(sale.sold_by)
        .bind(&sale.customer.customer_name)
        .bind(&sale.customer.customer_phone)
        .bind(&sale.customer.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(unknown_user)
    }

    async fn append_log(&mut self, entry: &NewLogEntry) -> AppResult<InventoryLogEntry> {
        sqlx::query_as::<_, InventoryLogEntry>(
            r#"
            INSERT INTO inventory_logs (
                variant_id, action, quantity_change, previous_quantity, new_quantity,
                performed_by, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, seq, variant_id, action, quantity_change, previous_quantity,
                      new_quantity, performed_by, notes, created_at
            "#,
        )
        .bind(entry.variant_id)
        .bind(entry.action)
        .bind(entry.quantity_change)
        .bind(entry.previous_quantity)
        .bind(entry.new_quantity)
        .bind(entry.performed_by)
        .bind(&entry.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(unknown_user)
    }

    async fn variant_history(&mut self, variant_id: Uuid) -> AppResult<Vec<InventoryLogEntry>> {
        let entries = sqlx::query_as::<_, InventoryLogEntry>(
            r#"
            SELECT id, seq, variant_id, action, quantity_change, previous_quantity,
                   new_quantity, performed_by, notes, created_at
            FROM inventory_logs
            WHERE variant_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(variant_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify_db_error)?;

        Ok(entries)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(classify_db_error)
    }
}

/// Map PostgreSQL SQLSTATEs onto the error taxonomy.
///
/// Serialization failures, deadlocks and lock timeouts are transient and
/// surface as `ConcurrencyConflict` so the coordinator can retry the unit.
pub(crate) fn classify_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            // serialization_failure, deadlock_detected, lock_not_available
            Some("40001") | Some("40P01") | Some("55P03") => {
                return AppError::ConcurrencyConflict;
            }
            // unique_violation
            Some("23505") => return AppError::DuplicateEntry("sku".to_string()),
            // foreign_key_violation
            Some("23503") => return AppError::NotFound("Referenced record".to_string()),
            _ => {}
        }
    }
    AppError::DatabaseError(err)
}

/// The variant is locked by the unit, so a dangling reference on sale and
/// ledger inserts can only be the acting user
fn unknown_user(err: sqlx::Error) -> AppError {
    match classify_db_error(err) {
        AppError::NotFound(_) => AppError::NotFound("User".to_string()),
        other => other,
    }
}
