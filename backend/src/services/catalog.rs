//! Product catalog service
//!
//! Products and the non-stock side of variants. Variant creation and edits
//! that can move stock go through the stock coordinator instead.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::models::{
    Product, ProductFilter, ProductInput, ProductVariant, ProductWithVariants,
};

use crate::error::{AppError, AppResult};
use crate::store::postgres::classify_db_error;

/// Catalog service
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List products, optionally by category, brand or a name/SKU search
    pub async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category_id, brand_id, sku, base_price,
                   image_url, created_by, created_at, updated_at
            FROM products
            WHERE ($1::uuid IS NULL OR category_id = $1)
              AND ($2::uuid IS NULL OR brand_id = $2)
              AND ($3::text IS NULL
                   OR name ILIKE $3 OR sku ILIKE $3 OR description ILIKE $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.category_id)
        .bind(filter.brand_id)
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Get a product with all of its variants
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<ProductWithVariants> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category_id, brand_id, sku, base_price,
                   image_url, created_by, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let variants = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, variant_name, sku, purchase_price, selling_price,
                   quantity, min_stock_level, created_at, updated_at
            FROM product_variants
            WHERE product_id = $1
            ORDER BY variant_name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ProductWithVariants { product, variants })
    }

    pub async fn create_product(
        &self,
        input: ProductInput,
        created_by: Uuid,
    ) -> AppResult<Product> {
        input.validate()?;

        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, description, category_id, brand_id, sku, base_price, image_url, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, description, category_id, brand_id, sku, base_price,
                      image_url, created_by, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.brand_id)
        .bind(input.sku.trim())
        .bind(input.base_price)
        .bind(&input.image_url)
        .bind(created_by)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match classify_db_error(e) {
            AppError::NotFound(_) => AppError::NotFound("User".to_string()),
            other => other,
        })
    }

    pub async fn update_product(&self, product_id: Uuid, input: ProductInput) -> AppResult<Product> {
        input.validate()?;

        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, description = $3, category_id = $4, brand_id = $5,
                sku = $6, base_price = $7, image_url = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, category_id, brand_id, sku, base_price,
                      image_url, created_by, created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.brand_id)
        .bind(input.sku.trim())
        .bind(input.base_price)
        .bind(&input.image_url)
        .fetch_optional(&self.db)
        .await
        .map_err(classify_db_error)?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Delete a product and its variants. Refused while any variant has sales.
    pub async fn delete_product(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await
            .map_err(refused_while_sold)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    /// Delete a variant. Its ledger rows survive with no variant attached.
    pub async fn delete_variant(&self, variant_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM product_variants WHERE id = $1")
            .bind(variant_id)
            .execute(&self.db)
            .await
            .map_err(refused_while_sold)?;

        if result.rows_affected() == 0 {
            return Err(AppError::VariantNotFound(variant_id));
        }
        tracing::info!(%variant_id, "variant deleted");
        Ok(())
    }

    /// Variants at or below their minimum stock level, emptiest first
    pub async fn low_stock(&self) -> AppResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, variant_name, sku, purchase_price, selling_price,
                   quantity, min_stock_level, created_at, updated_at
            FROM product_variants
            WHERE quantity <= min_stock_level
            ORDER BY quantity ASC, variant_name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(variants)
    }
}

fn refused_while_sold(err: sqlx::Error) -> AppError {
    match classify_db_error(err) {
        AppError::NotFound(_) => AppError::Conflict {
            resource: "sales".to_string(),
            message: "Cannot delete: sales reference this variant".to_string(),
            message_es: "No se puede eliminar: existen ventas de esta variante".to_string(),
        },
        other => other,
    }
}
