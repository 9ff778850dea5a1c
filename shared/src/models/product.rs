//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_price, validate_sku};

/// A catalog product grouping one or more sellable variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub sku: String,
    pub base_price: Decimal,
    pub image_url: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product with its variants, as returned by the product detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

/// Input for creating or replacing a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    #[validate(custom = "validate_sku")]
    pub sku: String,
    #[validate(custom = "validate_price")]
    pub base_price: Decimal,
    pub image_url: Option<String>,
}

/// Filters for listing products
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub search: Option<String>,
}

/// A sellable variant with its own stock counter.
///
/// `quantity` is never negative and only changes through the stock
/// coordinator, which pairs every change with an inventory log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_name: String,
    pub sku: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub quantity: i32,
    pub min_stock_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// Advisory check used by low-stock reporting
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.quantity, self.min_stock_level)
    }

    pub fn details(&self) -> VariantDetails {
        VariantDetails {
            variant_name: self.variant_name.clone(),
            sku: self.sku.clone(),
            purchase_price: self.purchase_price,
            selling_price: self.selling_price,
            min_stock_level: self.min_stock_level,
        }
    }
}

pub fn is_low_stock(quantity: i32, min_stock_level: i32) -> bool {
    quantity <= min_stock_level
}

/// Input for creating a variant under a product, including its opening stock
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVariant {
    #[validate(length(min = 1, max = 255, message = "Variant name is required"))]
    pub variant_name: String,
    #[validate(custom = "validate_sku")]
    pub sku: String,
    #[validate(custom = "validate_price")]
    pub purchase_price: Decimal,
    #[validate(custom = "validate_price")]
    pub selling_price: Decimal,
    #[validate(range(min = 0, message = "Quantity must be a non-negative integer"))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Min stock level must be a non-negative integer"))]
    pub min_stock_level: i32,
}

/// Full replacement of a variant's editable fields, quantity included
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VariantUpdate {
    #[validate(length(min = 1, max = 255, message = "Variant name is required"))]
    pub variant_name: String,
    #[validate(custom = "validate_sku")]
    pub sku: String,
    #[validate(custom = "validate_price")]
    pub purchase_price: Decimal,
    #[validate(custom = "validate_price")]
    pub selling_price: Decimal,
    #[validate(range(min = 0, message = "Quantity must be a non-negative integer"))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Min stock level must be a non-negative integer"))]
    pub min_stock_level: i32,
}

impl VariantUpdate {
    pub fn details(&self) -> VariantDetails {
        VariantDetails {
            variant_name: self.variant_name.clone(),
            sku: self.sku.clone(),
            purchase_price: self.purchase_price,
            selling_price: self.selling_price,
            min_stock_level: self.min_stock_level,
        }
    }
}

/// Variant fields that can change without touching stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDetails {
    pub variant_name: String,
    pub sku: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub min_stock_level: i32,
}
