//! Point-of-sale models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::types::DateRange;
use crate::validation::{max_sale_amount, validate_phone, validate_price};

/// A recorded sale. Immutable once created.
///
/// `total_amount` and `profit` are frozen at sale time using the variant's
/// purchase price at that instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub profit: Decimal,
    pub sold_by: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub sale_date: DateTime<Utc>,
}

/// Sale joined with display names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub sale: Sale,
    pub variant_name: Option<String>,
    pub variant_sku: Option<String>,
    pub product_name: Option<String>,
    pub sold_by_name: Option<String>,
}

/// Optional buyer details attached to a sale
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Body of a sale request as submitted by the point-of-sale screen
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordSaleRequest {
    pub variant_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom = "validate_price")]
    pub unit_price: Decimal,
    #[validate(length(max = 255))]
    pub customer_name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

impl RecordSaleRequest {
    pub fn customer(&self) -> CustomerInfo {
        CustomerInfo {
            customer_name: self.customer_name.clone(),
            customer_phone: self.customer_phone.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Derived monetary fields of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub total_amount: Decimal,
    pub profit: Decimal,
}

/// A sale amount that would not fit the stored `NUMERIC(14,2)` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Sale amount exceeds the supported maximum")]
pub struct SaleAmountOverflow;

/// `total_amount = unit_price * quantity`,
/// `profit = (unit_price - purchase_price) * quantity`.
///
/// Profit may be negative when selling below cost. Both results must fit the
/// stored columns, so oversized amounts are refused rather than rounded.
pub fn compute_sale_totals(
    unit_price: Decimal,
    purchase_price: Decimal,
    quantity: i32,
) -> Result<SaleTotals, SaleAmountOverflow> {
    let qty = Decimal::from(quantity);
    let total_amount = unit_price.checked_mul(qty).ok_or(SaleAmountOverflow)?;
    let profit = unit_price
        .checked_sub(purchase_price)
        .and_then(|margin| margin.checked_mul(qty))
        .ok_or(SaleAmountOverflow)?;

    let limit = max_sale_amount();
    if total_amount.abs() > limit || profit.abs() > limit {
        return Err(SaleAmountOverflow);
    }
    Ok(SaleTotals {
        total_amount,
        profit,
    })
}

/// A sale row about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub variant_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub totals: SaleTotals,
    pub sold_by: Option<Uuid>,
    pub customer: CustomerInfo,
}

/// Filters for listing sales
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleFilter {
    pub period: DateRange,
}
