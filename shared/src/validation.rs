//! Validation utilities for the Inventory POS platform
//!
//! Field validators used by the `validator` derives on request models, plus
//! the plain checks the WASM bindings expose to the point-of-sale screen.

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{NewVariant, RecordSaleRequest, VariantUpdate};

// ============================================================================
// Field validators
// ============================================================================

/// Prices and costs: non-negative, whole cents, within the stored range
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    check_price(price).map_err(|message| error("price", message))
}

/// SKU: 1-64 characters of letters, digits, `-`, `_` or `.`
pub fn validate_sku(sku: &str) -> Result<(), ValidationError> {
    let sku = sku.trim();
    if sku.is_empty() {
        return Err(error("required", "SKU is required"));
    }
    if sku.len() > 64 {
        return Err(error("length", "SKU must be at most 64 characters"));
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(error(
            "format",
            "SKU may only contain letters, digits, '-', '_' and '.'",
        ));
    }
    Ok(())
}

/// Customer phone: 6-15 digits, optionally with `+`, spaces, dashes or parentheses
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if !allowed || !(6..=15).contains(&digits) {
        return Err(error("phone", "Invalid phone number"));
    }
    Ok(())
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

// ============================================================================
// Request validators
// ============================================================================

pub fn validate_sale_request(request: &RecordSaleRequest) -> Result<(), ValidationErrors> {
    request.validate()
}

pub fn validate_new_variant(variant: &NewVariant) -> Result<(), ValidationErrors> {
    variant.validate()
}

pub fn validate_variant_update(update: &VariantUpdate) -> Result<(), ValidationErrors> {
    update.validate()
}

// ============================================================================
// Money checks
// ============================================================================

/// Decimal places kept for prices and sale amounts
pub const MONEY_SCALE: u32 = 2;

/// Largest price or cost a `NUMERIC(12,2)` column holds
pub fn max_price() -> Decimal {
    Decimal::new(9_999_999_999_99, MONEY_SCALE)
}

/// Largest sale total or profit magnitude a `NUMERIC(14,2)` column holds
pub fn max_sale_amount() -> Decimal {
    Decimal::new(999_999_999_999_99, MONEY_SCALE)
}

/// A price is stored exactly: never negative, no fractions of a cent, and
/// small enough for its column
pub fn check_price(price: &Decimal) -> Result<(), &'static str> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Price must be a positive number");
    }
    if price.normalize().scale() > MONEY_SCALE {
        return Err("Price must have at most two decimal places");
    }
    if *price > max_price() {
        return Err("Price must not exceed 9999999999.99");
    }
    Ok(())
}

// ============================================================================
// Stock checks
// ============================================================================

/// Quantity sold in a single sale
pub fn validate_sale_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Manual stock adjustments must move stock
pub fn validate_quantity_change(quantity_change: i32) -> Result<(), &'static str> {
    if quantity_change == 0 {
        return Err("Quantity change must be a non-zero integer");
    }
    Ok(())
}

/// Whether `requested` units can leave a variant holding `available`
pub fn has_sufficient_stock(available: i32, requested: i32) -> bool {
    requested <= available
}

/// First failing field and its message, for single-field error responses
pub fn first_field_error(errors: &ValidationErrors) -> (String, String) {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            })
        })
        .unwrap_or_else(|| ("request".to_string(), "Invalid request".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn test_price_validation() {
        assert!(validate_price(&Decimal::ZERO).is_ok());
        assert!(validate_price(&Decimal::from_str("12.50").unwrap()).is_ok());
        assert!(validate_price(&Decimal::from_str("-0.01").unwrap()).is_err());
    }

    #[test]
    fn test_negative_zero_is_accepted() {
        let neg_zero = Decimal::from_str("-0.00").unwrap();
        assert!(validate_price(&neg_zero).is_ok());
    }

    #[test]
    fn test_fractions_of_a_cent_are_rejected() {
        assert_eq!(
            check_price(&Decimal::from_str("8.005").unwrap()),
            Err("Price must have at most two decimal places")
        );
        // Trailing zeros do not count as precision
        assert!(check_price(&Decimal::from_str("8.5000").unwrap()).is_ok());
    }

    #[test]
    fn test_price_range_matches_column() {
        assert!(check_price(&max_price()).is_ok());
        assert_eq!(
            check_price(&Decimal::from_str("10000000000").unwrap()),
            Err("Price must not exceed 9999999999.99")
        );
        assert!(check_price(&Decimal::MAX).is_err());
    }

    #[test]
    fn test_sku_validation() {
        assert!(validate_sku("CAF-500.G_1").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("987654321").is_ok());
        assert!(validate_phone("+51 (1) 987-6543").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_quantity_checks() {
        assert!(validate_sale_quantity(1).is_ok());
        assert!(validate_sale_quantity(0).is_err());
        assert!(validate_quantity_change(-3).is_ok());
        assert!(validate_quantity_change(0).is_err());
        assert!(has_sufficient_stock(2, 2));
        assert!(!has_sufficient_stock(2, 5));
    }

    #[test]
    fn test_first_field_error_reports_message() {
        let mut errors = ValidationErrors::new();
        errors.add("sku", error("required", "SKU is required"));
        let (field, message) = first_field_error(&errors);
        assert_eq!(field, "sku");
        assert_eq!(message, "SKU is required");
    }

    proptest! {
        #[test]
        fn prop_sufficient_stock_never_goes_negative(available in 0i32..10_000, requested in 1i32..10_000) {
            if has_sufficient_stock(available, requested) {
                prop_assert!(available - requested >= 0);
            } else {
                prop_assert!(available - requested < 0);
            }
        }
    }
}
