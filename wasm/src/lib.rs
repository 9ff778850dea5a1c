//! WebAssembly module for the Inventory POS platform
//!
//! Lets the point-of-sale screen preview a sale and check stock rules
//! offline with the same arithmetic the server applies:
//! - Sale total and profit preview
//! - Quantity validation
//! - Low-stock check
//! - Role capability check

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::models::{compute_sale_totals, is_low_stock, Capability, Role};
use shared::validation::{
    check_price, has_sufficient_stock, validate_quantity_change, validate_sale_quantity,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("inventory-pos wasm ready"));
}

#[derive(Debug, Serialize, PartialEq)]
struct SalePreview {
    total_amount: Decimal,
    profit: Decimal,
    remaining_stock: i32,
}

fn preview(
    unit_price: &str,
    purchase_price: &str,
    quantity: i32,
    available: i32,
) -> Result<SalePreview, String> {
    validate_sale_quantity(quantity)?;
    let unit_price = parse_price("unit_price", unit_price)?;
    let purchase_price = parse_price("purchase_price", purchase_price)?;
    if !has_sufficient_stock(available, quantity) {
        return Err(format!(
            "Insufficient stock. Available: {}, Requested: {}",
            available, quantity
        ));
    }

    let totals =
        compute_sale_totals(unit_price, purchase_price, quantity).map_err(|e| e.to_string())?;
    Ok(SalePreview {
        total_amount: totals.total_amount,
        profit: totals.profit,
        remaining_stock: available - quantity,
    })
}

fn parse_price(field: &str, value: &str) -> Result<Decimal, String> {
    let price = Decimal::from_str(value.trim()).map_err(|_| format!("{} is not a number", field))?;
    check_price(&price).map_err(|message| format!("{}: {}", field, message))?;
    Ok(price)
}

fn js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

/// Preview a sale. Prices are decimal strings to keep cents exact.
/// Returns JSON `{total_amount, profit, remaining_stock}`.
#[wasm_bindgen]
pub fn preview_sale(
    unit_price: &str,
    purchase_price: &str,
    quantity: i32,
    available: i32,
) -> Result<String, JsValue> {
    let preview = preview(unit_price, purchase_price, quantity, available).map_err(js_error)?;
    serde_json::to_string(&preview).map_err(|e| js_error(e.to_string()))
}

/// Check a sale quantity before submitting
#[wasm_bindgen]
pub fn check_sale_quantity(quantity: i32) -> Option<String> {
    validate_sale_quantity(quantity).err().map(str::to_string)
}

/// Check a manual stock adjustment against the current stock
#[wasm_bindgen]
pub fn check_stock_adjustment(current: i32, quantity_change: i32) -> Option<String> {
    if let Err(message) = validate_quantity_change(quantity_change) {
        return Some(message.to_string());
    }
    match current.checked_add(quantity_change) {
        Some(new_quantity) if new_quantity >= 0 => None,
        Some(_) => Some(format!(
            "Insufficient stock. Available: {}, Requested: {}",
            current,
            quantity_change.saturating_neg()
        )),
        None => Some("Quantity change is out of range".to_string()),
    }
}

/// Whether a variant should be flagged for restock
#[wasm_bindgen]
pub fn variant_is_low_stock(quantity: i32, min_stock_level: i32) -> bool {
    is_low_stock(quantity, min_stock_level)
}

/// Whether `role` may perform `capability` (snake_case names)
#[wasm_bindgen]
pub fn role_allows(role: &str, capability: &str) -> bool {
    match (Role::from_str(role), Capability::from_str(capability)) {
        (Ok(role), Ok(capability)) => role.allows(capability),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_matches_server_arithmetic() {
        let p = preview("8", "5", 3, 10).unwrap();
        assert_eq!(p.total_amount, Decimal::from(24));
        assert_eq!(p.profit, Decimal::from(9));
        assert_eq!(p.remaining_stock, 7);
    }

    #[test]
    fn test_preview_rejects_overselling() {
        let err = preview("10", "5", 5, 2).unwrap_err();
        assert_eq!(err, "Insufficient stock. Available: 2, Requested: 5");
    }

    #[test]
    fn test_preview_rejects_bad_prices() {
        assert!(preview("abc", "5", 1, 1).is_err());
        assert!(preview("-1", "5", 1, 1).is_err());
    }

    #[test]
    fn test_preview_refuses_amounts_the_server_would_refuse() {
        assert!(preview("8.005", "5", 1, 1).is_err());
        assert!(preview("10000000000", "5", 1, 1).is_err());
        assert_eq!(
            preview("9999999999.99", "1", 1000, 1000).unwrap_err(),
            "Sale amount exceeds the supported maximum"
        );
    }

    #[test]
    fn test_quantity_checks() {
        assert!(check_sale_quantity(1).is_none());
        assert!(check_sale_quantity(0).is_some());
        assert!(check_stock_adjustment(5, -5).is_none());
        assert!(check_stock_adjustment(0, -1).is_some());
        assert!(check_stock_adjustment(5, 0).is_some());
    }

    #[test]
    fn test_low_stock_and_roles() {
        assert!(variant_is_low_stock(3, 3));
        assert!(!variant_is_low_stock(4, 3));
        assert!(role_allows("staff", "record_sale"));
        assert!(!role_allows("staff", "delete_catalog"));
        assert!(role_allows("admin", "delete_catalog"));
        assert!(!role_allows("guest", "record_sale"));
    }
}
