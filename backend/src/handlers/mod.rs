//! HTTP handlers for the Inventory POS platform

pub mod health;
pub mod inventory_logs;
pub mod products;
pub mod sales;

pub use health::health_check;
pub use inventory_logs::{audit_variant, list_inventory_logs};
pub use products::{
    adjust_stock, create_product, create_variant, delete_product, delete_variant, get_product,
    list_low_stock, list_products, update_product, update_variant,
};
pub use sales::{get_sale, list_sales, record_sale};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use shared::DateRange;

use crate::error::{AppError, AppResult};

/// Build a period from `start_date`/`end_date` query values.
///
/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates; a plain end date
/// covers that whole day.
pub(crate) fn parse_period(start: Option<&str>, end: Option<&str>) -> AppResult<DateRange> {
    Ok(DateRange {
        start: parse_bound("start_date", start, false)?,
        end: parse_bound("end_date", end, true)?,
    })
}

fn parse_bound(field: &str, value: Option<&str>, end_of_day: bool) -> AppResult<Option<DateTime<Utc>>> {
    let value = match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => return Ok(None),
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(at.with_timezone(&Utc)));
    }

    let invalid = || {
        AppError::validation(
            field,
            "Dates must be YYYY-MM-DD or RFC 3339",
            "Las fechas deben tener formato AAAA-MM-DD o RFC 3339",
        )
    };
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    let naive = if end_of_day {
        date.and_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(invalid)?;

    Ok(Some(Utc.from_utc_datetime(&naive)))
}
