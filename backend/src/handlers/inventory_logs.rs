//! HTTP handlers for the inventory ledger

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{Capability, InventoryAction};

use super::parse_period;
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::{InventoryLedger, LedgerQuery, StockAudit};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InventoryLogQuery {
    pub variant_id: Option<Uuid>,
    pub action: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub format: Option<String>, // "json" or "csv"
}

/// List ledger entries, newest first
pub async fn list_inventory_logs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<InventoryLogQuery>,
) -> AppResult<impl IntoResponse> {
    user.require(Capability::ViewInventoryLog)?;

    let action = query
        .action
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(str::parse::<InventoryAction>)
        .transpose()
        .map_err(|_| {
            AppError::validation(
                "action",
                "Action must be one of added, removed, sold, updated",
                "La acción debe ser added, removed, sold o updated",
            )
        })?;

    let ledger = InventoryLedger::new(state.store.clone(), state.config.ledger.clone());
    let rows = ledger
        .query(LedgerQuery {
            variant_id: query.variant_id,
            action,
            period: parse_period(query.start_date.as_deref(), query.end_date.as_deref())?,
            limit: query.limit,
        })
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = InventoryLedger::export_to_csv(&rows)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"inventory_logs.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(rows).into_response())
    }
}

/// Replay a variant's ledger against its current stock
pub async fn audit_variant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(variant_id): Path<Uuid>,
) -> AppResult<Json<StockAudit>> {
    user.require(Capability::ViewInventoryLog)?;

    let ledger = InventoryLedger::new(state.store.clone(), state.config.ledger.clone());
    let audit = ledger.audit(variant_id).await?;
    Ok(Json(audit))
}
