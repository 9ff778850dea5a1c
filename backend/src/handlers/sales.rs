//! HTTP handlers for point-of-sale endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{Capability, RecordSaleRequest, Sale, SaleFilter, SaleView};

use super::parse_period;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::SaleRecorder;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Record a sale
pub async fn record_sale(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<RecordSaleRequest>,
) -> AppResult<(StatusCode, Json<Sale>)> {
    user.require(Capability::RecordSale)?;

    let recorder = SaleRecorder::new(state.store.clone(), state.config.stock.clone());
    let sale = recorder.record(request, &user.principal()).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// List sales, optionally within a date range
pub async fn list_sales(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SalesQuery>,
) -> AppResult<Json<Vec<SaleView>>> {
    user.require(Capability::ViewSales)?;

    let filter = SaleFilter {
        period: parse_period(query.start_date.as_deref(), query.end_date.as_deref())?,
    };
    let recorder = SaleRecorder::new(state.store.clone(), state.config.stock.clone());
    let sales = recorder.list(&filter).await?;
    Ok(Json(sales))
}

/// Get a single sale
pub async fn get_sale(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleView>> {
    user.require(Capability::ViewSales)?;

    let recorder = SaleRecorder::new(state.store.clone(), state.config.stock.clone());
    let sale = recorder.get(sale_id).await?;
    Ok(Json(sale))
}
