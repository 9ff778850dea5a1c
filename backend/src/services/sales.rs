//! Sale recording and sales history

use std::sync::Arc;

use uuid::Uuid;

use shared::models::{RecordSaleRequest, Sale, SaleFilter, SaleView};
use shared::{validate_sale_request, Principal};

use super::StockCoordinator;
use crate::config::StockConfig;
use crate::error::{AppError, AppResult};
use crate::store::StockStore;

/// Sale recorder service
#[derive(Clone)]
pub struct SaleRecorder {
    store: Arc<dyn StockStore>,
    coordinator: StockCoordinator,
}

impl SaleRecorder {
    pub fn new(store: Arc<dyn StockStore>, policy: StockConfig) -> Self {
        Self {
            coordinator: StockCoordinator::new(store.clone(), policy),
            store,
        }
    }

    /// Validate a point-of-sale request and record it
    pub async fn record(&self, request: RecordSaleRequest, principal: &Principal) -> AppResult<Sale> {
        validate_sale_request(&request)?;

        let customer = request.customer();
        self.coordinator
            .record_sale(
                request.variant_id,
                request.quantity,
                request.unit_price,
                principal,
                customer,
            )
            .await
    }

    /// Sales in the period, newest first
    pub async fn list(&self, filter: &SaleFilter) -> AppResult<Vec<SaleView>> {
        self.store.list_sales(filter).await
    }

    pub async fn get(&self, sale_id: Uuid) -> AppResult<SaleView> {
        self.store
            .find_sale(sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }
}
