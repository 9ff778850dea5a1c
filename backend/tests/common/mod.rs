//! Shared fixtures for backend integration tests

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use pos_server::config::StockConfig;
use pos_server::services::StockCoordinator;
use pos_server::store::{InMemoryStockStore, StockStore};
use shared::models::{NewVariant, ProductVariant, Role};
use shared::Principal;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Retry policy with a negligible backoff so tests stay fast
pub fn fast_policy() -> StockConfig {
    StockConfig {
        max_attempts: 3,
        retry_backoff_ms: 1,
        ..StockConfig::default()
    }
}

pub struct Fixture {
    pub store: InMemoryStockStore,
    pub coordinator: StockCoordinator,
    pub principal: Principal,
    pub product_id: Uuid,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = InMemoryStockStore::new();
        let product_id = store.add_product("Café de Altura").await;
        let principal = Principal::new(Uuid::new_v4(), Role::Staff);
        store.register_user(principal.user_id, "Rosa Quispe").await;

        let shared: Arc<dyn StockStore> = Arc::new(store.clone());
        Self {
            coordinator: StockCoordinator::new(shared, fast_policy()),
            store,
            principal,
            product_id,
        }
    }

    pub fn store_handle(&self) -> Arc<dyn StockStore> {
        Arc::new(self.store.clone())
    }

    /// Create a variant through the coordinator so its opening stock is logged
    pub async fn variant(&self, sku: &str, quantity: i32, purchase_price: &str) -> ProductVariant {
        self.coordinator
            .create_variant(
                self.product_id,
                NewVariant {
                    variant_name: format!("{} bag", sku),
                    sku: sku.to_string(),
                    purchase_price: dec(purchase_price),
                    selling_price: dec(purchase_price) * Decimal::from(2),
                    quantity,
                    min_stock_level: 2,
                },
                &self.principal,
            )
            .await
            .unwrap()
    }

    pub async fn quantity(&self, variant_id: Uuid) -> i32 {
        self.store.variant(variant_id).await.unwrap().quantity
    }
}
