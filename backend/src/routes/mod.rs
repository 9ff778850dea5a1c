//! Route definitions for the Inventory POS platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - point of sale
        .nest("/sales", sales_routes(state.clone()))
        // Protected routes - catalog and stock
        .nest("/products", product_routes(state.clone()))
        // Protected routes - inventory ledger
        .nest("/inventory-logs", inventory_log_routes(state))
}

fn sales_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::record_sale).get(handlers::list_sales))
        .route("/:id", get(handlers::get_sale))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/variants/low-stock", get(handlers::list_low_stock))
        .route(
            "/variants/:id",
            put(handlers::update_variant).delete(handlers::delete_variant),
        )
        .route("/variants/:id/adjust-stock", post(handlers::adjust_stock))
        .route(
            "/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:id/variants", post(handlers::create_variant))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn inventory_log_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_inventory_logs))
        .route("/audit/:variant_id", get(handlers::audit_variant))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
