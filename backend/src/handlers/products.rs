//! HTTP handlers for products and variants

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{
    Capability, NewVariant, Product, ProductFilter, ProductInput, ProductVariant,
    ProductWithVariants, VariantUpdate,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{CatalogService, StockCoordinator};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub quantity_change: i32,
    pub notes: Option<String>,
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<Product>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_products(&filter).await?;
    Ok(Json(products))
}

/// Get a product with its variants
pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductWithVariants>> {
    let service = CatalogService::new(state.db);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    user.require(Capability::ManageCatalog)?;

    let service = CatalogService::new(state.db);
    let product = service.create_product(input, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<Product>> {
    user.require(Capability::ManageCatalog)?;

    let service = CatalogService::new(state.db);
    let product = service.update_product(product_id, input).await?;
    Ok(Json(product))
}

/// Delete a product and its variants
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require(Capability::DeleteCatalog)?;

    let service = CatalogService::new(state.db);
    service.delete_product(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a variant with its opening stock
pub async fn create_variant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<NewVariant>,
) -> AppResult<(StatusCode, Json<ProductVariant>)> {
    user.require(Capability::ManageCatalog)?;

    let coordinator = StockCoordinator::new(state.store.clone(), state.config.stock.clone());
    let variant = coordinator
        .create_variant(product_id, input, &user.principal())
        .await?;
    Ok((StatusCode::CREATED, Json(variant)))
}

/// Replace a variant's fields, quantity included
pub async fn update_variant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(variant_id): Path<Uuid>,
    Json(input): Json<VariantUpdate>,
) -> AppResult<Json<ProductVariant>> {
    user.require(Capability::ManageCatalog)?;

    let coordinator = StockCoordinator::new(state.store.clone(), state.config.stock.clone());
    let variant = coordinator
        .update_variant(variant_id, input, &user.principal())
        .await?;
    Ok(Json(variant))
}

/// Delete a variant that has never been sold
pub async fn delete_variant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(variant_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require(Capability::DeleteCatalog)?;

    let service = CatalogService::new(state.db);
    service.delete_variant(variant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restock or remove stock by hand
pub async fn adjust_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(variant_id): Path<Uuid>,
    Json(input): Json<AdjustStockRequest>,
) -> AppResult<Json<ProductVariant>> {
    user.require(Capability::AdjustStock)?;

    let coordinator = StockCoordinator::new(state.store.clone(), state.config.stock.clone());
    let variant = coordinator
        .adjust_stock(variant_id, input.quantity_change, &user.principal(), input.notes)
        .await?;
    Ok(Json(variant))
}

/// Variants at or below their minimum stock level
pub async fn list_low_stock(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<ProductVariant>>> {
    let service = CatalogService::new(state.db);
    let variants = service.low_stock().await?;
    Ok(Json(variants))
}
