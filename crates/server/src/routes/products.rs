//! Product and category route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use ksurplus_core::ProductId;

use super::ApiJson;
use crate::error::{AppError, Result};
use crate::models::{
    Category, CreateProductInput, DecreaseStockInput, Product, StockUpdated, UpdateProductInput,
};
use crate::services::ProductService;
use crate::state::AppState;

/// Body of `POST /api/categories`.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

/// List active products, newest first.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductService::new(state.pool(), state.broadcaster())
        .list()
        .await?;
    Ok(Json(products))
}

/// List products at or below their low stock threshold.
pub async fn low_stock(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductService::new(state.pool(), state.broadcaster())
        .low_stock()
        .await?;
    Ok(Json(products))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.pool(), state.broadcaster())
        .get(id)
        .await?;
    Ok(Json(product))
}

/// Create a product with its opening stock.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductService::new(state.pool(), state.broadcaster())
        .create(input)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    ApiJson(input): ApiJson<UpdateProductInput>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.pool(), state.broadcaster())
        .update(id, &input)
        .await?;
    Ok(Json(product))
}

/// Archive a product. The row and its ledger history are kept.
pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductService::new(state.pool(), state.broadcaster())
        .archive(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Take units out of stock. An empty body decreases by one.
pub async fn decrease_stock(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    body: Bytes,
) -> Result<Json<StockUpdated>> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        DecreaseStockInput::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };
    let new_stock = ProductService::new(state.pool(), state.broadcaster())
        .decrease_stock(id, input)
        .await?;
    Ok(Json(StockUpdated {
        success: true,
        new_stock,
    }))
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = ProductService::new(state.pool(), state.broadcaster())
        .categories()
        .await?;
    Ok(Json(categories))
}

/// Return the named category, creating it on first use.
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> Result<Json<Category>> {
    let category = ProductService::new(state.pool(), state.broadcaster())
        .get_or_create_category(&body.name)
        .await?;
    Ok(Json(category))
}
