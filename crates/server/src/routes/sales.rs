//! Sales order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use super::{ApiJson, ApiQuery};
use crate::error::Result;
use crate::models::{CreateSaleInput, CreatedSale, SalesOrder};
use crate::services::SalesService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub limit: Option<i64>,
}

/// Most recent sales orders with their items.
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<Json<Vec<SalesOrder>>> {
    let orders = SalesService::new(state.pool(), state.broadcaster())
        .list(query.limit)
        .await?;
    Ok(Json(orders))
}

/// Sell units of one product at the counter.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateSaleInput>,
) -> Result<(StatusCode, Json<CreatedSale>)> {
    let sale = SalesService::new(state.pool(), state.broadcaster())
        .create(input)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
