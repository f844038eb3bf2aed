//! Inventory ledger route handlers.

use axum::{Json, extract::State, http::StatusCode};

use super::{ApiJson, ApiQuery};
use crate::error::Result;
use crate::models::{Movement, MovementFilter, RecordMovementInput, RecordedMovement};
use crate::services::InventoryService;
use crate::state::AppState;

/// List movements, newest first.
pub async fn list_movements(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<MovementFilter>,
) -> Result<Json<Vec<Movement>>> {
    let movements = InventoryService::new(state.pool(), state.broadcaster())
        .list_movements(&filter)
        .await?;
    Ok(Json(movements))
}

/// Record a movement and apply it to stock.
///
/// Replaying a `transaction_id` answers 200 with `duplicate: true` and the
/// original movement id; a new movement answers 201.
pub async fn record_movement(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RecordMovementInput>,
) -> Result<(StatusCode, Json<RecordedMovement>)> {
    let recorded = InventoryService::new(state.pool(), state.broadcaster())
        .record_movement(input)
        .await?;
    let status = if recorded.duplicate {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(recorded)))
}
