//! Reservation route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;

use ksurplus_core::{CustomerId, ReservationId};

use super::{ApiJson, ApiQuery};
use crate::error::Result;
use crate::models::{
    CreateReservationInput, CreatedReservation, DailyQuota, Reservation, UpdateReservationStatus,
};
use crate::services::ReservationService;
use crate::state::AppState;

/// Query parameters for listing reservations.
#[derive(Debug, Default, Deserialize)]
pub struct ReservationListQuery {
    pub customer_id: Option<CustomerId>,
}

/// Query parameters for the daily quota.
#[derive(Debug, Deserialize)]
pub struct QuotaQuery {
    pub customer_id: CustomerId,
    /// UTC date, defaulting to today.
    pub date: Option<NaiveDate>,
}

pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReservationListQuery>,
) -> Result<Json<Vec<Reservation>>> {
    let reservations = ReservationService::from_state(&state)
        .list(query.customer_id)
        .await?;
    Ok(Json(reservations))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
) -> Result<Json<Reservation>> {
    let reservation = ReservationService::from_state(&state).get(id).await?;
    Ok(Json(reservation))
}

/// Reserve one unit of a product.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateReservationInput>,
) -> Result<(StatusCode, Json<CreatedReservation>)> {
    let created = ReservationService::from_state(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Move a reservation along its lifecycle.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
    ApiJson(body): ApiJson<UpdateReservationStatus>,
) -> Result<Json<Reservation>> {
    let reservation = ReservationService::from_state(&state)
        .update_status(id, body.status)
        .await?;
    Ok(Json(reservation))
}

/// Remaining reservations for a customer on one day.
pub async fn quota(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<QuotaQuery>,
) -> Result<Json<DailyQuota>> {
    let quota = ReservationService::from_state(&state)
        .daily_quota(query.customer_id, query.date)
        .await?;
    Ok(Json(quota))
}
