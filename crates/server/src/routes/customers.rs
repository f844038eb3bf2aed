//! Customer route handlers.

use axum::{Json, extract::State};

use super::ApiJson;
use crate::error::Result;
use crate::models::{Customer, CustomerDetails};
use crate::services::CustomerService;
use crate::state::AppState;

/// Create a customer, or update the one with the same email.
pub async fn upsert(
    State(state): State<AppState>,
    ApiJson(details): ApiJson<CustomerDetails>,
) -> Result<Json<Customer>> {
    let customer = CustomerService::new(state.pool(), state.broadcaster())
        .upsert(&details)
        .await?;
    Ok(Json(customer))
}
