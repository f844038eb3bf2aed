//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error body is JSON
//! `{"error": "<message>"}`; stock shortfalls also carry `available` and
//! `requested`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::inventory::InventoryError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Inventory, reservation, or sale operation failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Database operation failed outside a service.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Inventory(err) => match err {
                InventoryError::Validation(_) | InventoryError::InvalidPrice => {
                    StatusCode::BAD_REQUEST
                }
                InventoryError::ProductNotFound(_)
                | InventoryError::CustomerNotFound(_)
                | InventoryError::ReservationNotFound(_) => StatusCode::NOT_FOUND,
                InventoryError::InsufficientStock { .. }
                | InventoryError::InvalidTransition { .. } => StatusCode::CONFLICT,
                InventoryError::DailyLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
                InventoryError::Repository(err) => repository_status(err),
            },
            Self::Database(err) => repository_status(err),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self, status: StatusCode) -> Value {
        if status.is_server_error() {
            // Don't expose internal error details to clients
            return json!({ "error": "Internal server error" });
        }

        match self {
            Self::Inventory(InventoryError::InsufficientStock {
                available,
                requested,
                ..
            }) => json!({
                "error": self.to_string(),
                "available": available,
                "requested": requested,
            }),
            Self::Inventory(InventoryError::DailyLimitExceeded(exceeded)) => json!({
                "error": self.to_string(),
                "limit": exceeded.limit,
                "used": exceeded.used,
            }),
            Self::Inventory(InventoryError::Repository(RepositoryError::NotFound))
            | Self::Database(RepositoryError::NotFound) => json!({ "error": "Not found" }),
            Self::Inventory(InventoryError::Repository(RepositoryError::Conflict(msg)))
            | Self::Database(RepositoryError::Conflict(msg)) => json!({ "error": msg }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(self.body(status))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use ksurplus_core::{DailyLimitExceeded, ProductId, ReservationStatus};

    use super::*;

    async fn response_parts(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_insufficient_stock_body() {
        let (status, body) = response_parts(AppError::from(InventoryError::InsufficientStock {
            product_id: ProductId::new(1),
            available: 0,
            requested: 2,
        }))
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body,
            json!({
                "error": "Insufficient stock. Available: 0, Requested: 2",
                "available": 0,
                "requested": 2,
            })
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::from(InventoryError::Validation("bad".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::from(InventoryError::InvalidPrice), StatusCode::BAD_REQUEST),
            (
                AppError::from(InventoryError::ProductNotFound(ProductId::new(9))),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(InventoryError::InvalidTransition {
                    from: ReservationStatus::Cancelled,
                    to: ReservationStatus::Confirmed,
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(InventoryError::DailyLimitExceeded(DailyLimitExceeded {
                    limit: 5,
                    used: 5,
                    requested: 1,
                })),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                AppError::Database(RepositoryError::Conflict("taken".to_string())),
                StatusCode::CONFLICT,
            ),
            (AppError::BadRequest("nope".to_string()), StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = response_parts(AppError::Inventory(InventoryError::Repository(
            RepositoryError::DataCorruption("bad email in row 7".to_string()),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_not_found_message() {
        let (status, body) =
            response_parts(AppError::from(InventoryError::ProductNotFound(ProductId::new(3))))
                .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Product not found"}));
    }
}
