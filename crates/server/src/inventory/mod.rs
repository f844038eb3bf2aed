//! Stock consistency core.
//!
//! - [`stock`] - The stock mutator: the one routine that writes
//!   `products.stock_quantity`, always together with its ledger row
//! - [`ledger`] - Recording movements, with the idempotency guard on
//!   `transaction_id`
//!
//! Invariant: for every product,
//! `stock_quantity = initial stock + sum(inventory_movements.change_qty)`,
//! and `stock_quantity` never goes below zero.

pub mod ledger;
pub mod stock;

use ksurplus_core::{
    CustomerId, DailyLimitExceeded, EmailError, ProductId, ReservationId, ReservationStatus,
    TotalsError,
};
use thiserror::Error;

use crate::db::RepositoryError;

pub use ledger::{list_movements, record_movement};
pub use stock::{StockChange, apply_stock_change, decrease_stock, increase_stock};

/// Errors raised by inventory, reservation, and sale operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Request failed a check that needs no database access.
    #[error("{0}")]
    Validation(String),

    #[error("Product not found")]
    ProductNotFound(ProductId),

    #[error("Customer not found")]
    CustomerNotFound(CustomerId),

    #[error("Reservation not found")]
    ReservationNotFound(ReservationId),

    #[error("Insufficient stock. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: i32,
    },

    #[error("Invalid unit price")]
    InvalidPrice,

    #[error("Cannot change reservation status from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("Daily reservation limit reached")]
    DailyLimitExceeded(#[from] DailyLimitExceeded),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl From<EmailError> for InventoryError {
    fn from(err: EmailError) -> Self {
        Self::Validation(format!("invalid email: {err}"))
    }
}

impl From<TotalsError> for InventoryError {
    fn from(err: TotalsError) -> Self {
        match err {
            TotalsError::InvalidPrice => Self::InvalidPrice,
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = InventoryError::InsufficientStock {
            product_id: ProductId::new(1),
            available: 0,
            requested: 1,
        };
        assert_eq!(err.to_string(), "Insufficient stock. Available: 0, Requested: 1");
    }

    #[test]
    fn test_totals_error_conversion() {
        assert!(matches!(
            InventoryError::from(TotalsError::InvalidPrice),
            InventoryError::InvalidPrice
        ));
        let err = InventoryError::from(TotalsError::Underpaid {
            total: Decimal::new(20, 0),
            paid: Decimal::new(10, 0),
        });
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(matches!(
            InventoryError::from(TotalsError::AmountTooLarge),
            InventoryError::Validation(_)
        ));
    }
}
