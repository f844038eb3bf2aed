//! The stock mutator.
//!
//! Every change to `products.stock_quantity` goes through
//! [`apply_stock_change`], on the caller's transaction, so the stock column
//! and its ledger row commit or roll back together.

use sqlx::PgConnection;
use tracing::instrument;

use ksurplus_core::{MovementId, ProductId};

use super::InventoryError;
use crate::db::{RepositoryError, movements, products};
use crate::models::MovementDetails;

/// Outcome of a committed-to-transaction stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: ProductId,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub movement_id: MovementId,
}

/// Stock after applying `delta` to `current`.
///
/// # Errors
///
/// - `InventoryError::InsufficientStock` if the result would be negative
/// - `InventoryError::Validation` if the result does not fit the column
pub(crate) fn next_stock(
    product_id: ProductId,
    current: i32,
    delta: i32,
) -> Result<i32, InventoryError> {
    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ if delta < 0 => Err(InventoryError::InsufficientStock {
            product_id,
            available: current,
            requested: delta.saturating_neg(),
        }),
        _ => Err(InventoryError::Validation(format!(
            "stock would exceed the maximum of {}",
            i32::MAX
        ))),
    }
}

/// Lock the product row, apply `delta`, and append the ledger row.
///
/// Must run inside a transaction: the row lock is held until the caller
/// commits or rolls back.
///
/// # Errors
///
/// - `InventoryError::ProductNotFound` if the product does not exist
/// - `InventoryError::InsufficientStock` if the result would be negative
/// - `InventoryError::Validation` if the delta is zero or the result overflows
/// - `InventoryError::Repository` if a query fails
#[instrument(skip(conn, details), fields(reason = %details.reason))]
pub async fn apply_stock_change(
    conn: &mut PgConnection,
    product_id: ProductId,
    delta: i32,
    details: &MovementDetails,
) -> Result<StockChange, InventoryError> {
    if delta == 0 {
        return Err(InventoryError::Validation(
            "stock change must not be zero".to_string(),
        ));
    }

    let product = products::lock(&mut *conn, product_id)
        .await?
        .ok_or(InventoryError::ProductNotFound(product_id))?;

    let new_stock = next_stock(product_id, product.stock_quantity, delta)?;

    products::set_stock(&mut *conn, product_id, new_stock).await?;
    let movement_id = movements::insert(&mut *conn, product_id, delta, details)
        .await
        .map_err(RepositoryError::from)?;

    tracing::debug!(
        product_id = %product_id,
        previous = product.stock_quantity,
        new_stock,
        "Stock changed"
    );

    Ok(StockChange {
        product_id,
        previous_stock: product.stock_quantity,
        new_stock,
        movement_id,
    })
}

/// Take `quantity` units out of stock.
///
/// # Errors
///
/// Returns `InventoryError::Validation` for a non-positive quantity, and
/// otherwise the errors of [`apply_stock_change`].
pub async fn decrease_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
    details: &MovementDetails,
) -> Result<StockChange, InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::Validation(
            "quantity must be greater than zero".to_string(),
        ));
    }
    apply_stock_change(conn, product_id, -quantity, details).await
}

/// Put `quantity` units back into stock.
///
/// # Errors
///
/// Returns `InventoryError::Validation` for a non-positive quantity, and
/// otherwise the errors of [`apply_stock_change`].
pub async fn increase_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
    details: &MovementDetails,
) -> Result<StockChange, InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::Validation(
            "quantity must be greater than zero".to_string(),
        ));
    }
    apply_stock_change(conn, product_id, quantity, details).await
}
