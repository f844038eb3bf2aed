//! Recording and listing ledger movements.
//!
//! A recorded movement always adjusts the product's stock by the same
//! amount. When the client supplies a `transaction_id`, a retry of the same
//! request is answered with the movement already stored under that id.

use sqlx::PgPool;
use tracing::instrument;

use ksurplus_core::MovementId;

use super::{InventoryError, apply_stock_change};
use crate::db::{MovementRepository, RepositoryError, is_unique_violation, movements, products};
use crate::models::{Movement, MovementFilter, RecordMovementInput, RecordedMovement};

/// Record a stock movement, at most once per `transaction_id`.
///
/// # Errors
///
/// - `InventoryError::Validation` for a zero quantity or blank reason
/// - `InventoryError::ProductNotFound` if the product does not exist
/// - `InventoryError::InsufficientStock` if stock would go negative
/// - `InventoryError::Repository` if a query fails
#[instrument(skip(pool, input), fields(product_id = %input.product_id, change_qty = input.change_qty))]
pub async fn record_movement(
    pool: &PgPool,
    input: RecordMovementInput,
) -> Result<RecordedMovement, InventoryError> {
    let (product_id, change_qty, details) = input.into_details()?;

    let mut tx = pool.begin().await?;

    // Lock first so retries for the same product queue behind the original
    products::lock(&mut *tx, product_id)
        .await?
        .ok_or(InventoryError::ProductNotFound(product_id))?;

    if let Some(transaction_id) = details.transaction_id.as_deref()
        && let Some(existing) = movements::find_by_transaction_id(&mut *tx, transaction_id).await?
    {
        tracing::info!(transaction_id, movement_id = %existing, "Duplicate movement ignored");
        return Ok(duplicate(existing));
    }

    match apply_stock_change(&mut *tx, product_id, change_qty, &details).await {
        Ok(change) => {
            tx.commit().await?;
            Ok(RecordedMovement {
                id: change.movement_id,
                duplicate: false,
                new_stock: Some(change.new_stock),
            })
        }
        Err(InventoryError::Repository(RepositoryError::Database(err)))
            if is_unique_violation(&err) && details.transaction_id.is_some() =>
        {
            // Another request committed the same transaction id first
            tx.rollback().await?;
            let transaction_id = details.transaction_id.as_deref().unwrap_or_default();
            let existing = MovementRepository::new(pool)
                .find_by_transaction_id(transaction_id)
                .await?
                .ok_or_else(|| InventoryError::Repository(RepositoryError::Database(err)))?;
            tracing::info!(transaction_id, movement_id = %existing, "Duplicate movement lost race");
            Ok(duplicate(existing))
        }
        Err(err) => Err(err),
    }
}

const fn duplicate(id: MovementId) -> RecordedMovement {
    RecordedMovement {
        id,
        duplicate: true,
        new_stock: None,
    }
}

/// Movements matching `filter`, newest first.
///
/// # Errors
///
/// Returns `InventoryError::Repository` if the query fails.
pub async fn list_movements(
    pool: &PgPool,
    filter: &MovementFilter,
) -> Result<Vec<Movement>, InventoryError> {
    Ok(MovementRepository::new(pool).list(filter).await?)
}
