//! Inventory movement repository.
//!
//! The ledger is append-only: this module has no update or delete.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use ksurplus_core::{CategoryId, MovementId, MovementReason, ProductId, ReferenceType, UserId};

use super::RepositoryError;
use crate::models::{Movement, MovementDetails, MovementFilter};

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: MovementId,
    product_id: ProductId,
    product_name: String,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    change_qty: i32,
    reason: String,
    reference_type: Option<String>,
    reference_id: Option<i32>,
    transaction_id: Option<String>,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
}

impl From<MovementRow> for Movement {
    fn from(row: MovementRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            category_id: row.category_id,
            category_name: row.category_name,
            change_qty: row.change_qty,
            reason: MovementReason::parse(&row.reason),
            reference_type: row.reference_type.as_deref().map(ReferenceType::parse),
            reference_id: row.reference_id,
            transaction_id: row.transaction_id,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Read access to the ledger.
pub struct MovementRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MovementRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Movements matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &MovementFilter) -> Result<Vec<Movement>, RepositoryError> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r"
            SELECT
                m.id, m.product_id, p.name AS product_name,
                p.category_id, c.name AS category_name,
                m.change_qty, m.reason, m.reference_type, m.reference_id,
                m.transaction_id, m.created_by, m.created_at
            FROM inventory_movements m
            JOIN products p ON p.id = m.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE ($1::int IS NULL OR m.product_id = $1)
              AND ($2::int IS NULL OR p.category_id = $2)
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $3
            ",
        )
        .bind(filter.product_id)
        .bind(filter.category_id)
        .bind(filter.limit())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Sum of all movements for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn net_change(&self, product_id: ProductId) -> Result<i64, RepositoryError> {
        let sum = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(change_qty), 0)::bigint FROM inventory_movements WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(sum)
    }

    /// Id of the movement recorded under `transaction_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<MovementId>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_by_transaction_id(&mut *conn, transaction_id).await
    }
}

/// Id of the movement recorded under `transaction_id`, if any.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_transaction_id(
    conn: &mut PgConnection,
    transaction_id: &str,
) -> Result<Option<MovementId>, RepositoryError> {
    let id = sqlx::query_scalar::<_, MovementId>(
        "SELECT id FROM inventory_movements WHERE transaction_id = $1",
    )
    .bind(transaction_id)
    .fetch_optional(conn)
    .await?;

    Ok(id)
}

/// Append a movement row.
///
/// Returns the raw `sqlx::Error` so callers can tell a unique violation on
/// `transaction_id` apart from other failures.
///
/// # Errors
///
/// Returns `sqlx::Error` if the insert fails.
pub async fn insert(
    conn: &mut PgConnection,
    product_id: ProductId,
    change_qty: i32,
    details: &MovementDetails,
) -> Result<MovementId, sqlx::Error> {
    sqlx::query_scalar::<_, MovementId>(
        r"
        INSERT INTO inventory_movements (
            product_id, change_qty, reason, reference_type, reference_id,
            transaction_id, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        ",
    )
    .bind(product_id)
    .bind(change_qty)
    .bind(details.reason.as_str())
    .bind(details.reference_type.as_ref().map(ReferenceType::as_str))
    .bind(details.reference_id)
    .bind(details.transaction_id.as_deref())
    .bind(details.created_by)
    .fetch_one(conn)
    .await
}
