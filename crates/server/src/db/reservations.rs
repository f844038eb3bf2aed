//! Reservation repository.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use ksurplus_core::{CustomerId, ProductId, ReservationId, ReservationStatus, UserId};

use super::RepositoryError;
use crate::models::Reservation;
use crate::models::customer::display_name;

const RESERVATION_SELECT: &str = r"
    SELECT
        r.id, r.reservation_code, r.customer_id,
        c.first_name AS customer_first_name, c.last_name AS customer_last_name,
        c.email AS customer_email,
        r.product_id, p.name AS product_name,
        r.reserved_price, r.notes, r.status, r.created_by, r.reserved_at, r.updated_at
    FROM reservations r
    JOIN products p ON p.id = r.product_id
    LEFT JOIN customers c ON c.id = r.customer_id
";

#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: ReservationId,
    reservation_code: String,
    customer_id: Option<CustomerId>,
    customer_first_name: Option<String>,
    customer_last_name: Option<String>,
    customer_email: Option<String>,
    product_id: ProductId,
    product_name: String,
    reserved_price: Decimal,
    notes: Option<String>,
    status: ReservationStatus,
    created_by: Option<UserId>,
    reserved_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        let customer_name = row.customer_first_name.as_deref().map(|first| {
            display_name(first, row.customer_last_name.as_deref().unwrap_or_default())
        });

        Self {
            id: row.id,
            reservation_code: row.reservation_code,
            customer_id: row.customer_id,
            customer_name,
            customer_email: row.customer_email,
            product_id: row.product_id,
            product_name: row.product_name,
            reserved_price: row.reserved_price,
            notes: row.notes,
            status: row.status,
            created_by: row.created_by,
            reserved_at: row.reserved_at,
            updated_at: row.updated_at,
        }
    }
}

/// Status and ownership of a reservation locked by the current transaction.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct LockedReservation {
    pub id: ReservationId,
    pub status: ReservationStatus,
    pub customer_id: Option<CustomerId>,
    pub created_by: Option<UserId>,
}

/// Values for a new reservation row.
#[derive(Debug, Clone)]
pub struct NewReservation<'a> {
    pub reservation_code: &'a str,
    pub customer_id: Option<CustomerId>,
    pub product_id: ProductId,
    pub reserved_price: Decimal,
    pub notes: Option<&'a str>,
    pub created_by: Option<UserId>,
}

/// Read access to reservations.
pub struct ReservationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReservationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reservations, newest first, optionally for one customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        customer_id: Option<CustomerId>,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r"
            {RESERVATION_SELECT}
            WHERE ($1::int IS NULL OR r.customer_id = $1)
            ORDER BY r.reserved_at DESC, r.id DESC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a reservation by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            "{RESERVATION_SELECT} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Reservations a customer made on `date` (UTC).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_customer_on(
        &self,
        customer_id: CustomerId,
        date: NaiveDate,
    ) -> Result<i64, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        count_for_customer_on(&mut *conn, customer_id, date).await
    }
}

/// Reservations a customer made on `date` (UTC), whatever their status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_for_customer_on(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    date: NaiveDate,
) -> Result<i64, RepositoryError> {
    let count = sqlx::query_scalar::<_, i64>(
        r"
        SELECT COUNT(*)
        FROM reservations
        WHERE customer_id = $1
          AND reserved_at >= ($2::date)::timestamp AT TIME ZONE 'UTC'
          AND reserved_at < ($2::date + 1)::timestamp AT TIME ZONE 'UTC'
        ",
    )
    .bind(customer_id)
    .bind(date)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Insert a `Pending` reservation.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on a reservation code collision, or
/// `RepositoryError::Database` if the query fails.
pub async fn insert(
    conn: &mut PgConnection,
    reservation: &NewReservation<'_>,
) -> Result<ReservationId, RepositoryError> {
    sqlx::query_scalar::<_, ReservationId>(
        r"
        INSERT INTO reservations (
            reservation_code, customer_id, product_id, reserved_price, notes, status, created_by
        )
        VALUES ($1, $2, $3, $4, $5, 'Pending', $6)
        RETURNING id
        ",
    )
    .bind(reservation.reservation_code)
    .bind(reservation.customer_id)
    .bind(reservation.product_id)
    .bind(reservation.reserved_price)
    .bind(reservation.notes)
    .bind(reservation.created_by)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if super::is_unique_violation(&e) {
            RepositoryError::Conflict("reservation code already exists".to_string())
        } else {
            RepositoryError::Database(e)
        }
    })
}

/// Lock a reservation row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(
    conn: &mut PgConnection,
    id: ReservationId,
) -> Result<Option<LockedReservation>, RepositoryError> {
    let row = sqlx::query_as::<_, LockedReservation>(
        r"
        SELECT id, status, customer_id, created_by
        FROM reservations
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Set the status of a reservation.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn update_status(
    conn: &mut PgConnection,
    id: ReservationId,
    status: ReservationStatus,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE reservations
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(status)
    .execute(conn)
    .await?;

    Ok(())
}
