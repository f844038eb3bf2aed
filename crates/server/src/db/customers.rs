//! Customer repository.
//!
//! Customers are keyed by lower-cased email when one is known. Rows without
//! an email are plain inserts; walk-in buyers get no row at all.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use ksurplus_core::{CustomerId, Email};

use super::RepositoryError;
use crate::models::Customer;

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, phone, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Values for a customer insert or upsert.
#[derive(Debug, Clone, Copy)]
pub struct CustomerFields<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a Email>,
    pub phone: Option<&'a str>,
}

/// How an insert that hits an existing email is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExisting {
    /// Keep the stored record as is.
    Keep,
    /// Overwrite names, and the phone if one was given.
    Update,
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert or update a customer on a pooled connection.
    ///
    /// # Errors
    ///
    /// See [`upsert`].
    pub async fn upsert(
        &self,
        fields: CustomerFields<'_>,
        on_existing: OnExisting,
    ) -> Result<Customer, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        upsert(&mut *conn, fields, on_existing).await
    }
}

/// Insert a customer; with an email, resolve a clash per `on_existing`.
///
/// Either way the returned row is the one now stored under that email.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert(
    conn: &mut PgConnection,
    fields: CustomerFields<'_>,
    on_existing: OnExisting,
) -> Result<Customer, RepositoryError> {
    let conflict = match on_existing {
        // No-op update so RETURNING yields the existing row
        OnExisting::Keep => "ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email",
        OnExisting::Update => {
            r"ON CONFLICT (email) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                phone = COALESCE(EXCLUDED.phone, customers.phone),
                updated_at = NOW()"
        }
    };

    let row = sqlx::query_as::<_, CustomerRow>(&format!(
        r"
        INSERT INTO customers (first_name, last_name, email, phone)
        VALUES ($1, $2, $3, $4)
        {conflict}
        RETURNING {CUSTOMER_COLUMNS}
        "
    ))
    .bind(fields.first_name)
    .bind(fields.last_name)
    .bind(fields.email.map(Email::as_str))
    .bind(fields.phone)
    .fetch_one(conn)
    .await?;

    row.try_into()
}

/// Lock a customer row for the rest of the transaction.
///
/// Serializes concurrent reservations by the same customer so the daily
/// count cannot be raced.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(conn: &mut PgConnection, id: CustomerId) -> Result<bool, RepositoryError> {
    let found = sqlx::query_scalar::<_, CustomerId>(
        "SELECT id FROM customers WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(found.is_some())
}
