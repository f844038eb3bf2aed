//! Database operations for the KSurplus `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `categories` - Product categories (unique name)
//! - `products` - Catalogue with `stock_quantity` (never negative)
//! - `customers` - Upserted by lower-cased email; walk-ins have no row
//! - `inventory_movements` - Append-only stock ledger
//! - `reservations` - Storefront holds on a single unit
//! - `sales_orders` / `sales_order_items` - Counter sales
//!
//! Read paths take a `&PgPool`. Functions that must run inside a caller's
//! transaction take `&mut PgConnection` (pass `&mut *tx`).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p ksurplus-cli -- migrate
//! ```

pub mod categories;
pub mod customers;
pub mod movements;
pub mod products;
pub mod reservations;
pub mod sales;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use movements::MovementRepository;
pub use products::ProductRepository;
pub use reservations::ReservationRepository;
pub use sales::SalesRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique transaction id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Whether `err` is a unique-constraint violation (SQLSTATE 23505).
#[must_use]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
