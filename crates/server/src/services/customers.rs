//! Customer resolution and upsert.

use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use ksurplus_core::{CustomerId, RealtimeEvent};

use crate::db::CustomerRepository;
use crate::db::customers::{self, CustomerFields, OnExisting};
use crate::inventory::InventoryError;
use crate::models::{Customer, CustomerDetails};
use crate::realtime::Broadcaster;

/// Resolve the customer a reservation or sale is for, inside the caller's
/// transaction.
///
/// - an explicit `customer_id` must exist, and its row is locked
/// - details with an email are upserted by that email per `on_existing`
/// - other details create a new customer row
/// - an empty payload is a walk-in: `None`, no row
///
/// # Errors
///
/// Returns `InventoryError::CustomerNotFound` for an unknown id,
/// `InventoryError::Validation` for a malformed email, or
/// `InventoryError::Repository` if a query fails.
pub async fn resolve_customer(
    conn: &mut PgConnection,
    details: &CustomerDetails,
    on_existing: OnExisting,
) -> Result<Option<CustomerId>, InventoryError> {
    if let Some(id) = details.customer_id {
        if !customers::lock(&mut *conn, id).await? {
            return Err(InventoryError::CustomerNotFound(id));
        }
        return Ok(Some(id));
    }

    if details.is_walk_in() {
        return Ok(None);
    }

    let email = details.email()?;
    let (first_name, last_name) = details.names();
    let customer = customers::upsert(
        conn,
        CustomerFields {
            first_name: &first_name,
            last_name: &last_name,
            email: email.as_ref(),
            phone: details.phone(),
        },
        on_existing,
    )
    .await?;

    Ok(Some(customer.id))
}

/// Customer operations exposed over HTTP.
pub struct CustomerService<'a> {
    pool: &'a PgPool,
    events: &'a Broadcaster,
}

impl<'a> CustomerService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, events: &'a Broadcaster) -> Self {
        Self { pool, events }
    }

    /// Create a customer, or update the one with the same email.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` if neither a name nor an email
    /// is given or the email is malformed, and `InventoryError::Repository`
    /// if a query fails.
    #[instrument(skip(self, details))]
    pub async fn upsert(&self, details: &CustomerDetails) -> Result<Customer, InventoryError> {
        let email = details.email()?;
        let has_name = [&details.name, &details.first_name, &details.last_name]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|s| !s.trim().is_empty()));
        if email.is_none() && !has_name {
            return Err(InventoryError::Validation(
                "a name or an email is required".to_string(),
            ));
        }

        let (first_name, last_name) = details.names();
        let customer = CustomerRepository::new(self.pool)
            .upsert(
                CustomerFields {
                    first_name: &first_name,
                    last_name: &last_name,
                    email: email.as_ref(),
                    phone: details.phone(),
                },
                OnExisting::Update,
            )
            .await?;

        tracing::info!(customer_id = %customer.id, "Customer saved");
        self.events
            .broadcast(&RealtimeEvent::CustomerUpdated { id: customer.id }, None);

        Ok(customer)
    }
}
