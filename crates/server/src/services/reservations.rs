//! Reservation creation and lifecycle.
//!
//! Creating a reservation takes one unit out of stock in the same
//! transaction as the reservation row. Status changes never put stock back.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, PgPool};
use tracing::instrument;

use ksurplus_core::{
    CustomerId, DailyReservationPolicy, MovementReason, RealtimeEvent, ReferenceType,
    ReservationId, ReservationStatus, codes,
};

use super::customers::resolve_customer;
use crate::db::customers::{self, OnExisting};
use crate::db::{RepositoryError, ReservationRepository, products, reservations};
use crate::inventory::{InventoryError, decrease_stock};
use crate::models::{
    CreateReservationInput, CreatedReservation, DailyQuota, MovementDetails, Reservation,
};
use crate::realtime::Broadcaster;
use crate::state::AppState;

/// Attempts at generating an unused reservation code.
const CODE_ATTEMPTS: usize = 3;

/// Reservation operations.
pub struct ReservationService<'a> {
    pool: &'a PgPool,
    events: &'a Broadcaster,
    policy: DailyReservationPolicy,
    enforce_daily_limit: bool,
}

impl<'a> ReservationService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        events: &'a Broadcaster,
        policy: DailyReservationPolicy,
        enforce_daily_limit: bool,
    ) -> Self {
        Self {
            pool,
            events,
            policy,
            enforce_daily_limit,
        }
    }

    /// Service configured from the application state.
    #[must_use]
    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            state.pool(),
            state.broadcaster(),
            state.reservation_policy(),
            state.config().enforce_daily_limit,
        )
    }

    /// Reserve one unit of a product.
    ///
    /// # Errors
    ///
    /// - `InventoryError::Validation` / `InvalidPrice` for bad input
    /// - `InventoryError::ProductNotFound` for a missing or archived product
    /// - `InventoryError::CustomerNotFound` for an unknown `customer_id`
    /// - `InventoryError::InsufficientStock` when the product is out of stock
    /// - `InventoryError::DailyLimitExceeded` when the customer is at the limit
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create(
        &self,
        input: CreateReservationInput,
    ) -> Result<CreatedReservation, InventoryError> {
        input.validate()?;
        let product_id = input.product_id;
        let today = Utc::now().date_naive();

        let mut tx = self.pool.begin().await?;

        let product = products::lock(&mut *tx, product_id)
            .await?
            .filter(products::LockedProduct::is_active)
            .ok_or(InventoryError::ProductNotFound(product_id))?;
        if product.stock_quantity < 1 {
            return Err(InventoryError::InsufficientStock {
                product_id,
                available: product.stock_quantity,
                requested: 1,
            });
        }

        let reserved_price = input.reserved_price.unwrap_or(product.retail_price);
        if reserved_price <= Decimal::ZERO {
            return Err(InventoryError::InvalidPrice);
        }

        let customer_id =
            resolve_customer(&mut *tx, &input.customer_details(), OnExisting::Keep).await?;

        if let Some(customer_id) = customer_id
            && self.enforce_daily_limit
        {
            // Serializes reservations by the same customer
            customers::lock(&mut *tx, customer_id).await?;
            let used = reservations::count_for_customer_on(&mut *tx, customer_id, today).await?;
            let used = u32::try_from(used).unwrap_or(u32::MAX);
            self.policy.check(used, 1)?;
        }

        let mut attempt = 0;
        let (id, reservation_code) = loop {
            attempt += 1;
            let code = codes::reservation_code(today);
            let mut savepoint = tx.begin().await?;
            let inserted = reservations::insert(
                &mut *savepoint,
                &reservations::NewReservation {
                    reservation_code: &code,
                    customer_id,
                    product_id,
                    reserved_price,
                    notes: input.notes(),
                    created_by: input.created_by,
                },
            )
            .await;
            match inserted {
                Ok(id) => {
                    savepoint.commit().await?;
                    break (id, code);
                }
                Err(RepositoryError::Conflict(_)) if attempt < CODE_ATTEMPTS => {
                    savepoint.rollback().await?;
                    tracing::warn!(code = %code, "Reservation code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        let details = MovementDetails::new(MovementReason::Reservation)
            .referencing(ReferenceType::Reservation, id.get())
            .created_by(input.created_by);
        let change = decrease_stock(&mut *tx, product_id, 1, &details).await?;

        tx.commit().await?;
        tracing::info!(
            reservation_id = %id,
            reservation_code = %reservation_code,
            new_stock = change.new_stock,
            "Reservation created"
        );

        self.events.broadcast_all(&[
            RealtimeEvent::ReservationCreated { id },
            RealtimeEvent::ReservationsUpdated,
            RealtimeEvent::InventoryUpdated,
            RealtimeEvent::StockChanged {
                id: product_id,
                new_stock: change.new_stock,
            },
            RealtimeEvent::SalesUpdated,
        ]);

        Ok(CreatedReservation {
            id,
            reservation_code,
            customer_id,
            new_stock: change.new_stock,
        })
    }

    /// Move a reservation to `status`.
    ///
    /// Re-applying the current status succeeds without writing or
    /// broadcasting anything. Stock is never restored.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::ReservationNotFound` or
    /// `InventoryError::InvalidTransition`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> Result<Reservation, InventoryError> {
        let mut tx = self.pool.begin().await?;

        let current = reservations::lock(&mut *tx, id)
            .await?
            .ok_or(InventoryError::ReservationNotFound(id))?;

        if current.status == status {
            tx.rollback().await?;
            return self.get(id).await;
        }
        if !current.status.can_transition_to(status) {
            return Err(InventoryError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        reservations::update_status(&mut *tx, id, status).await?;
        tx.commit().await?;
        tracing::info!(
            reservation_id = %id,
            from = %current.status,
            to = %status,
            "Reservation status changed"
        );

        self.events.broadcast_all(&[
            RealtimeEvent::ReservationStatusChanged {
                id,
                status,
                customer_id: current.customer_id,
                created_by: current.created_by,
            },
            RealtimeEvent::ReservationsUpdated,
            RealtimeEvent::SalesUpdated,
        ]);

        self.get(id).await
    }

    /// Reservations newest first, optionally for one customer.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn list(
        &self,
        customer_id: Option<CustomerId>,
    ) -> Result<Vec<Reservation>, InventoryError> {
        Ok(ReservationRepository::new(self.pool).list(customer_id).await?)
    }

    /// # Errors
    ///
    /// Returns `InventoryError::ReservationNotFound` if there is no such
    /// reservation.
    pub async fn get(&self, id: ReservationId) -> Result<Reservation, InventoryError> {
        ReservationRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(InventoryError::ReservationNotFound(id))
    }

    /// How many reservations `customer_id` has left on `date` (UTC, default
    /// today).
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn daily_quota(
        &self,
        customer_id: CustomerId,
        date: Option<NaiveDate>,
    ) -> Result<DailyQuota, InventoryError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let used = ReservationRepository::new(self.pool)
            .count_for_customer_on(customer_id, date)
            .await?;
        let used = u32::try_from(used).unwrap_or(u32::MAX);

        Ok(DailyQuota {
            limit: self.policy.limit(),
            used,
            remaining: self.policy.remaining(used),
            date,
            enforced: self.enforce_daily_limit,
        })
    }
}
