//! Reservation models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ksurplus_core::{
    CustomerId, ProductId, ReservationId, ReservationStatus, UserId, exceeds_max_amount,
};

use super::CustomerDetails;
use crate::inventory::InventoryError;

const MAX_NOTES_LEN: usize = 1000;

/// A reservation with product and customer names for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub reservation_code: String,
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub product_id: ProductId,
    pub product_name: String,
    pub reserved_price: Decimal,
    pub notes: Option<String>,
    pub status: ReservationStatus,
    pub created_by: Option<UserId>,
    pub reserved_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/reservations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReservationInput {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub customer: Option<CustomerDetails>,
    pub product_id: ProductId,
    /// Defaults to the product's retail price.
    #[serde(default)]
    pub reserved_price: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

impl CreateReservationInput {
    /// Checks that need no database access.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrice` for an explicit price that is not positive or
    /// too large to store, and
    /// `Validation` for a malformed email or overlong notes.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self
            .reserved_price
            .is_some_and(|p| p <= Decimal::ZERO || exceeds_max_amount(p))
        {
            return Err(InventoryError::InvalidPrice);
        }
        if let Some(customer) = &self.customer {
            customer.email()?;
        }
        if self
            .notes
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_NOTES_LEN)
        {
            return Err(InventoryError::Validation(format!(
                "notes must be at most {MAX_NOTES_LEN} characters"
            )));
        }
        Ok(())
    }

    /// The customer the reservation is for; a top-level `customer_id` wins
    /// over inline details.
    #[must_use]
    pub fn customer_details(&self) -> CustomerDetails {
        match self.customer_id {
            Some(id) => CustomerDetails {
                customer_id: Some(id),
                ..CustomerDetails::default()
            },
            None => self.customer.clone().unwrap_or_default(),
        }
    }

    /// Notes with surrounding whitespace removed; blank notes are dropped.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Result of creating a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedReservation {
    pub id: ReservationId,
    pub reservation_code: String,
    pub customer_id: Option<CustomerId>,
    pub new_stock: i32,
}

/// Body of `PUT /api/reservations/{id}/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpdateReservationStatus {
    pub status: ReservationStatus,
}

/// A customer's reservation quota for one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuota {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub date: NaiveDate,
    /// Whether the server rejects reservations over the limit.
    pub enforced: bool,
}
