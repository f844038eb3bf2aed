//! Status enums for products, reservations, and sales orders.

use serde::{Deserialize, Serialize};

/// Catalogue status of a product.
///
/// Products are never deleted; removing one from the storefront archives it
/// so that historical reservations, orders, and movements keep their
/// reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Archived,
}

/// Lifecycle of a reservation.
///
/// ```text
/// Pending ──> Confirmed ──> Cancelled
///    │
///    ├──────> Declined
///    └──────> Cancelled
/// ```
///
/// Changing status never restocks: the unit was taken out of stock when the
/// reservation was created and stays out until an explicit adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "reservation_status"))]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

impl ReservationStatus {
    /// Whether a reservation in this state may move to `next`.
    ///
    /// Re-applying the current status is allowed so that retried requests
    /// succeed without side effects.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, _)
                | (Self::Confirmed, Self::Confirmed | Self::Cancelled)
                | (Self::Declined, Self::Declined)
                | (Self::Cancelled, Self::Cancelled)
        )
    }

    /// Declined and Cancelled reservations accept no further changes.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Declined | Self::Cancelled)
    }

    /// Status name as stored and broadcast.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Declined => "Declined",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Declined" => Ok(Self::Declined),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid reservation status: {s}")),
        }
    }
}

/// Order and payment status of a manual sale.
///
/// Counter sales are settled on the spot, so they are created `Paid`; the
/// column stays free text so that later states do not need a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Paid,
}

impl OrderStatus {
    /// Status name as stored in `sales_orders.status` / `payment_status`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
