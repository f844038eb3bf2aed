//! Realtime event catalogue.
//!
//! Every state change the storefront or admin console may want to react to
//! is one of these variants. Events are notifications only: they carry ids
//! and small facts, and clients re-fetch the full state they care about.

use serde_json::{Value, json};

use crate::{CustomerId, MovementId, ProductId, ReservationId, ReservationStatus, UserId};

/// A named event pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    /// Something about stock changed; lists should be reloaded.
    InventoryUpdated,
    MovementCreated {
        id: MovementId,
        product_id: ProductId,
    },
    StockChanged {
        id: ProductId,
        new_stock: i32,
    },
    ReservationCreated {
        id: ReservationId,
    },
    ReservationStatusChanged {
        id: ReservationId,
        status: ReservationStatus,
        customer_id: Option<CustomerId>,
        created_by: Option<UserId>,
    },
    ReservationsUpdated,
    SalesUpdated,
    ProductCreated {
        id: ProductId,
    },
    ProductUpdated {
        id: ProductId,
    },
    ProductDeleted {
        id: ProductId,
    },
    CustomerUpdated {
        id: CustomerId,
    },
}

impl RealtimeEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InventoryUpdated => "inventory:updated",
            Self::MovementCreated { .. } => "inventory:movement-created",
            Self::StockChanged { .. } => "product:stock-changed",
            Self::ReservationCreated { .. } => "reservation:created",
            Self::ReservationStatusChanged { .. } => "reservation:status-changed",
            Self::ReservationsUpdated => "reservations:updated",
            Self::SalesUpdated => "sales:updated",
            Self::ProductCreated { .. } => "product:created",
            Self::ProductUpdated { .. } => "product:updated",
            Self::ProductDeleted { .. } => "product:deleted",
            Self::CustomerUpdated { .. } => "customer:updated",
        }
    }

    /// JSON payload of the event (`null` for bare refresh signals).
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::InventoryUpdated | Self::ReservationsUpdated | Self::SalesUpdated => Value::Null,
            Self::MovementCreated { id, product_id } => {
                json!({ "id": id, "product_id": product_id })
            }
            Self::StockChanged { id, new_stock } => json!({ "id": id, "newStock": new_stock }),
            Self::ReservationCreated { id } => json!({ "id": id }),
            Self::ReservationStatusChanged {
                id,
                status,
                customer_id,
                created_by,
            } => json!({
                "id": id,
                "status": status,
                "customer_id": customer_id,
                "created_by": created_by,
            }),
            Self::ProductCreated { id } | Self::ProductUpdated { id } | Self::ProductDeleted { id } => {
                json!({ "id": id })
            }
            Self::CustomerUpdated { id } => json!({ "id": id }),
        }
    }

    /// The frame sent over the WebSocket: `{"event": name, "data": payload}`.
    #[must_use]
    pub fn to_frame(&self) -> Value {
        json!({ "event": self.name(), "data": self.payload() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_changed_uses_camel_case_field() {
        let event = RealtimeEvent::StockChanged {
            id: ProductId::new(4),
            new_stock: 2,
        };
        assert_eq!(event.name(), "product:stock-changed");
        assert_eq!(event.payload(), json!({"id": 4, "newStock": 2}));
    }

    #[test]
    fn test_status_changed_payload() {
        let event = RealtimeEvent::ReservationStatusChanged {
            id: ReservationId::new(9),
            status: ReservationStatus::Cancelled,
            customer_id: Some(CustomerId::new(3)),
            created_by: None,
        };
        assert_eq!(
            event.to_frame(),
            json!({
                "event": "reservation:status-changed",
                "data": {"id": 9, "status": "Cancelled", "customer_id": 3, "created_by": null}
            })
        );
    }

    #[test]
    fn test_refresh_signals_have_null_payload() {
        assert_eq!(RealtimeEvent::InventoryUpdated.payload(), Value::Null);
        assert_eq!(RealtimeEvent::SalesUpdated.name(), "sales:updated");
        assert_eq!(RealtimeEvent::ReservationsUpdated.name(), "reservations:updated");
    }
}
