//! Ledger operations exposed over HTTP.

use sqlx::PgPool;
use tracing::instrument;

use ksurplus_core::RealtimeEvent;

use crate::inventory::{self, InventoryError};
use crate::models::{Movement, MovementFilter, RecordMovementInput, RecordedMovement};
use crate::realtime::Broadcaster;

/// Records movements and announces the resulting stock changes.
pub struct InventoryService<'a> {
    pool: &'a PgPool,
    events: &'a Broadcaster,
}

impl<'a> InventoryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, events: &'a Broadcaster) -> Self {
        Self { pool, events }
    }

    /// Record a movement; replays of a `transaction_id` change nothing and
    /// announce nothing.
    ///
    /// # Errors
    ///
    /// See [`inventory::record_movement`].
    #[instrument(skip(self, input))]
    pub async fn record_movement(
        &self,
        input: RecordMovementInput,
    ) -> Result<RecordedMovement, InventoryError> {
        let product_id = input.product_id;
        let recorded = inventory::record_movement(self.pool, input).await?;

        if let Some(new_stock) = recorded.new_stock {
            self.events.broadcast_all(&[
                RealtimeEvent::MovementCreated {
                    id: recorded.id,
                    product_id,
                },
                RealtimeEvent::InventoryUpdated,
                RealtimeEvent::StockChanged {
                    id: product_id,
                    new_stock,
                },
            ]);
        }

        Ok(recorded)
    }

    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn list_movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<Movement>, InventoryError> {
        inventory::list_movements(self.pool, filter).await
    }
}
