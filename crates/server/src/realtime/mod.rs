//! Realtime fan-out of state changes.
//!
//! ```text
//! service (after commit)
//!       │ RealtimeEvent
//!       ▼
//! Broadcaster
//!   ├── global: Sender<Frame>          every connected socket
//!   └── rooms:  name → Sender<Frame>   sockets that joined the room
//!         │
//!         ▼
//!   WebSocket handler (one forwarder task per subscription)
//! ```
//!
//! Delivery is best effort: nothing is persisted or replayed, and a socket
//! that falls behind the channel capacity skips the events it missed.
//! Clients re-fetch state when they (re)connect.

pub mod ws;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use ksurplus_core::RealtimeEvent;

/// A serialized `{"event", "data"}` frame, shared by all receivers.
pub type Frame = Arc<str>;

/// Publishes [`RealtimeEvent`]s to WebSocket subscribers.
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<BroadcasterInner>,
}

struct BroadcasterInner {
    capacity: usize,
    global: broadcast::Sender<Frame>,
    rooms: RwLock<HashMap<String, broadcast::Sender<Frame>>>,
}

impl Broadcaster {
    /// Create a broadcaster whose channels buffer `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (global, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(BroadcasterInner {
                capacity,
                global,
                rooms: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Send `event` to every socket, or only to those in `room`.
    ///
    /// Returns the number of receivers the frame was queued for. Having no
    /// receivers is not an error.
    pub fn broadcast(&self, event: &RealtimeEvent, room: Option<&str>) -> usize {
        let frame: Frame = Arc::from(event.to_frame().to_string());

        let delivered = match room {
            None => self.inner.global.send(frame).unwrap_or(0),
            Some(room) => {
                let rooms = self
                    .inner
                    .rooms
                    .read()
                    .unwrap_or_else(PoisonError::into_inner);
                rooms
                    .get(room)
                    .map_or(0, |tx| tx.send(frame).unwrap_or(0))
            }
        };

        tracing::debug!(event = event.name(), room, delivered, "Broadcast");
        delivered
    }

    /// Broadcast several events to every socket, in order.
    pub fn broadcast_all<'a>(&self, events: impl IntoIterator<Item = &'a RealtimeEvent>) {
        for event in events {
            self.broadcast(event, None);
        }
    }

    /// Receive frames sent to every socket.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.inner.global.subscribe()
    }

    /// Receive frames sent to `room`, creating the room on first use.
    #[must_use]
    pub fn subscribe_room(&self, room: &str) -> broadcast::Receiver<Frame> {
        let mut rooms = self
            .inner
            .rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Rooms nobody listens to any more are dropped here
        rooms.retain(|_, tx| tx.receiver_count() > 0);

        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
            .subscribe()
    }

    /// Sockets currently receiving global frames.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.global.receiver_count()
    }

    /// Rooms with at least one subscriber.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.inner
            .rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|tx| tx.receiver_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("capacity", &self.inner.capacity)
            .field("subscribers", &self.subscriber_count())
            .field("rooms", &self.room_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ksurplus_core::ProductId;
    use serde_json::{Value, json};
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    use super::*;

    fn parse(frame: &Frame) -> Value {
        serde_json::from_str(frame).unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let broadcaster = Broadcaster::new(16);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        let event = RealtimeEvent::StockChanged {
            id: ProductId::new(3),
            new_stock: 0,
        };
        assert_eq!(broadcaster.broadcast(&event, None), 2);

        let expected = json!({"event": "product:stock-changed", "data": {"id": 3, "newStock": 0}});
        assert_eq!(parse(&a.recv().await.unwrap()), expected);
        assert_eq!(parse(&b.recv().await.unwrap()), expected);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ok() {
        let broadcaster = Broadcaster::new(4);
        assert_eq!(broadcaster.broadcast(&RealtimeEvent::SalesUpdated, None), 0);
        assert_eq!(
            broadcaster.broadcast(&RealtimeEvent::SalesUpdated, Some("admin")),
            0
        );
    }

    #[tokio::test]
    async fn test_room_broadcast_is_scoped() {
        let broadcaster = Broadcaster::new(4);
        let mut global = broadcaster.subscribe();
        let mut admin = broadcaster.subscribe_room("admin");
        let mut other = broadcaster.subscribe_room("storefront");
        assert_eq!(broadcaster.room_count(), 2);

        broadcaster.broadcast(&RealtimeEvent::ReservationsUpdated, Some("admin"));

        let frame = admin.recv().await.unwrap();
        assert_eq!(parse(&frame)["event"], "reservations:updated");
        assert!(matches!(global.try_recv(), Err(TryRecvError::Empty)));
        assert!(matches!(other.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_lagging_receiver_skips_events() {
        let broadcaster = Broadcaster::new(2);
        let mut rx = broadcaster.subscribe();

        for _ in 0..5 {
            broadcaster.broadcast(&RealtimeEvent::InventoryUpdated, None);
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_empty_rooms_are_pruned() {
        let broadcaster = Broadcaster::new(4);
        let rx = broadcaster.subscribe_room("admin");
        drop(rx);
        assert_eq!(broadcaster.room_count(), 0);

        let _rx = broadcaster.subscribe_room("staff");
        assert_eq!(broadcaster.room_count(), 1);
    }
}
