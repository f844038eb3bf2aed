//! WebSocket endpoint.
//!
//! Server → client frames are `{"event": name, "data": payload}`. Clients may
//! send `{"type": "join-room", "room": "admin"}` and
//! `{"type": "leave-room", "room": "admin"}`; anything else is ignored.

use std::collections::HashMap;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, Utf8Bytes, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::{Broadcaster, Frame};
use crate::state::AppState;

/// Frames buffered per socket between the forwarders and the writer.
const OUTBOUND_BUFFER: usize = 64;
const MAX_ROOMS_PER_SOCKET: usize = 16;
const MAX_ROOM_NAME_LEN: usize = 64;

const CONNECTED_FRAME: &str = r#"{"event":"connected","data":null}"#;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ClientMessage {
    JoinRoom { room: String },
    LeaveRoom { room: String },
}

fn valid_room(room: &str) -> bool {
    !room.trim().is_empty() && room.len() <= MAX_ROOM_NAME_LEN
}

/// `GET /ws`
#[allow(clippy::unused_async)]
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let broadcaster = state.broadcaster().clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Broadcaster) {
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Frame>(OUTBOUND_BUFFER);

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink
                .send(Message::Text(Utf8Bytes::from(frame.to_string())))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    if out_tx.send(Frame::from(CONNECTED_FRAME)).await.is_err() {
        writer.abort();
        return;
    }

    let global = tokio::spawn(forward(broadcaster.subscribe(), out_tx.clone()));
    let mut rooms: HashMap<String, JoinHandle<()>> = HashMap::new();
    tracing::debug!(subscribers = broadcaster.subscriber_count(), "WebSocket connected");

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::JoinRoom { room }) => {
                    if !valid_room(&room) || rooms.len() >= MAX_ROOMS_PER_SOCKET {
                        tracing::debug!(room = %room, "Join rejected");
                        continue;
                    }
                    if !rooms.contains_key(&room) {
                        let task = tokio::spawn(forward(
                            broadcaster.subscribe_room(&room),
                            out_tx.clone(),
                        ));
                        tracing::debug!(room = %room, "Joined room");
                        rooms.insert(room, task);
                    }
                }
                Ok(ClientMessage::LeaveRoom { room }) => {
                    if let Some(task) = rooms.remove(&room) {
                        task.abort();
                        tracing::debug!(room = %room, "Left room");
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring client message");
                }
            },
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    global.abort();
    for task in rooms.into_values() {
        task.abort();
    }
    drop(out_tx);
    writer.abort();
    tracing::debug!("WebSocket disconnected");
}

/// Copy frames from a broadcast receiver to the socket's writer.
async fn forward(mut rx: broadcast::Receiver<Frame>, out: mpsc::Sender<Frame>) {
    loop {
        match rx.recv().await {
            Ok(frame) => {
                if out.send(frame).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "WebSocket client lagging, events skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_room_messages() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"type":"join-room","room":"admin"}"#).unwrap();
        assert_eq!(
            join,
            ClientMessage::JoinRoom {
                room: "admin".to_string()
            }
        );
        let leave: ClientMessage =
            serde_json::from_str(r#"{"type":"leave-room","room":"admin"}"#).unwrap();
        assert!(matches!(leave, ClientMessage::LeaveRoom { .. }));
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }

    #[test]
    fn test_room_name_rules() {
        assert!(valid_room("admin"));
        assert!(!valid_room("  "));
        assert!(!valid_room(&"x".repeat(MAX_ROOM_NAME_LEN + 1)));
    }

    #[test]
    fn test_connected_frame_shape() {
        let value: serde_json::Value = serde_json::from_str(CONNECTED_FRAME).unwrap();
        assert_eq!(value["event"], "connected");
    }

    #[tokio::test]
    async fn test_forward_copies_frames() {
        let broadcaster = Broadcaster::new(4);
        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(forward(broadcaster.subscribe(), tx));

        broadcaster.broadcast(&ksurplus_core::RealtimeEvent::SalesUpdated, None);
        let frame = rx.recv().await.unwrap();
        assert!(frame.contains("sales:updated"));
        task.abort();
    }
}
