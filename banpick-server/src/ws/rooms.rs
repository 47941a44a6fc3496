//! Per-lobby broadcast rooms
//!
//! Each lobby gets one broadcast channel; every connection joined to the
//! lobby subscribes to it. Envelopes carry their audience so each connection
//! filters against its own player identity before forwarding to the socket.

use std::collections::HashMap;

use banpick_core::Audience;
use tokio::sync::{RwLock, broadcast};

use super::protocol::ServerMessage;

/// Capacity of each room's broadcast channel
const ROOM_CHANNEL_CAPACITY: usize = 64;

/// A message addressed to some subset of a room
#[derive(Debug, Clone)]
pub struct RoomEnvelope {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl RoomEnvelope {
    /// Whether a connection identifying as `player_id` should receive this
    pub fn is_for(&self, player_id: &str) -> bool {
        match &self.audience {
            Audience::Room => true,
            Audience::Player(id) => id == player_id,
            Audience::Exclude(id) => id != player_id,
        }
    }
}

/// Registry of live lobby rooms
#[derive(Default)]
pub struct Rooms {
    inner: RwLock<HashMap<String, broadcast::Sender<RoomEnvelope>>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a lobby room, creating it if needed
    pub async fn join(&self, code: &str) -> broadcast::Receiver<RoomEnvelope> {
        let mut rooms = self.inner.write().await;
        rooms
            .entry(code.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish to a room; dropped silently when the room has no members
    pub async fn publish(&self, code: &str, audience: Audience, message: ServerMessage) {
        let rooms = self.inner.read().await;
        if let Some(tx) = rooms.get(code) {
            let _ = tx.send(RoomEnvelope { audience, message });
        }
    }

    /// Number of connections currently subscribed to a room
    pub async fn member_count(&self, code: &str) -> usize {
        self.inner
            .read()
            .await
            .get(code)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop a room once its last member left
    pub async fn prune(&self, code: &str) {
        let mut rooms = self.inner.write().await;
        if let Some(tx) = rooms.get(code) {
            if tx.receiver_count() == 0 {
                rooms.remove(code);
            }
        }
    }
}
