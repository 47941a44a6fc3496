//! Session storage
//!
//! The gateway and REST layer only ever talk to the [`SessionStore`] trait,
//! so the in-memory backend can be swapped for a shared one without touching
//! the state machine. Handlers read a full record, mutate in memory, and
//! write the full record back; the store never exposes partial sessions.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::lobby::code::normalize_code;
use crate::lobby::model::{Lobby, Phase};

/// Durable keyed storage for lobby sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new lobby; fails with `DuplicateCode` if the code is taken
    async fn create(&self, lobby: Lobby) -> Result<(), StoreError>;

    /// Fetch a lobby by code (case-insensitive)
    async fn get(&self, code: &str) -> Result<Lobby, StoreError>;

    /// Upsert a lobby, stamping `last_activity`
    async fn save(&self, lobby: Lobby) -> Result<(), StoreError>;

    /// Remove a lobby; succeeds whether or not it exists
    async fn delete(&self, code: &str) -> Result<(), StoreError>;

    /// Remove every lobby idle longer than `max_age`, returning their codes
    async fn sweep_expired(&self, max_age: Duration) -> Result<Vec<String>, StoreError>;

    /// Number of live lobbies
    async fn count(&self) -> Result<usize, StoreError>;

    /// Live lobbies grouped by phase
    async fn count_by_phase(&self) -> Result<HashMap<Phase, usize>, StoreError>;
}

/// In-memory `SessionStore` backend
///
/// Good for a single-instance deployment; multi-instance deployments need a
/// backend with atomic read-modify-write.
#[derive(Default)]
pub struct MemorySessionStore {
    lobbies: RwLock<HashMap<String, Lobby>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, lobby: Lobby) -> Result<(), StoreError> {
        let key = normalize_code(&lobby.code);
        let mut lobbies = self.lobbies.write().await;
        if lobbies.contains_key(&key) {
            return Err(StoreError::DuplicateCode(key));
        }
        lobbies.insert(key, lobby);
        Ok(())
    }

    async fn get(&self, code: &str) -> Result<Lobby, StoreError> {
        let key = normalize_code(code);
        self.lobbies
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(StoreError::NotFound(key))
    }

    async fn save(&self, mut lobby: Lobby) -> Result<(), StoreError> {
        lobby.last_activity = Utc::now();
        let key = normalize_code(&lobby.code);
        self.lobbies.write().await.insert(key, lobby);
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<(), StoreError> {
        let key = normalize_code(code);
        self.lobbies.write().await.remove(&key);
        Ok(())
    }

    async fn sweep_expired(&self, max_age: Duration) -> Result<Vec<String>, StoreError> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(max_age)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut lobbies = self.lobbies.write().await;
        let expired: Vec<String> = lobbies
            .iter()
            .filter(|(_, lobby)| lobby.last_activity < cutoff)
            .map(|(code, _)| code.clone())
            .collect();
        for code in &expired {
            lobbies.remove(code);
        }
        Ok(expired)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lobbies.read().await.len())
    }

    async fn count_by_phase(&self) -> Result<HashMap<Phase, usize>, StoreError> {
        let lobbies = self.lobbies.read().await;
        let mut counts = HashMap::new();
        for lobby in lobbies.values() {
            *counts.entry(lobby.phase).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
