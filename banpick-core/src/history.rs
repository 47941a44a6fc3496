//! Match history sink
//!
//! When a completed session is reset, its finalized result is appended here
//! exactly once. The sink is append-only from the core's point of view;
//! nothing in the draft flow ever reads it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::HistoryError;
use crate::faction::Faction;
use crate::lobby::model::{PlayerSlot, TournamentFormat};

/// A finalized draft result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub code: String,
    pub host: PlayerSlot,
    pub guest: Option<PlayerSlot>,
    pub format: TournamentFormat,
    pub host_factions: Vec<Faction>,
    pub guest_factions: Vec<Faction>,
    pub host_banned_faction: Option<Faction>,
    pub guest_banned_faction: Option<Faction>,
    pub host_remaining_factions: Vec<Faction>,
    pub guest_remaining_factions: Vec<Faction>,
    pub completed_at: DateTime<Utc>,
}

/// Append-only store of finalized matches
#[async_trait]
pub trait MatchHistory: Send + Sync {
    async fn append(&self, record: MatchRecord) -> Result<(), HistoryError>;
}

/// In-memory `MatchHistory` backend
#[derive(Default)]
pub struct MemoryMatchHistory {
    records: RwLock<Vec<MatchRecord>>,
}

impl MemoryMatchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended records
    pub async fn records(&self) -> Vec<MatchRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MatchHistory for MemoryMatchHistory {
    async fn append(&self, record: MatchRecord) -> Result<(), HistoryError> {
        self.records.write().await.push(record);
        Ok(())
    }
}
