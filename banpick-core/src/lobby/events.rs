//! Events produced by draft operations
//!
//! The state machine returns these for the gateway to broadcast. Each event
//! carries its audience so the broadcast policy lives with the operation that
//! produced it, not scattered across transport handlers.

use serde::{Deserialize, Serialize};

use crate::lobby::model::Phase;

/// Who should receive an outbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every connection joined to the lobby room
    Room,
    /// Only connections identifying as this player
    Player(String),
    /// Every room member except this player
    Exclude(String),
}

/// A domain event paired with its broadcast audience
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub event: LobbyEvent,
}

impl Outbound {
    pub fn room(event: LobbyEvent) -> Self {
        Self {
            audience: Audience::Room,
            event,
        }
    }

    pub fn to_player(player_id: impl Into<String>, event: LobbyEvent) -> Self {
        Self {
            audience: Audience::Player(player_id.into()),
            event,
        }
    }

    pub fn except(player_id: impl Into<String>, event: LobbyEvent) -> Self {
        Self {
            audience: Audience::Exclude(player_id.into()),
            event,
        }
    }
}

/// Events emitted by the draft state machine and the gateway
///
/// Progress events deliberately carry only a count: what a player is picking
/// stays private until they confirm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LobbyEvent {
    PlayerJoined {
        player_id: String,
        player_name: String,
        is_host: bool,
    },
    FactionSelectionStarted,
    OpponentSelectionProgress {
        player_id: String,
        count: usize,
    },
    SelectionConfirmed {
        player_id: String,
    },
    PlayerSelectionStatus {
        player_id: String,
        completed: bool,
        phase: Phase,
    },
    PhaseChanged {
        phase: Phase,
    },
    BanConfirmed {
        player_id: String,
    },
    BanPhaseEnded {
        time_expired: bool,
    },
    SelectionTimerExpired,
    BanTimerExpired,
    LobbyReset,
    PlayerReconnected {
        player_id: String,
    },
    PlayerDisconnected {
        player_id: String,
    },
}
