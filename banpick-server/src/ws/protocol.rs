//! WebSocket protocol message types
//!
//! Inbound actions and outbound events share one tagged JSON shape with the
//! original client. Outbound snapshots are sanitized: a player's picks stay
//! private until confirmed, and bans stay private until the session
//! completes.

use banpick_core::{
    Faction, Lobby, LobbyEvent, Phase, PlayerDraft, PlayerSlot, Role, TournamentFormat,
};
use serde::{Deserialize, Serialize};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join a lobby room (binds the guest slot on first join)
    Join {
        code: String,
        player_id: String,
        player_name: String,
    },

    /// Start the faction selection phase (host only)
    StartSelection { code: String },

    /// Replace the in-progress selection set (pre-confirmation)
    SaveProgress { code: String, factions: Vec<String> },

    /// Confirm the final selection set
    ConfirmSelection { code: String, factions: Vec<String> },

    /// Confirm the ban against the opponent's pool
    ConfirmBan { code: String, faction: String },

    /// Reset the lobby for another draft (host only)
    Reset { code: String },

    /// Re-enter a lobby room after a dropped connection
    Reconnect { code: String, player_id: String },
}

/// Public view of one player slot
///
/// `selections` appears only once that player confirmed; `banned_faction`
/// and `remaining_factions` only once the session completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerPublic {
    pub id: String,
    pub name: String,
    pub selection_confirmed: bool,
    pub ban_confirmed: bool,
    pub selection_count: usize,
    pub selections: Option<Vec<Faction>>,
    pub banned_faction: Option<Faction>,
    pub remaining_factions: Option<Vec<Faction>>,
}

impl PlayerPublic {
    fn sanitized(slot: &PlayerSlot, draft: &PlayerDraft, completed: bool) -> Self {
        Self {
            id: slot.id.clone(),
            name: slot.name.clone(),
            selection_confirmed: draft.selection_confirmed,
            ban_confirmed: draft.ban_confirmed,
            selection_count: draft.selections.len(),
            selections: draft
                .selection_confirmed
                .then(|| draft.selections.clone()),
            banned_faction: if completed { draft.banned_faction } else { None },
            remaining_factions: completed.then(|| draft.remaining_factions.clone()),
        }
    }
}

/// Sanitized full-lobby snapshot broadcast as `lobby-update`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LobbySnapshot {
    pub code: String,
    pub format: TournamentFormat,
    pub required_picks: usize,
    pub phase: Phase,
    pub host: PlayerPublic,
    pub guest: Option<PlayerPublic>,
}

impl LobbySnapshot {
    /// Build the room-safe view of a lobby
    pub fn sanitized(lobby: &Lobby) -> Self {
        let completed = lobby.phase == Phase::Completed;
        Self {
            code: lobby.code.clone(),
            format: lobby.format,
            required_picks: lobby.required_picks(),
            phase: lobby.phase,
            host: PlayerPublic::sanitized(&lobby.host, &lobby.host_draft, completed),
            guest: lobby
                .guest
                .as_ref()
                .map(|slot| PlayerPublic::sanitized(slot, &lobby.guest_draft, completed)),
        }
    }
}

/// A player's own draft state, sent only to that player on reconnect
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrivateDraft {
    pub selections: Vec<Faction>,
    pub banned_faction: Option<Faction>,
    pub selection_confirmed: bool,
    pub ban_confirmed: bool,
}

impl PrivateDraft {
    pub fn for_role(lobby: &Lobby, role: Role) -> Self {
        let draft: &PlayerDraft = lobby.draft(role);
        Self {
            selections: draft.selections.clone(),
            banned_faction: draft.banned_faction,
            selection_confirmed: draft.selection_confirmed,
            ban_confirmed: draft.ban_confirmed,
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Full sanitized session snapshot
    LobbyUpdate { lobby: LobbySnapshot },

    PlayerJoined {
        player_id: String,
        player_name: String,
        is_host: bool,
    },

    FactionSelectionStarted,

    /// Opponent's in-progress pick count (identities stay private)
    OpponentSelectionProgress { player_id: String, count: usize },

    SelectionConfirmed { player_id: String },

    PlayerSelectionStatus {
        player_id: String,
        completed: bool,
        phase: Phase,
    },

    PhaseChanged { phase: Phase },

    BanConfirmed { player_id: String },

    BanPhaseEnded { time_expired: bool },

    SelectionTimerExpired,

    BanTimerExpired,

    PlayerDisconnected { player_id: String },

    PlayerReconnected { player_id: String },

    LobbyReset,

    /// Reply to a reconnect, carrying the caller's own private draft
    ReconnectSuccess {
        lobby: LobbySnapshot,
        private_draft: PrivateDraft,
    },

    /// Error surfaced to the originating connection only
    Error { message: String, code: String },
}

/// Convert a core lobby event to its wire message
pub fn lobby_event_to_server_message(event: &LobbyEvent) -> ServerMessage {
    match event {
        LobbyEvent::PlayerJoined {
            player_id,
            player_name,
            is_host,
        } => ServerMessage::PlayerJoined {
            player_id: player_id.clone(),
            player_name: player_name.clone(),
            is_host: *is_host,
        },
        LobbyEvent::FactionSelectionStarted => ServerMessage::FactionSelectionStarted,
        LobbyEvent::OpponentSelectionProgress { player_id, count } => {
            ServerMessage::OpponentSelectionProgress {
                player_id: player_id.clone(),
                count: *count,
            }
        }
        LobbyEvent::SelectionConfirmed { player_id } => ServerMessage::SelectionConfirmed {
            player_id: player_id.clone(),
        },
        LobbyEvent::PlayerSelectionStatus {
            player_id,
            completed,
            phase,
        } => ServerMessage::PlayerSelectionStatus {
            player_id: player_id.clone(),
            completed: *completed,
            phase: *phase,
        },
        LobbyEvent::PhaseChanged { phase } => ServerMessage::PhaseChanged { phase: *phase },
        LobbyEvent::BanConfirmed { player_id } => ServerMessage::BanConfirmed {
            player_id: player_id.clone(),
        },
        LobbyEvent::BanPhaseEnded { time_expired } => ServerMessage::BanPhaseEnded {
            time_expired: *time_expired,
        },
        LobbyEvent::SelectionTimerExpired => ServerMessage::SelectionTimerExpired,
        LobbyEvent::BanTimerExpired => ServerMessage::BanTimerExpired,
        LobbyEvent::LobbyReset => ServerMessage::LobbyReset,
        LobbyEvent::PlayerReconnected { player_id } => ServerMessage::PlayerReconnected {
            player_id: player_id.clone(),
        },
        LobbyEvent::PlayerDisconnected { player_id } => ServerMessage::PlayerDisconnected {
            player_id: player_id.clone(),
        },
    }
}
