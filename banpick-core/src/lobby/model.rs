//! Lobby aggregate and per-player draft bookkeeping

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::faction::Faction;

/// Tournament format, fixing how many factions each player drafts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TournamentFormat {
    #[default]
    #[serde(rename = "bo3")]
    ThreeRound,
    #[serde(rename = "bo5")]
    FiveRound,
}

impl TournamentFormat {
    /// Number of factions a player must confirm during selection
    pub fn required_picks(&self) -> usize {
        match self {
            Self::ThreeRound => 3,
            Self::FiveRound => 4,
        }
    }

    /// Maximum number of rounds played in this format
    pub fn max_rounds(&self) -> usize {
        match self {
            Self::ThreeRound => 3,
            Self::FiveRound => 5,
        }
    }

    /// Convert to the wire/JSON string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeRound => "bo3",
            Self::FiveRound => "bo5",
        }
    }

    /// Parse from the wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bo3" => Some(Self::ThreeRound),
            "bo5" => Some(Self::FiveRound),
            _ => None,
        }
    }
}

/// Phase of a draft session
///
/// Phases only move forward (Waiting -> Selecting -> Banning -> Completed)
/// or reset fully back to Waiting. The wire strings match the original
/// client protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Phase {
    #[default]
    #[serde(rename = "waiting")]
    Waiting,
    #[serde(rename = "selecting-factions")]
    Selecting,
    #[serde(rename = "banning")]
    Banning,
    #[serde(rename = "match-results")]
    Completed,
}

impl Phase {
    /// Convert to the wire/JSON string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Selecting => "selecting-factions",
            Self::Banning => "banning",
            Self::Completed => "match-results",
        }
    }

    /// Parse from the wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "selecting-factions" => Some(Self::Selecting),
            "banning" => Some(Self::Banning),
            "match-results" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player bound to a lobby slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub id: String,
    pub name: String,
}

impl PlayerSlot {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Which slot a player occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    /// The other slot
    pub fn opponent(&self) -> Role {
        match self {
            Self::Host => Self::Guest,
            Self::Guest => Self::Host,
        }
    }
}

/// Per-player transient draft state
///
/// Lives only on the live session; the finalized result is copied into a
/// [`crate::history::MatchRecord`] when the session completes and resets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerDraft {
    /// In-progress or confirmed faction picks (deduped, insertion order)
    pub selections: Vec<Faction>,
    /// The faction this player bans from the opponent's pool
    pub banned_faction: Option<Faction>,
    pub selection_confirmed: bool,
    pub ban_confirmed: bool,
    /// Final pool after the opponent's ban; filled at completion
    pub remaining_factions: Vec<Faction>,
}

impl PlayerDraft {
    /// Clear everything (full reset)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Clear only the ban-phase fields, keeping confirmed selections
    pub fn clear_ban(&mut self) {
        self.banned_faction = None;
        self.ban_confirmed = false;
        self.remaining_factions.clear();
    }
}

/// The lobby session aggregate, keyed by a short shareable code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    pub code: String,
    pub format: TournamentFormat,
    pub phase: Phase,
    /// Fixed at creation
    pub host: PlayerSlot,
    /// Bound by the first successful join
    pub guest: Option<PlayerSlot>,
    pub host_draft: PlayerDraft,
    pub guest_draft: PlayerDraft,
    pub created_at: DateTime<Utc>,
    /// Updated on every mutating operation; drives expiry
    pub last_activity: DateTime<Utc>,
}

impl Lobby {
    /// Create a new lobby in the Waiting phase with an empty guest slot
    pub fn new(code: impl Into<String>, host: PlayerSlot, format: TournamentFormat) -> Self {
        let now = Utc::now();
        Self {
            code: code.into(),
            format,
            phase: Phase::Waiting,
            host,
            guest: None,
            host_draft: PlayerDraft::default(),
            guest_draft: PlayerDraft::default(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Which slot the given player id occupies, if any
    pub fn role_of(&self, player_id: &str) -> Option<Role> {
        if self.host.id == player_id {
            Some(Role::Host)
        } else if self.guest.as_ref().is_some_and(|g| g.id == player_id) {
            Some(Role::Guest)
        } else {
            None
        }
    }

    /// The player bound to a slot (None for an unbound guest slot)
    pub fn player(&self, role: Role) -> Option<&PlayerSlot> {
        match role {
            Role::Host => Some(&self.host),
            Role::Guest => self.guest.as_ref(),
        }
    }

    /// Draft state for a slot
    pub fn draft(&self, role: Role) -> &PlayerDraft {
        match role {
            Role::Host => &self.host_draft,
            Role::Guest => &self.guest_draft,
        }
    }

    /// Mutable draft state for a slot
    pub fn draft_mut(&mut self, role: Role) -> &mut PlayerDraft {
        match role {
            Role::Host => &mut self.host_draft,
            Role::Guest => &mut self.guest_draft,
        }
    }

    /// Whether both slots are bound
    pub fn is_full(&self) -> bool {
        self.guest.is_some()
    }

    /// Picks each player must confirm, fixed by the format
    pub fn required_picks(&self) -> usize {
        self.format.required_picks()
    }

    /// Stamp the activity timestamp
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> Lobby {
        Lobby::new(
            "GWTEST",
            PlayerSlot::new("host-1", "Geralt"),
            TournamentFormat::ThreeRound,
        )
    }

    #[test]
    fn format_fixes_required_picks() {
        assert_eq!(TournamentFormat::ThreeRound.required_picks(), 3);
        assert_eq!(TournamentFormat::FiveRound.required_picks(), 4);
        assert_eq!(TournamentFormat::ThreeRound.max_rounds(), 3);
        assert_eq!(TournamentFormat::FiveRound.max_rounds(), 5);
    }

    #[test]
    fn phase_wire_strings_round_trip() {
        for phase in [
            Phase::Waiting,
            Phase::Selecting,
            Phase::Banning,
            Phase::Completed,
        ] {
            assert_eq!(Phase::parse(phase.as_str()), Some(phase));
        }
    }

    #[test]
    fn new_lobby_starts_waiting_with_empty_guest() {
        let lobby = lobby();
        assert_eq!(lobby.phase, Phase::Waiting);
        assert!(lobby.guest.is_none());
        assert!(!lobby.is_full());
        assert_eq!(lobby.required_picks(), 3);
    }

    #[test]
    fn role_of_resolves_both_slots() {
        let mut lobby = lobby();
        assert_eq!(lobby.role_of("host-1"), Some(Role::Host));
        assert_eq!(lobby.role_of("guest-1"), None);

        lobby.guest = Some(PlayerSlot::new("guest-1", "Yennefer"));
        assert_eq!(lobby.role_of("guest-1"), Some(Role::Guest));
        assert_eq!(lobby.role_of("stranger"), None);
    }

    #[test]
    fn touch_advances_last_activity() {
        let mut lobby = lobby();
        let before = lobby.last_activity;
        lobby.touch();
        assert!(lobby.last_activity >= before);
    }

    #[test]
    fn clear_ban_keeps_selections() {
        let mut draft = PlayerDraft {
            selections: vec![Faction::Monsters, Faction::Skellige],
            banned_faction: Some(Faction::Nilfgaard),
            selection_confirmed: true,
            ban_confirmed: true,
            remaining_factions: vec![Faction::Monsters],
        };
        draft.clear_ban();
        assert_eq!(
            draft.selections,
            vec![Faction::Monsters, Faction::Skellige]
        );
        assert!(draft.selection_confirmed);
        assert!(draft.banned_faction.is_none());
        assert!(!draft.ban_confirmed);
        assert!(draft.remaining_factions.is_empty());
    }
}
