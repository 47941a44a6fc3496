//! The draft state machine
//!
//! Every operation validates against the current phase and caller before
//! mutating, then returns the [`Effects`] the gateway must carry out: events
//! to broadcast, a timer instruction, and (on a completed-session reset) the
//! finalized match record for the history sink.
//!
//! Timeout handlers re-check the phase and degrade to a no-op when the phase
//! already advanced organically, so a stale timer firing after both players
//! confirmed can never corrupt a session.

use rand::seq::SliceRandom;
use tracing::warn;

use crate::error::DraftError;
use crate::faction::Faction;
use crate::history::MatchRecord;
use crate::lobby::events::{LobbyEvent, Outbound};
use crate::lobby::model::{Lobby, Phase, PlayerSlot, Role};

/// Timer instruction accompanying a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerCommand {
    /// Leave any pending countdown untouched
    #[default]
    Keep,
    /// (Re)arm the countdown for the given phase, replacing any pending one
    Arm(Phase),
    /// Cancel any pending countdown
    Cancel,
}

/// Everything a successful operation asks the gateway to do
#[derive(Debug, Default)]
pub struct Effects {
    pub events: Vec<Outbound>,
    pub timer: TimerCommand,
    /// Finalized result to append to match history (Completed -> reset only)
    pub match_record: Option<MatchRecord>,
}

impl Effects {
    /// True when the operation changed nothing and nothing must be broadcast
    pub fn is_noop(&self) -> bool {
        self.events.is_empty() && self.timer == TimerCommand::Keep && self.match_record.is_none()
    }
}

/// Dedup a faction list preserving first-seen order
fn dedup_factions(factions: Vec<Faction>) -> Vec<Faction> {
    let mut seen = Vec::with_capacity(factions.len());
    for faction in factions {
        if !seen.contains(&faction) {
            seen.push(faction);
        }
    }
    seen
}

impl Lobby {
    fn require_phase(&self, expected: Phase) -> Result<(), DraftError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DraftError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn require_role(&self, player_id: &str) -> Result<Role, DraftError> {
        self.role_of(player_id)
            .ok_or_else(|| DraftError::UnknownPlayer(player_id.to_string()))
    }

    /// Bind the guest slot, or accept a rejoin from either bound player
    ///
    /// Rejoining with an id that already occupies a slot is a no-op that
    /// still announces the player, so reconnecting clients behave the same
    /// as first-time joiners.
    pub fn join_guest(&mut self, player_id: &str, player_name: &str) -> Result<Effects, DraftError> {
        let announce = |slot: &PlayerSlot, is_host: bool| Effects {
            events: vec![Outbound::room(LobbyEvent::PlayerJoined {
                player_id: slot.id.clone(),
                player_name: slot.name.clone(),
                is_host,
            })],
            ..Effects::default()
        };

        match self.role_of(player_id) {
            Some(Role::Host) => return Ok(announce(&self.host, true)),
            Some(Role::Guest) => {
                // role_of only returns Guest when the slot is bound
                let guest = self.guest.clone().unwrap_or_else(|| {
                    PlayerSlot::new(player_id, player_name)
                });
                return Ok(announce(&guest, false));
            }
            None => {}
        }

        if self.guest.is_some() {
            return Err(DraftError::SlotOccupied);
        }
        self.require_phase(Phase::Waiting)?;

        let slot = PlayerSlot::new(player_id, player_name);
        self.guest = Some(slot.clone());
        self.touch();
        Ok(announce(&slot, false))
    }

    /// Start the selection phase (host only, both slots bound)
    pub fn start_selection(&mut self, player_id: &str) -> Result<Effects, DraftError> {
        let role = self.require_role(player_id)?;
        if role != Role::Host {
            return Err(DraftError::Unauthorized(
                "only the host can start faction selection".to_string(),
            ));
        }
        self.require_phase(Phase::Waiting)?;
        if !self.is_full() {
            return Err(DraftError::LobbyNotFull);
        }

        self.host_draft.clear();
        self.guest_draft.clear();
        self.phase = Phase::Selecting;
        self.touch();

        Ok(Effects {
            events: vec![Outbound::room(LobbyEvent::FactionSelectionStarted)],
            timer: TimerCommand::Arm(Phase::Selecting),
            match_record: None,
        })
    }

    /// Store a player's in-progress picks (pre-confirmation)
    ///
    /// The payload replaces any previous in-progress set; only the confirmed
    /// snapshot is authoritative. The opponent learns the count, never the
    /// faction identities.
    pub fn record_progress(
        &mut self,
        player_id: &str,
        factions: Vec<Faction>,
    ) -> Result<Effects, DraftError> {
        let role = self.require_role(player_id)?;
        self.require_phase(Phase::Selecting)?;
        if self.draft(role).selection_confirmed {
            return Err(DraftError::InvalidSelection(
                "selection already confirmed".to_string(),
            ));
        }

        let mut picks = dedup_factions(factions);
        picks.truncate(self.required_picks());
        let count = picks.len();
        self.draft_mut(role).selections = picks;
        self.touch();

        let events = match self.player(role.opponent()) {
            Some(opponent) => vec![Outbound::to_player(
                opponent.id.clone(),
                LobbyEvent::OpponentSelectionProgress {
                    player_id: player_id.to_string(),
                    count,
                },
            )],
            None => Vec::new(),
        };
        Ok(Effects {
            events,
            ..Effects::default()
        })
    }

    /// Confirm a player's final selection
    ///
    /// Idempotent: repeat calls after confirmation change nothing. When the
    /// second player confirms, the lobby advances to Banning.
    pub fn confirm_selection(
        &mut self,
        player_id: &str,
        factions: Vec<Faction>,
    ) -> Result<Effects, DraftError> {
        let role = self.require_role(player_id)?;
        self.require_phase(Phase::Selecting)?;
        if self.draft(role).selection_confirmed {
            return Ok(Effects::default());
        }

        let picks = dedup_factions(factions);
        let required = self.required_picks();
        if picks.len() != required {
            return Err(DraftError::InvalidSelection(format!(
                "expected {} distinct factions, got {}",
                required,
                picks.len()
            )));
        }

        let draft = self.draft_mut(role);
        draft.selections = picks;
        draft.selection_confirmed = true;
        self.touch();

        if self.host_draft.selection_confirmed && self.guest_draft.selection_confirmed {
            let (events, timer) = self.advance_to_banning();
            return Ok(Effects {
                events,
                timer,
                match_record: None,
            });
        }

        let mut events = vec![Outbound::to_player(
            player_id,
            LobbyEvent::SelectionConfirmed {
                player_id: player_id.to_string(),
            },
        )];
        if let Some(opponent) = self.player(role.opponent()) {
            events.push(Outbound::to_player(
                opponent.id.clone(),
                LobbyEvent::PlayerSelectionStatus {
                    player_id: player_id.to_string(),
                    completed: true,
                    phase: Phase::Selecting,
                },
            ));
        }
        Ok(Effects {
            events,
            ..Effects::default()
        })
    }

    /// Confirm a player's ban
    ///
    /// The target must come from the opponent's confirmed pool. When the
    /// second player confirms, both remaining pools are computed and the
    /// lobby completes.
    pub fn confirm_ban(&mut self, player_id: &str, faction: Faction) -> Result<Effects, DraftError> {
        let role = self.require_role(player_id)?;
        self.require_phase(Phase::Banning)?;
        if self.draft(role).ban_confirmed {
            return Ok(Effects::default());
        }

        let opponent_pool = &self.draft(role.opponent()).selections;
        if !opponent_pool.contains(&faction) {
            return Err(DraftError::InvalidBan(format!(
                "{faction} is not in the opponent's pool"
            )));
        }

        let draft = self.draft_mut(role);
        draft.banned_faction = Some(faction);
        draft.ban_confirmed = true;
        self.touch();

        if self.host_draft.ban_confirmed && self.guest_draft.ban_confirmed {
            self.finalize_results();
            return Ok(Effects {
                events: vec![Outbound::room(LobbyEvent::BanPhaseEnded {
                    time_expired: false,
                })],
                timer: TimerCommand::Cancel,
                match_record: None,
            });
        }

        let mut events = vec![Outbound::to_player(
            player_id,
            LobbyEvent::BanConfirmed {
                player_id: player_id.to_string(),
            },
        )];
        if let Some(opponent) = self.player(role.opponent()) {
            events.push(Outbound::to_player(
                opponent.id.clone(),
                LobbyEvent::PlayerSelectionStatus {
                    player_id: player_id.to_string(),
                    completed: true,
                    phase: Phase::Banning,
                },
            ));
        }
        Ok(Effects {
            events,
            ..Effects::default()
        })
    }

    /// Selection timer expired
    ///
    /// No-op unless still Selecting. Pads short selections from the unpicked
    /// pool in [`Faction::ALL`] order, forces both confirmations, and
    /// advances to Banning.
    pub fn handle_selection_timeout(&mut self) -> Effects {
        if self.phase != Phase::Selecting {
            return Effects::default();
        }

        let required = self.required_picks();
        for role in [Role::Host, Role::Guest] {
            let draft = self.draft_mut(role);
            if draft.selections.len() < required {
                for faction in Faction::ALL {
                    if draft.selections.len() >= required {
                        break;
                    }
                    if !draft.selections.contains(&faction) {
                        draft.selections.push(faction);
                    }
                }
            }
            draft.selection_confirmed = true;
        }
        self.touch();

        let (mut events, timer) = self.advance_to_banning();
        events.insert(0, Outbound::room(LobbyEvent::SelectionTimerExpired));
        Effects {
            events,
            timer,
            match_record: None,
        }
    }

    /// Ban timer expired
    ///
    /// No-op unless still Banning. Players without a ban get one picked
    /// uniformly at random from the opponent's pool; an empty opponent pool
    /// fails open to no ban.
    pub fn handle_ban_timeout(&mut self) -> Effects {
        if self.phase != Phase::Banning {
            return Effects::default();
        }

        let mut rng = rand::thread_rng();
        for role in [Role::Host, Role::Guest] {
            if self.draft(role).banned_faction.is_none() {
                let pool = &self.draft(role.opponent()).selections;
                match pool.choose(&mut rng).copied() {
                    Some(faction) => self.draft_mut(role).banned_faction = Some(faction),
                    None => warn!(
                        code = %self.code,
                        "ban timeout with empty opponent pool, skipping auto-ban"
                    ),
                }
            }
            self.draft_mut(role).ban_confirmed = true;
        }
        self.finalize_results();

        Effects {
            events: vec![
                Outbound::room(LobbyEvent::BanTimerExpired),
                Outbound::room(LobbyEvent::BanPhaseEnded { time_expired: true }),
            ],
            timer: TimerCommand::Cancel,
            match_record: None,
        }
    }

    /// Reset the lobby to Waiting (host only, any phase)
    ///
    /// A completed session first yields its match record so the caller can
    /// persist it before the draft fields are cleared. Players and format
    /// are preserved.
    pub fn reset(&mut self, player_id: &str) -> Result<Effects, DraftError> {
        let role = self.require_role(player_id)?;
        if role != Role::Host {
            return Err(DraftError::Unauthorized(
                "only the host can reset the lobby".to_string(),
            ));
        }

        let match_record = (self.phase == Phase::Completed).then(|| self.match_record());

        self.host_draft.clear();
        self.guest_draft.clear();
        self.phase = Phase::Waiting;
        self.touch();

        Ok(Effects {
            events: vec![Outbound::room(LobbyEvent::LobbyReset)],
            timer: TimerCommand::Cancel,
            match_record,
        })
    }

    /// Shared Selecting -> Banning transition
    fn advance_to_banning(&mut self) -> (Vec<Outbound>, TimerCommand) {
        self.host_draft.clear_ban();
        self.guest_draft.clear_ban();
        self.phase = Phase::Banning;
        (
            vec![Outbound::room(LobbyEvent::PhaseChanged {
                phase: Phase::Banning,
            })],
            TimerCommand::Arm(Phase::Banning),
        )
    }

    /// Compute both remaining pools and complete the session
    ///
    /// A player's remaining pool is their own confirmed selections minus the
    /// faction the *opponent* banned.
    fn finalize_results(&mut self) {
        let host_ban = self.guest_draft.banned_faction;
        let guest_ban = self.host_draft.banned_faction;
        self.host_draft.remaining_factions = self
            .host_draft
            .selections
            .iter()
            .copied()
            .filter(|f| Some(*f) != host_ban)
            .collect();
        self.guest_draft.remaining_factions = self
            .guest_draft
            .selections
            .iter()
            .copied()
            .filter(|f| Some(*f) != guest_ban)
            .collect();
        self.phase = Phase::Completed;
        self.touch();
    }

    /// Snapshot the finalized result for the history sink
    fn match_record(&self) -> MatchRecord {
        MatchRecord {
            code: self.code.clone(),
            host: self.host.clone(),
            guest: self.guest.clone(),
            format: self.format,
            host_factions: self.host_draft.selections.clone(),
            guest_factions: self.guest_draft.selections.clone(),
            host_banned_faction: self.host_draft.banned_faction,
            guest_banned_faction: self.guest_draft.banned_faction,
            host_remaining_factions: self.host_draft.remaining_factions.clone(),
            guest_remaining_factions: self.guest_draft.remaining_factions.clone(),
            completed_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::events::Audience;
    use crate::lobby::model::{PlayerDraft, PlayerSlot, TournamentFormat};

    const HOST: &str = "host-1";
    const GUEST: &str = "guest-1";

    fn waiting_lobby() -> Lobby {
        Lobby::new(
            "GWTEST",
            PlayerSlot::new(HOST, "Geralt"),
            TournamentFormat::ThreeRound,
        )
    }

    fn full_lobby() -> Lobby {
        let mut lobby = waiting_lobby();
        lobby.join_guest(GUEST, "Yennefer").unwrap();
        lobby
    }

    fn selecting_lobby() -> Lobby {
        let mut lobby = full_lobby();
        lobby.start_selection(HOST).unwrap();
        lobby
    }

    fn banning_lobby() -> Lobby {
        let mut lobby = selecting_lobby();
        lobby
            .confirm_selection(
                HOST,
                vec![Faction::Monsters, Faction::Skellige, Faction::Syndicate],
            )
            .unwrap();
        lobby
            .confirm_selection(
                GUEST,
                vec![Faction::Nilfgaard, Faction::Northern, Faction::Scoiatael],
            )
            .unwrap();
        lobby
    }

    fn event_types(effects: &Effects) -> Vec<&'static str> {
        effects
            .events
            .iter()
            .map(|o| match &o.event {
                LobbyEvent::PlayerJoined { .. } => "player-joined",
                LobbyEvent::FactionSelectionStarted => "faction-selection-started",
                LobbyEvent::OpponentSelectionProgress { .. } => "opponent-selection-progress",
                LobbyEvent::SelectionConfirmed { .. } => "selection-confirmed",
                LobbyEvent::PlayerSelectionStatus { .. } => "player-selection-status",
                LobbyEvent::PhaseChanged { .. } => "phase-changed",
                LobbyEvent::BanConfirmed { .. } => "ban-confirmed",
                LobbyEvent::BanPhaseEnded { .. } => "ban-phase-ended",
                LobbyEvent::SelectionTimerExpired => "selection-timer-expired",
                LobbyEvent::BanTimerExpired => "ban-timer-expired",
                LobbyEvent::LobbyReset => "lobby-reset",
                LobbyEvent::PlayerReconnected { .. } => "player-reconnected",
                LobbyEvent::PlayerDisconnected { .. } => "player-disconnected",
            })
            .collect()
    }

    // ==================== Join Tests ====================

    #[test]
    fn join_binds_guest_and_announces() {
        let mut lobby = waiting_lobby();
        let effects = lobby.join_guest(GUEST, "Yennefer").unwrap();

        assert!(lobby.is_full());
        assert_eq!(lobby.guest.as_ref().unwrap().id, GUEST);
        assert_eq!(event_types(&effects), vec!["player-joined"]);
        assert_eq!(effects.timer, TimerCommand::Keep);
    }

    #[test]
    fn rejoin_is_noop_success() {
        let mut lobby = full_lobby();
        let before = lobby.clone();

        let effects = lobby.join_guest(GUEST, "Yennefer").unwrap();
        assert_eq!(event_types(&effects), vec!["player-joined"]);
        assert_eq!(lobby.guest, before.guest);

        let effects = lobby.join_guest(HOST, "Geralt").unwrap();
        assert_eq!(event_types(&effects), vec!["player-joined"]);
        assert_eq!(lobby.host, before.host);
    }

    #[test]
    fn third_player_join_rejected_with_slot_occupied() {
        // Scenario E
        let mut lobby = full_lobby();
        let before = lobby.clone();

        let result = lobby.join_guest("intruder", "Eredin");
        assert_eq!(result.unwrap_err(), DraftError::SlotOccupied);
        assert_eq!(lobby.guest, before.guest);
        assert_eq!(lobby.guest_draft, before.guest_draft);
    }

    #[test]
    fn guest_cannot_join_after_waiting_phase() {
        let mut lobby = selecting_lobby();
        lobby.guest = None;

        let result = lobby.join_guest("latecomer", "Ciri");
        assert!(matches!(
            result,
            Err(DraftError::InvalidPhase {
                expected: Phase::Waiting,
                ..
            })
        ));
    }

    // ==================== StartSelection Tests ====================

    #[test]
    fn start_selection_advances_phase_and_arms_timer() {
        let mut lobby = full_lobby();
        let effects = lobby.start_selection(HOST).unwrap();

        assert_eq!(lobby.phase, Phase::Selecting);
        assert_eq!(effects.timer, TimerCommand::Arm(Phase::Selecting));
        assert_eq!(event_types(&effects), vec!["faction-selection-started"]);
    }

    #[test]
    fn start_selection_rejects_guest() {
        let mut lobby = full_lobby();
        let result = lobby.start_selection(GUEST);
        assert!(matches!(result, Err(DraftError::Unauthorized(_))));
        assert_eq!(lobby.phase, Phase::Waiting);
    }

    #[test]
    fn start_selection_requires_full_lobby() {
        let mut lobby = waiting_lobby();
        let result = lobby.start_selection(HOST);
        assert_eq!(result.unwrap_err(), DraftError::LobbyNotFull);
    }

    #[test]
    fn start_selection_requires_waiting_phase() {
        let mut lobby = selecting_lobby();
        let result = lobby.start_selection(HOST);
        assert!(matches!(result, Err(DraftError::InvalidPhase { .. })));
    }

    // ==================== RecordProgress Tests ====================

    #[test]
    fn record_progress_sends_count_only_to_opponent() {
        let mut lobby = selecting_lobby();
        let effects = lobby
            .record_progress(HOST, vec![Faction::Monsters, Faction::Skellige])
            .unwrap();

        assert_eq!(effects.events.len(), 1);
        let outbound = &effects.events[0];
        assert_eq!(outbound.audience, Audience::Player(GUEST.to_string()));
        match &outbound.event {
            LobbyEvent::OpponentSelectionProgress { player_id, count } => {
                assert_eq!(player_id, HOST);
                assert_eq!(*count, 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn record_progress_replaces_previous_set() {
        let mut lobby = selecting_lobby();
        lobby
            .record_progress(HOST, vec![Faction::Monsters, Faction::Skellige])
            .unwrap();
        lobby.record_progress(HOST, vec![Faction::Nilfgaard]).unwrap();

        assert_eq!(lobby.host_draft.selections, vec![Faction::Nilfgaard]);
    }

    #[test]
    fn record_progress_clamps_to_required_picks() {
        let mut lobby = selecting_lobby();
        lobby
            .record_progress(HOST, Faction::ALL.to_vec())
            .unwrap();
        assert_eq!(lobby.host_draft.selections.len(), 3);
    }

    #[test]
    fn record_progress_dedups_payload() {
        let mut lobby = selecting_lobby();
        lobby
            .record_progress(
                HOST,
                vec![Faction::Monsters, Faction::Monsters, Faction::Skellige],
            )
            .unwrap();
        assert_eq!(
            lobby.host_draft.selections,
            vec![Faction::Monsters, Faction::Skellige]
        );
    }

    #[test]
    fn record_progress_rejected_after_confirmation() {
        let mut lobby = selecting_lobby();
        lobby
            .confirm_selection(
                HOST,
                vec![Faction::Monsters, Faction::Skellige, Faction::Syndicate],
            )
            .unwrap();

        let result = lobby.record_progress(HOST, vec![Faction::Nilfgaard]);
        assert!(matches!(result, Err(DraftError::InvalidSelection(_))));
        assert_eq!(lobby.host_draft.selections.len(), 3);
    }

    #[test]
    fn record_progress_rejected_outside_selecting() {
        let mut lobby = full_lobby();
        let result = lobby.record_progress(HOST, vec![Faction::Monsters]);
        assert!(matches!(result, Err(DraftError::InvalidPhase { .. })));
    }

    // ==================== ConfirmSelection Tests ====================

    #[test]
    fn both_confirmations_advance_to_banning() {
        // Scenario A
        let mut lobby = selecting_lobby();
        let effects = lobby
            .confirm_selection(
                HOST,
                vec![Faction::Monsters, Faction::Skellige, Faction::Syndicate],
            )
            .unwrap();
        assert_eq!(lobby.phase, Phase::Selecting);
        assert_eq!(
            event_types(&effects),
            vec!["selection-confirmed", "player-selection-status"]
        );

        let effects = lobby
            .confirm_selection(
                GUEST,
                vec![Faction::Nilfgaard, Faction::Northern, Faction::Scoiatael],
            )
            .unwrap();
        assert_eq!(lobby.phase, Phase::Banning);
        assert_eq!(event_types(&effects), vec!["phase-changed"]);
        assert_eq!(effects.timer, TimerCommand::Arm(Phase::Banning));
    }

    #[test]
    fn confirm_selection_rejects_wrong_count() {
        let mut lobby = selecting_lobby();
        let result = lobby.confirm_selection(HOST, vec![Faction::Monsters]);
        assert!(matches!(result, Err(DraftError::InvalidSelection(_))));
        assert!(!lobby.host_draft.selection_confirmed);
    }

    #[test]
    fn confirm_selection_rejects_duplicates() {
        let mut lobby = selecting_lobby();
        let result = lobby.confirm_selection(
            HOST,
            vec![Faction::Monsters, Faction::Monsters, Faction::Skellige],
        );
        assert!(matches!(result, Err(DraftError::InvalidSelection(_))));
    }

    #[test]
    fn confirm_selection_is_idempotent() {
        let mut lobby = selecting_lobby();
        lobby
            .confirm_selection(
                HOST,
                vec![Faction::Monsters, Faction::Skellige, Faction::Syndicate],
            )
            .unwrap();
        let snapshot = lobby.host_draft.clone();

        // Repeat with a different payload: ignored entirely
        let effects = lobby
            .confirm_selection(
                HOST,
                vec![Faction::Nilfgaard, Faction::Northern, Faction::Scoiatael],
            )
            .unwrap();
        assert!(effects.is_noop());
        assert_eq!(lobby.host_draft, snapshot);
    }

    #[test]
    fn confirmed_selections_have_exact_required_size() {
        let lobby = banning_lobby();
        assert_eq!(lobby.host_draft.selections.len(), 3);
        assert_eq!(lobby.guest_draft.selections.len(), 3);

        // Also after a timeout-driven confirm
        let mut lobby2 = selecting_lobby();
        lobby2.record_progress(HOST, vec![Faction::Monsters]).unwrap();
        lobby2.handle_selection_timeout();
        assert_eq!(lobby2.host_draft.selections.len(), 3);
        assert_eq!(lobby2.guest_draft.selections.len(), 3);
    }

    // ==================== ConfirmBan Tests ====================

    #[test]
    fn both_bans_complete_the_session() {
        // Scenario B
        let mut lobby = banning_lobby();

        let effects = lobby.confirm_ban(HOST, Faction::Nilfgaard).unwrap();
        assert_eq!(lobby.phase, Phase::Banning);
        assert_eq!(
            event_types(&effects),
            vec!["ban-confirmed", "player-selection-status"]
        );

        let effects = lobby.confirm_ban(GUEST, Faction::Monsters).unwrap();
        assert_eq!(lobby.phase, Phase::Completed);
        assert_eq!(event_types(&effects), vec!["ban-phase-ended"]);
        assert_eq!(effects.timer, TimerCommand::Cancel);

        assert_eq!(
            lobby.host_draft.remaining_factions,
            vec![Faction::Skellige, Faction::Syndicate]
        );
        assert_eq!(
            lobby.guest_draft.remaining_factions,
            vec![Faction::Northern, Faction::Scoiatael]
        );
    }

    #[test]
    fn ban_from_own_pool_rejected() {
        // Scenario D
        let mut lobby = banning_lobby();
        let before = lobby.clone();

        // Scoiatael is in the guest's own pool, not the host's
        let result = lobby.confirm_ban(GUEST, Faction::Scoiatael);
        assert!(matches!(result, Err(DraftError::InvalidBan(_))));
        assert_eq!(lobby.phase, Phase::Banning);
        assert_eq!(lobby.guest_draft, before.guest_draft);
    }

    #[test]
    fn ban_outside_banning_phase_rejected() {
        let mut lobby = selecting_lobby();
        let result = lobby.confirm_ban(HOST, Faction::Monsters);
        assert!(matches!(
            result,
            Err(DraftError::InvalidPhase {
                expected: Phase::Banning,
                ..
            })
        ));
    }

    #[test]
    fn confirm_ban_is_idempotent() {
        let mut lobby = banning_lobby();
        lobby.confirm_ban(HOST, Faction::Nilfgaard).unwrap();
        let snapshot = lobby.host_draft.clone();

        let effects = lobby.confirm_ban(HOST, Faction::Northern).unwrap();
        assert!(effects.is_noop());
        assert_eq!(lobby.host_draft, snapshot);
    }

    #[test]
    fn remaining_size_is_required_minus_one_when_ban_lands() {
        let mut lobby = banning_lobby();
        lobby.confirm_ban(HOST, Faction::Nilfgaard).unwrap();
        lobby.confirm_ban(GUEST, Faction::Monsters).unwrap();

        let required = lobby.required_picks();
        assert_eq!(lobby.host_draft.remaining_factions.len(), required - 1);
        assert_eq!(lobby.guest_draft.remaining_factions.len(), required - 1);
    }

    // ==================== Timeout Tests ====================

    #[test]
    fn selection_timeout_pads_and_advances() {
        // Scenario C
        let mut lobby = selecting_lobby();
        lobby.record_progress(HOST, vec![Faction::Monsters]).unwrap();

        let effects = lobby.handle_selection_timeout();

        assert_eq!(lobby.phase, Phase::Banning);
        assert_eq!(lobby.host_draft.selections.len(), 3);
        assert!(lobby.host_draft.selections.contains(&Faction::Monsters));
        assert!(lobby.host_draft.selection_confirmed);
        assert!(lobby.guest_draft.selection_confirmed);
        assert_eq!(
            event_types(&effects),
            vec!["selection-timer-expired", "phase-changed"]
        );
        assert_eq!(effects.timer, TimerCommand::Arm(Phase::Banning));
    }

    #[test]
    fn selection_timeout_keeps_already_confirmed_selections() {
        let mut lobby = selecting_lobby();
        lobby
            .confirm_selection(
                HOST,
                vec![Faction::Syndicate, Faction::Skellige, Faction::Scoiatael],
            )
            .unwrap();

        lobby.handle_selection_timeout();
        assert_eq!(
            lobby.host_draft.selections,
            vec![Faction::Syndicate, Faction::Skellige, Faction::Scoiatael]
        );
    }

    #[test]
    fn selection_timeout_after_phase_advanced_is_noop() {
        let mut lobby = banning_lobby();
        let before = lobby.clone();

        let effects = lobby.handle_selection_timeout();
        assert!(effects.is_noop());
        assert_eq!(lobby, before);
    }

    #[test]
    fn ban_timeout_auto_bans_from_opponent_pool() {
        let mut lobby = banning_lobby();
        let effects = lobby.handle_ban_timeout();

        assert_eq!(lobby.phase, Phase::Completed);
        let host_ban = lobby.host_draft.banned_faction.unwrap();
        let guest_ban = lobby.guest_draft.banned_faction.unwrap();
        assert!(lobby.guest_draft.selections.contains(&host_ban));
        assert!(lobby.host_draft.selections.contains(&guest_ban));
        assert_eq!(
            event_types(&effects),
            vec!["ban-timer-expired", "ban-phase-ended"]
        );
        match &effects.events[1].event {
            LobbyEvent::BanPhaseEnded { time_expired } => assert!(*time_expired),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn ban_timeout_keeps_manual_ban() {
        let mut lobby = banning_lobby();
        lobby.confirm_ban(HOST, Faction::Northern).unwrap();

        lobby.handle_ban_timeout();
        assert_eq!(lobby.host_draft.banned_faction, Some(Faction::Northern));
        assert_eq!(lobby.phase, Phase::Completed);
    }

    #[test]
    fn ban_timeout_after_completion_is_noop() {
        let mut lobby = banning_lobby();
        lobby.confirm_ban(HOST, Faction::Nilfgaard).unwrap();
        lobby.confirm_ban(GUEST, Faction::Monsters).unwrap();
        assert_eq!(lobby.phase, Phase::Completed);
        let before = lobby.clone();

        let effects = lobby.handle_ban_timeout();
        assert!(effects.is_noop());
        assert_eq!(lobby, before);
    }

    #[test]
    fn ban_timeout_with_empty_opponent_pool_fails_open() {
        let mut lobby = banning_lobby();
        lobby.guest_draft.selections.clear();

        lobby.handle_ban_timeout();
        assert_eq!(lobby.phase, Phase::Completed);
        assert!(lobby.host_draft.banned_faction.is_none());
        // Host keeps the full pool since no ban landed on it
        assert_eq!(
            lobby.host_draft.remaining_factions.len(),
            lobby.host_draft.selections.len()
        );
    }

    // ==================== Reset Tests ====================

    #[test]
    fn reset_preserves_players_and_format_clears_draft() {
        let mut lobby = banning_lobby();
        lobby.confirm_ban(HOST, Faction::Nilfgaard).unwrap();
        lobby.confirm_ban(GUEST, Faction::Monsters).unwrap();

        let effects = lobby.reset(HOST).unwrap();

        assert_eq!(lobby.phase, Phase::Waiting);
        assert_eq!(lobby.host.id, HOST);
        assert_eq!(lobby.guest.as_ref().unwrap().id, GUEST);
        assert_eq!(lobby.format, TournamentFormat::ThreeRound);
        assert_eq!(lobby.host_draft, PlayerDraft::default());
        assert_eq!(lobby.guest_draft, PlayerDraft::default());
        assert_eq!(effects.timer, TimerCommand::Cancel);
        assert_eq!(event_types(&effects), vec!["lobby-reset"]);
    }

    #[test]
    fn reset_from_completed_yields_match_record() {
        let mut lobby = banning_lobby();
        lobby.confirm_ban(HOST, Faction::Nilfgaard).unwrap();
        lobby.confirm_ban(GUEST, Faction::Monsters).unwrap();

        let effects = lobby.reset(HOST).unwrap();
        let record = effects.match_record.expect("completed reset keeps history");

        assert_eq!(record.code, "GWTEST");
        assert_eq!(record.host_banned_faction, Some(Faction::Nilfgaard));
        assert_eq!(record.guest_banned_faction, Some(Faction::Monsters));
        assert_eq!(
            record.host_remaining_factions,
            vec![Faction::Skellige, Faction::Syndicate]
        );
        assert_eq!(
            record.guest_remaining_factions,
            vec![Faction::Northern, Faction::Scoiatael]
        );
    }

    #[test]
    fn reset_mid_draft_yields_no_record() {
        let mut lobby = selecting_lobby();
        let effects = lobby.reset(HOST).unwrap();
        assert!(effects.match_record.is_none());
        assert_eq!(lobby.phase, Phase::Waiting);
    }

    #[test]
    fn reset_rejects_guest() {
        let mut lobby = banning_lobby();
        let result = lobby.reset(GUEST);
        assert!(matches!(result, Err(DraftError::Unauthorized(_))));
        assert_eq!(lobby.phase, Phase::Banning);
    }

    // ==================== Phase Ordering Tests ====================

    #[test]
    fn phase_never_moves_backward() {
        let mut lobby = banning_lobby();

        // No operation can take Banning back to Selecting
        assert!(lobby.start_selection(HOST).is_err());
        assert!(lobby.record_progress(HOST, vec![Faction::Monsters]).is_err());
        assert!(lobby
            .confirm_selection(
                HOST,
                vec![Faction::Monsters, Faction::Skellige, Faction::Syndicate]
            )
            .is_err());
        assert_eq!(lobby.phase, Phase::Banning);
    }

    #[test]
    fn five_round_format_requires_four_picks() {
        let mut lobby = Lobby::new(
            "GWFIVE",
            PlayerSlot::new(HOST, "Geralt"),
            TournamentFormat::FiveRound,
        );
        lobby.join_guest(GUEST, "Yennefer").unwrap();
        lobby.start_selection(HOST).unwrap();

        let result = lobby.confirm_selection(
            HOST,
            vec![Faction::Monsters, Faction::Skellige, Faction::Syndicate],
        );
        assert!(matches!(result, Err(DraftError::InvalidSelection(_))));

        lobby
            .confirm_selection(
                HOST,
                vec![
                    Faction::Monsters,
                    Faction::Skellige,
                    Faction::Syndicate,
                    Faction::Northern,
                ],
            )
            .unwrap();
        assert!(lobby.host_draft.selection_confirmed);
    }
}
