//! Action dispatch
//!
//! Every mutating path — client actions and timer expiries alike — goes
//! through [`apply`]: load the session, run one state-machine operation,
//! persist, then carry out the returned effects (timer commands, history
//! append, broadcasts). Rejected operations leave the store untouched and
//! broadcast nothing.

use banpick_core::{
    Audience, BanpickError, DraftError, Effects, Lobby, MatchHistory, Phase, SessionStore,
    StoreError, TimerCommand, TimerExpiry, normalize_code,
};
use tracing::{debug, error, warn};

use crate::state::AppState;
use crate::ws::protocol::{LobbySnapshot, ServerMessage, lobby_event_to_server_message};

/// Attempts before a transient store failure is surfaced to the caller
const STORE_RETRY_ATTEMPTS: usize = 3;

async fn get_with_retry(state: &AppState, code: &str) -> Result<Lobby, StoreError> {
    let mut attempt = 0;
    loop {
        match state.store.get(code).await {
            Err(StoreError::Backend(reason)) if attempt + 1 < STORE_RETRY_ATTEMPTS => {
                attempt += 1;
                warn!(code, attempt, %reason, "transient store failure on read, retrying");
            }
            other => return other,
        }
    }
}

async fn save_with_retry(state: &AppState, lobby: &Lobby) -> Result<(), StoreError> {
    let mut attempt = 0;
    loop {
        match state.store.save(lobby.clone()).await {
            Err(StoreError::Backend(reason)) if attempt + 1 < STORE_RETRY_ATTEMPTS => {
                attempt += 1;
                warn!(
                    code = %lobby.code,
                    attempt,
                    %reason,
                    "transient store failure on write, retrying"
                );
            }
            other => return other,
        }
    }
}

/// Run one state-machine operation against a stored lobby
///
/// `publish_snapshot` controls whether a `lobby-update` follows the
/// operation's own events; progress saves keep it off so the room only ever
/// sees the count-only progress event.
pub async fn apply<F>(
    state: &AppState,
    code: &str,
    publish_snapshot: bool,
    op: F,
) -> Result<(), BanpickError>
where
    F: FnOnce(&mut Lobby) -> Result<Effects, DraftError>,
{
    let code = normalize_code(code);
    let mut lobby = get_with_retry(state, &code).await?;
    let effects = op(&mut lobby)?;
    if effects.is_noop() {
        return Ok(());
    }
    save_with_retry(state, &lobby).await?;
    run_effects(state, &code, &lobby, effects, publish_snapshot).await;
    Ok(())
}

async fn run_effects(
    state: &AppState,
    code: &str,
    lobby: &Lobby,
    effects: Effects,
    publish_snapshot: bool,
) {
    // Timers settle before any event leaves, so a stale countdown can never
    // fire after the room has been told the phase moved on
    match effects.timer {
        TimerCommand::Keep => {}
        TimerCommand::Arm(phase) => state.timers.arm(code, phase).await,
        TimerCommand::Cancel => state.timers.cancel(code).await,
    }

    if let Some(record) = effects.match_record {
        if let Err(e) = state.history.append(record).await {
            error!(code, error = %e, "failed to append match record");
        }
    }

    for outbound in effects.events {
        state
            .rooms
            .publish(
                code,
                outbound.audience,
                lobby_event_to_server_message(&outbound.event),
            )
            .await;
    }

    if publish_snapshot {
        state
            .rooms
            .publish(
                code,
                Audience::Room,
                ServerMessage::LobbyUpdate {
                    lobby: LobbySnapshot::sanitized(lobby),
                },
            )
            .await;
    }
}

/// Timer expiry entry point; re-enters [`apply`] as a synthetic action
pub async fn handle_timer_expiry(state: &AppState, expiry: TimerExpiry) {
    let result = apply(state, &expiry.code, true, |lobby| {
        Ok(match expiry.phase {
            Phase::Selecting => lobby.handle_selection_timeout(),
            Phase::Banning => lobby.handle_ban_timeout(),
            // Only draft phases have countdowns
            Phase::Waiting | Phase::Completed => Effects::default(),
        })
    })
    .await;

    match result {
        Ok(()) => {}
        Err(BanpickError::Store(StoreError::NotFound(code))) => {
            debug!(code, "timer fired for a removed lobby, ignoring");
        }
        Err(e) => {
            error!(code = %expiry.code, error = %e, "timeout handling failed");
        }
    }
}

/// Remove expired lobbies and cancel their pending timers
pub async fn sweep_expired_sessions(state: &AppState) -> Result<usize, StoreError> {
    let removed = state.store.sweep_expired(state.max_session_age).await?;
    for code in &removed {
        state.timers.cancel(code).await;
    }
    if !removed.is_empty() {
        tracing::info!(count = removed.len(), "removed expired lobbies");
    }
    Ok(removed.len())
}

/// Wire error code surfaced alongside the human-readable message
pub fn error_code(error: &BanpickError) -> &'static str {
    match error {
        BanpickError::Draft(DraftError::SlotOccupied) => "slot-occupied",
        BanpickError::Draft(DraftError::InvalidPhase { .. }) => "invalid-phase",
        BanpickError::Draft(DraftError::InvalidSelection(_)) => "invalid-selection",
        BanpickError::Draft(DraftError::InvalidBan(_)) => "invalid-ban",
        BanpickError::Draft(DraftError::Unauthorized(_)) => "unauthorized",
        BanpickError::Draft(DraftError::UnknownPlayer(_)) => "unknown-player",
        BanpickError::Draft(DraftError::LobbyNotFull) => "lobby-not-full",
        BanpickError::Store(StoreError::NotFound(_)) => "not-found",
        BanpickError::Store(StoreError::DuplicateCode(_)) => "duplicate-code",
        BanpickError::Store(StoreError::CodeExhaustion) => "code-exhaustion",
        BanpickError::Store(StoreError::Backend(_)) => "storage",
        BanpickError::History(_) => "internal",
    }
}
