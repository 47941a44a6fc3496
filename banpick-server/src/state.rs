//! Shared application state for the banpick server

use std::sync::Arc;
use std::time::Duration;

use banpick_core::{
    MatchHistory, MemoryMatchHistory, MemorySessionStore, PhaseTimers, SessionStore, TimerExpiry,
};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::ws::rooms::Rooms;

/// Default inactivity window before a lobby expires (2 hours)
pub const DEFAULT_MAX_SESSION_AGE: Duration = Duration::from_secs(2 * 60 * 60);

/// Shared application state accessible by all handlers
pub struct AppState {
    /// Session storage, behind the trait so backends can be swapped
    pub store: Arc<dyn SessionStore>,
    /// Append-only sink for finalized matches
    pub history: Arc<dyn MatchHistory>,
    /// Per-lobby phase countdowns
    pub timers: PhaseTimers,
    /// Per-lobby broadcast rooms
    pub rooms: Rooms,
    /// API key protecting the admin endpoints; None disables them
    pub admin_key: Option<String>,
    /// Inactivity window used by the expiry sweep
    pub max_session_age: Duration,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state with in-memory backends
    ///
    /// Also returns the receiving end of the timer-expiry channel, which the
    /// server drains into the gateway.
    pub fn new(
        admin_key: Option<String>,
        max_session_age: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<TimerExpiry>) {
        Self::with_components(
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryMatchHistory::new()),
            admin_key,
            max_session_age,
        )
    }

    /// Create state with custom backends (for testing)
    pub fn with_components(
        store: Arc<dyn SessionStore>,
        history: Arc<dyn MatchHistory>,
        admin_key: Option<String>,
        max_session_age: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<TimerExpiry>) {
        let (timers, timer_rx) = PhaseTimers::new();
        (
            Self {
                store,
                history,
                timers,
                rooms: Rooms::new(),
                admin_key,
                max_session_age,
                started_at: Utc::now(),
            },
            timer_rx,
        )
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
