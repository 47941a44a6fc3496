//! banpick-core: domain model and draft coordination for banpick
//!
//! This crate provides the server-authoritative pieces of the two-player
//! draft flow:
//!
//! - **Lobby model & state machine** - [`Lobby`] and its operations, taking a
//!   session through Waiting -> Selecting -> Banning -> Completed
//! - **Session storage** - [`SessionStore`] trait and [`MemorySessionStore`]
//!   with inactivity-based expiry
//! - **Phase timers** - [`PhaseTimers`] countdowns that feed timeouts back
//!   into the same dispatch path as client actions
//! - **Match history** - [`MatchHistory`] append-only sink for finalized
//!   results

pub mod error;
pub mod faction;
pub mod history;
pub mod lobby;
pub mod store;
pub mod timer;

// Re-export key types for convenience
pub use error::{BanpickError, DraftError, HistoryError, StoreError};
pub use faction::Faction;
pub use history::{MatchHistory, MatchRecord, MemoryMatchHistory};
pub use lobby::code::{create_with_unique_code, generate_code, normalize_code};
pub use lobby::events::{Audience, LobbyEvent, Outbound};
pub use lobby::machine::{Effects, TimerCommand};
pub use lobby::model::{Lobby, Phase, PlayerDraft, PlayerSlot, Role, TournamentFormat};
pub use store::{MemorySessionStore, SessionStore};
pub use timer::{BAN_TIMER, PhaseTimers, SELECTION_TIMER, TimerExpiry};
