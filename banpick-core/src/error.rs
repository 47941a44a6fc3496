//! Error types for banpick-core

use thiserror::Error;

use crate::lobby::model::Phase;

/// Top-level error type for banpick-core
#[derive(Error, Debug)]
pub enum BanpickError {
    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// Errors raised by the draft state machine
///
/// Every operation validates before it mutates, so a `DraftError` always
/// leaves the lobby unchanged.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DraftError {
    #[error("guest slot is already taken by another player")]
    SlotOccupied,

    #[error("action requires phase {expected}, lobby is in {actual}")]
    InvalidPhase { expected: Phase, actual: Phase },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("invalid ban: {0}")]
    InvalidBan(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("player {0} is not part of this lobby")]
    UnknownPlayer(String),

    #[error("both players must join before this action")]
    LobbyNotFull,
}

/// Errors from the session store
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("lobby not found: {0}")]
    NotFound(String),

    #[error("lobby code already in use: {0}")]
    DuplicateCode(String),

    #[error("could not allocate a unique lobby code")]
    CodeExhaustion,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from the match history sink
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HistoryError {
    #[error("failed to append match record: {0}")]
    AppendFailed(String),
}
