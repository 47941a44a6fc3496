//! Operator endpoints
//!
//! Guarded by a static API key from the server config; with no key
//! configured the endpoints are disabled outright.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use banpick_core::SessionStore;
use serde::{Deserialize, Serialize};

use super::api::{ApiError, ErrorResponse, error_response};
use crate::gateway;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminKeyQuery {
    pub key: Option<String>,
}

fn authorize(state: &AppState, query: &AdminKeyQuery) -> Result<(), ApiError> {
    let reject = |message: &str| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                message: message.to_string(),
                code: "unauthorized".to_string(),
            }),
        )
    };
    match &state.admin_key {
        Some(expected) if query.key.as_deref() == Some(expected.as_str()) => Ok(()),
        Some(_) => Err(reject("unauthorized")),
        None => Err(reject("admin API disabled")),
    }
}

/// Basic usage statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub active_lobbies: usize,
    /// Lobby counts keyed by phase wire string
    pub status_breakdown: HashMap<String, usize>,
    pub uptime_seconds: i64,
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminKeyQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    authorize(&state, &query)?;

    let active_lobbies = state
        .store
        .count()
        .await
        .map_err(|e| error_response(e.into()))?;
    let by_phase = state
        .store
        .count_by_phase()
        .await
        .map_err(|e| error_response(e.into()))?;

    Ok(Json(StatsResponse {
        active_lobbies,
        status_breakdown: by_phase
            .into_iter()
            .map(|(phase, count)| (phase.as_str().to_string(), count))
            .collect(),
        uptime_seconds: state.uptime_seconds(),
    }))
}

/// Result of an on-demand expiry sweep
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub removed: usize,
}

/// POST /api/admin/cleanup - sweep expired lobbies now
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminKeyQuery>,
) -> Result<Json<CleanupResponse>, ApiError> {
    authorize(&state, &query)?;

    let removed = gateway::sweep_expired_sessions(&state)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(CleanupResponse { removed }))
}
