//! REST API handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use banpick_core::{
    BanpickError, DraftError, Lobby, PlayerSlot, SessionStore, StoreError, TournamentFormat,
    create_with_unique_code, normalize_code,
};
use serde::{Deserialize, Serialize};

use crate::gateway;
use crate::state::AppState;
use crate::ws::protocol::LobbySnapshot;

/// Body for creating a lobby
#[derive(Debug, Deserialize)]
pub struct CreateLobbyRequest {
    pub host_id: String,
    pub host_name: String,
    /// Defaults to bo3
    #[serde(default)]
    pub format: Option<TournamentFormat>,
    /// Caller-supplied code; generated when absent
    #[serde(default)]
    pub code: Option<String>,
}

/// Body for joining a lobby
#[derive(Debug, Deserialize)]
pub struct JoinLobbyRequest {
    pub player_id: String,
    pub player_name: String,
}

/// Error payload shared by all REST handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn error_response(error: BanpickError) -> ApiError {
    let status = match &error {
        BanpickError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        BanpickError::Store(StoreError::DuplicateCode(_)) => StatusCode::CONFLICT,
        BanpickError::Store(StoreError::CodeExhaustion) => StatusCode::SERVICE_UNAVAILABLE,
        BanpickError::Store(StoreError::Backend(_)) | BanpickError::History(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        BanpickError::Draft(DraftError::SlotOccupied) => StatusCode::CONFLICT,
        BanpickError::Draft(DraftError::Unauthorized(_)) => StatusCode::FORBIDDEN,
        BanpickError::Draft(_) => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            message: error.to_string(),
            code: gateway::error_code(&error).to_string(),
        }),
    )
}

/// POST /api/lobbies - create a lobby
pub async fn create_lobby(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateLobbyRequest>,
) -> Result<(StatusCode, Json<LobbySnapshot>), ApiError> {
    let format = body.format.unwrap_or_default();
    let host = PlayerSlot::new(body.host_id, body.host_name);

    let lobby = match body.code {
        Some(code) => {
            let lobby = Lobby::new(normalize_code(&code), host, format);
            state
                .store
                .create(lobby.clone())
                .await
                .map_err(|e| error_response(e.into()))?;
            lobby
        }
        None => create_with_unique_code(state.store.as_ref(), |code| {
            Lobby::new(code, host.clone(), format)
        })
        .await
        .map_err(|e| error_response(e.into()))?,
    };

    tracing::info!(code = %lobby.code, "lobby created");
    Ok((StatusCode::CREATED, Json(LobbySnapshot::sanitized(&lobby))))
}

/// GET /api/lobbies/:code - fetch a sanitized lobby snapshot
pub async fn get_lobby(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<LobbySnapshot>, ApiError> {
    let lobby = state
        .store
        .get(&code)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(LobbySnapshot::sanitized(&lobby)))
}

/// POST /api/lobbies/:code/join - bind the guest slot
///
/// Rejoining with an id already bound to a slot succeeds without changes,
/// so a reconnecting client can always re-enter through this endpoint.
pub async fn join_lobby(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(body): Json<JoinLobbyRequest>,
) -> Result<Json<LobbySnapshot>, ApiError> {
    gateway::apply(&state, &code, true, |lobby| {
        lobby.join_guest(&body.player_id, &body.player_name)
    })
    .await
    .map_err(error_response)?;

    let lobby = state
        .store
        .get(&code)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(LobbySnapshot::sanitized(&lobby)))
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub active_lobbies: usize,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let active_lobbies = state.store.count().await.unwrap_or(0);
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        active_lobbies,
    })
}
