//! HTTP server module

mod admin;
mod api;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use crate::ws::connection::ws_handler;

pub use admin::{CleanupResponse, StatsResponse};
pub use api::{CreateLobbyRequest, ErrorResponse, HealthResponse, JoinLobbyRequest};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/lobbies", post(api::create_lobby))
        .route("/api/lobbies/:code", get(api::get_lobby))
        .route("/api/lobbies/:code/join", post(api::join_lobby))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/cleanup", post(admin::cleanup))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
