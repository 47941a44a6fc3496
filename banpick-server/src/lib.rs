//! banpick-server - HTTP and WebSocket server for banpick draft lobbies
//!
//! This crate owns the session gateway: it binds the REST boundary, the
//! per-lobby WebSocket rooms, the phase-timer consumer, and the expiry
//! sweeper around the state machine in banpick-core.

mod error;
pub mod gateway;
pub mod http;
mod state;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

pub use error::ServerError;
pub use http::create_router;
pub use state::{AppState, DEFAULT_MAX_SESSION_AGE};

/// Default sweep cadence for expired lobbies (hourly)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// API key for the admin endpoints; None disables them
    pub admin_key: Option<String>,
    pub sweep_interval: Duration,
    pub max_session_age: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7643,
            admin_key: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_session_age: DEFAULT_MAX_SESSION_AGE,
        }
    }
}

impl ServerConfig {
    /// The address to bind to
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The main banpick server
pub struct BanpickServer {
    config: ServerConfig,
    state: Arc<AppState>,
    timer_rx: tokio::sync::mpsc::UnboundedReceiver<banpick_core::TimerExpiry>,
}

impl BanpickServer {
    /// Create a new server with in-memory backends
    pub fn new(config: ServerConfig) -> Self {
        let (state, timer_rx) = AppState::new(config.admin_key.clone(), config.max_session_age);
        Self {
            config,
            state: Arc::new(state),
            timer_rx,
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let Self {
            config,
            state,
            mut timer_rx,
        } = self;

        let addr = config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("banpick server listening on {}", addr);

        // Timer expiries re-enter the gateway as synthetic actions
        {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                while let Some(expiry) = timer_rx.recv().await {
                    gateway::handle_timer_expiry(&state, expiry).await;
                }
            });
        }

        // Hourly sweep of lobbies idle past the configured window
        {
            let state = Arc::clone(&state);
            let interval = config.sweep_interval;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // The first tick completes immediately
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if let Err(e) = gateway::sweep_expired_sessions(&state).await {
                        tracing::error!(error = %e, "expiry sweep failed");
                    }
                }
            });
        }

        let router = create_router(state);
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
