//! banpick serve command
//!
//! Runs the lobby server: REST API, WebSocket gateway, phase timers, and
//! the hourly expiry sweep.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::info;

use banpick_server::{BanpickServer, ServerConfig};

/// Default port for the banpick server
pub const DEFAULT_PORT: u16 = 7643;
/// Default host for the banpick server
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// API key for the admin endpoints (disabled when omitted)
    #[arg(long)]
    pub admin_key: Option<String>,

    /// Seconds between expiry sweeps
    #[arg(long, default_value_t = 3600)]
    pub sweep_interval_secs: u64,

    /// Seconds of inactivity before a lobby expires
    #[arg(long, default_value_t = 7200)]
    pub max_session_age_secs: u64,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        admin_key: args.admin_key,
        sweep_interval: Duration::from_secs(args.sweep_interval_secs),
        max_session_age: Duration::from_secs(args.max_session_age_secs),
    };

    info!("starting banpick server on {}", config.addr());
    BanpickServer::new(config).run().await?;
    Ok(())
}
