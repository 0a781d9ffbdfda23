//! MSSQL Customer API entry point.
//!
//! Loads `.env`, reads configuration from the environment and serves HTTP
//! until SIGINT/SIGTERM.

use anyhow::Result;
use mssql_customer_api::shutdown::{install_signal_handlers, new_shutdown_controller};
use mssql_customer_api::{server, AppState, Config};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real deployments set the environment directly
    let dotenv = dotenvy::dotenv();

    init_logging();

    let version = env!("CARGO_PKG_VERSION");
    info!("MSSQL Customer API v{} starting...", version);
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Arc::new(Config::from_env()?);
    config.log_summary();

    let shutdown_controller = new_shutdown_controller();
    install_signal_handlers(shutdown_controller.clone());

    let state = AppState::from_config(config.clone())?;
    server::serve(&config.http, state, shutdown_controller).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber.
fn init_logging() {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("info,mssql_customer_api=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
