//! HTTP router and server loop.

use crate::config::HttpConfig;
use crate::handlers;
use crate::shutdown::SharedShutdownController;
use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use std::future::IntoFuture;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/customers", get(handlers::list_customers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until shutdown.
///
/// After the shutdown signal, in-flight requests get the controller's drain
/// timeout to finish before the server returns anyway.
pub async fn serve(
    config: &HttpConfig,
    state: AppState,
    shutdown: SharedShutdownController,
) -> Result<(), anyhow::Error> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    if shutdown.is_shutting_down() {
        info!("Shutdown requested before the server started, not serving");
        return Ok(());
    }

    info!("HTTP server listening on http://{}", addr);
    info!("Customers endpoint: http://{}/customers", addr);

    let mut stop_accepting = shutdown.signal();
    let server = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            stop_accepting.recv().await;
            info!("HTTP server received shutdown signal");
        })
        .into_future();

    let mut drain_started = shutdown.signal();
    let drain_timeout = shutdown.drain_timeout();
    let drain_deadline = async move {
        drain_started.recv().await;
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            warn!("Drain timeout of {}s exceeded, abandoning in-flight requests", drain_timeout.as_secs());
        }
    }

    Ok(())
}
