//! Graceful shutdown handling.
//!
//! A signal (SIGINT, SIGTERM) flips the controller; the HTTP server stops
//! accepting connections and waits for in-flight requests, each of which
//! closes its own database session, up to the drain timeout.

use crate::constants::DEFAULT_DRAIN_TIMEOUT;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Shutdown signal that can be awaited.
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for the shutdown signal.
    pub async fn recv(&mut self) {
        let _ = self.receiver.wait_for(|&v| v).await;
    }

    /// Check if shutdown has been signaled without blocking.
    #[cfg(test)]
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Controller for managing graceful shutdown.
pub struct ShutdownController {
    sender: watch::Sender<bool>,
    shutting_down: AtomicBool,
    drain_timeout: Duration,
}

impl ShutdownController {
    /// Create a new shutdown controller with the default drain timeout.
    pub fn new() -> Self {
        Self::with_drain_timeout(DEFAULT_DRAIN_TIMEOUT)
    }

    /// Create a shutdown controller with a custom drain timeout.
    pub fn with_drain_timeout(drain_timeout: Duration) -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender,
            shutting_down: AtomicBool::new(false),
            drain_timeout,
        }
    }

    /// Get a shutdown signal receiver.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Check if shutdown is in progress.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Initiate shutdown. Later calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Initiating graceful shutdown...");
            // Stored even with no receivers so late subscribers still observe it
            self.sender.send_replace(true);
        }
    }

    /// Time allowed for in-flight requests after shutdown starts.
    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared shutdown controller type.
pub type SharedShutdownController = Arc<ShutdownController>;

/// Create a new shared shutdown controller.
pub fn new_shutdown_controller() -> SharedShutdownController {
    Arc::new(ShutdownController::new())
}

/// Install handlers for SIGINT (Ctrl+C) and, on Unix, SIGTERM.
pub fn install_signal_handlers(controller: SharedShutdownController) {
    let ctrl_c_controller = controller.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating shutdown...");
                ctrl_c_controller.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl+C signal: {}", e),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, initiating shutdown...");
                controller.shutdown();
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    });
}
