//! OS signal handling.
//!
//! # Responsibilities
//! - Translate SIGINT / ctrl-c into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A pending broadcast backoff or safe-mode wait aborts instead of the
//!   process being killed mid-session, so the secret is still cleared

use crate::lifecycle::Shutdown;

/// Spawn a task that triggers `shutdown` on ctrl-c.
pub fn spawn_ctrl_c_handler(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, cancelling pending waits");
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
        }
    })
}
