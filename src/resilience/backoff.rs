//! Fixed-interval backoff that can be interrupted.

use std::time::Duration;
use tokio::time::sleep;

use crate::lifecycle::Shutdown;

/// How a backoff wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Elapsed,
    Cancelled,
}

/// Sleep for `delay` unless `shutdown` fires first.
pub async fn cancellable_sleep(delay: Duration, shutdown: &Shutdown) -> SleepOutcome {
    if shutdown.is_triggered() {
        return SleepOutcome::Cancelled;
    }

    tokio::select! {
        _ = sleep(delay) => SleepOutcome::Elapsed,
        _ = shutdown.triggered() => SleepOutcome::Cancelled,
    }
}
