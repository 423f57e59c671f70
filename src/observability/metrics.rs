//! Metrics collection.
//!
//! # Responsibilities
//! - Define issuer metrics (provider calls, broadcast attempts and outcomes)
//! - Record through the `metrics` facade; the binary decides whether a recorder is installed
//!
//! # Metrics
//! - `anchor_provider_calls_total` (counter): provider calls by provider, capability, outcome
//! - `anchor_broadcast_attempts_total` (counter): broadcast rounds by network
//! - `anchor_broadcast_results_total` (counter): final broadcast outcome by network
//!
//! # Design Decisions
//! - Low-overhead metric updates (no-ops without a recorder)
//! - Outcome labels are a fixed vocabulary, never error text

use crate::blockchain::types::Network;
use crate::providers::Capability;

/// Result label of a single provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
    Timeout,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Failure => "failure",
            CallOutcome::Timeout => "timeout",
        }
    }
}

/// Record one provider call.
pub fn record_provider_call(provider: &str, capability: Capability, outcome: CallOutcome) {
    metrics::counter!(
        "anchor_provider_calls_total",
        "provider" => provider.to_string(),
        "capability" => capability.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record the start of a broadcast round.
pub fn record_broadcast_attempt(network: Network) {
    metrics::counter!(
        "anchor_broadcast_attempts_total",
        "network" => network.display_name()
    )
    .increment(1);
}

/// Record how a broadcast ended (`published`, `exhausted`, `conflict`, `cancelled`).
pub fn record_broadcast_result(network: Network, outcome: &'static str) {
    metrics::counter!(
        "anchor_broadcast_results_total",
        "network" => network.display_name(),
        "outcome" => outcome
    )
    .increment(1);
}
