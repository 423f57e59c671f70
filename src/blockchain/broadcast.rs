//! Transaction publication with retries and cross-provider consistency checks.
//!
//! # Responsibilities
//! - Publish a signed transaction through every provider of a network
//! - Retry whole rounds with a fixed, cancellable delay
//! - Detect providers disagreeing on the transaction id
//!
//! # Design Decisions
//! - Bitcoin-like and mock networks send to *all* providers each round, so
//!   the transaction propagates even when one service silently drops it
//! - Ethereum-like networks stop at the first provider that returns an id
//! - Every exhausted broadcast is an error; there is no sentinel id

use std::sync::Arc;

use thiserror::Error;

use crate::blockchain::transaction::SignedTransaction;
use crate::blockchain::types::{ChainFamily, Network};
use crate::config::schema::BroadcastConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{self, CallOutcome};
use crate::providers::{Capability, Provider, ProviderError, ProviderRegistry};
use crate::resilience::backoff::{cancellable_sleep, SleepOutcome};
use crate::resilience::timeouts::call_with_timeout;

/// Publication failed. Always fatal to the caller.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// No provider produced a transaction id.
    #[error("Broadcast failed after {attempts} attempt(s): {}", describe(.last_error))]
    Exhausted {
        attempts: u32,
        #[source]
        last_error: Option<ProviderError>,
    },

    /// Two providers reported different ids for the same transaction.
    #[error("Providers reported conflicting transaction ids {first} and {second}")]
    ConflictingTxIds { first: String, second: String },

    /// The network has no broadcast-capable provider configured.
    #[error("No broadcast provider configured for {0}")]
    NoProviders(Network),

    /// Shutdown was requested while waiting to retry.
    #[error("Broadcast cancelled")]
    Cancelled,
}

fn describe(last_error: &Option<ProviderError>) -> String {
    match last_error {
        Some(e) => e.to_string(),
        None => "no provider returned a transaction id".to_string(),
    }
}

impl BroadcastError {
    fn outcome(&self) -> &'static str {
        match self {
            BroadcastError::Exhausted { .. } => "exhausted",
            BroadcastError::ConflictingTxIds { .. } => "conflict",
            BroadcastError::NoProviders(_) => "no_providers",
            BroadcastError::Cancelled => "cancelled",
        }
    }
}

/// Publishes signed transactions through the registry's providers.
#[derive(Debug, Clone)]
pub struct BroadcastOrchestrator {
    registry: Arc<ProviderRegistry>,
    config: BroadcastConfig,
    shutdown: Shutdown,
}

impl BroadcastOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, config: BroadcastConfig, shutdown: Shutdown) -> Self {
        Self {
            registry,
            config,
            shutdown,
        }
    }

    /// Publish `tx` on `network` and return its transaction id.
    pub async fn broadcast(
        &self,
        network: Network,
        use_local_node: bool,
        tx: &SignedTransaction,
    ) -> Result<String, BroadcastError> {
        self.broadcast_raw(network, use_local_node, &tx.to_hex()).await
    }

    /// Publish an already-serialized transaction.
    pub async fn broadcast_raw(
        &self,
        network: Network,
        use_local_node: bool,
        tx_hex: &str,
    ) -> Result<String, BroadcastError> {
        let providers: Vec<Arc<dyn Provider>> = self
            .registry
            .providers_for(network, use_local_node)
            .into_iter()
            .filter(|p| p.supports(Capability::Broadcast))
            .collect();

        let result = if providers.is_empty() {
            Err(BroadcastError::NoProviders(network))
        } else {
            match network.family() {
                ChainFamily::Ethereum => self.first_success(network, &providers, tx_hex).await,
                ChainFamily::Bitcoin | ChainFamily::Mock => {
                    self.with_consensus(network, &providers, tx_hex).await
                }
            }
        };

        match &result {
            Ok(txid) => {
                metrics::record_broadcast_result(network, "published");
                tracing::info!(network = %network, txid = %txid, "Transaction broadcast");
            }
            Err(e) => {
                metrics::record_broadcast_result(network, e.outcome());
                tracing::error!(network = %network, error = %e, "Broadcast failed");
            }
        }

        result
    }

    /// Send to every provider each round; all ids must agree.
    async fn with_consensus(
        &self,
        network: Network,
        providers: &[Arc<dyn Provider>],
        tx_hex: &str,
    ) -> Result<String, BroadcastError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            metrics::record_broadcast_attempt(network);
            let mut final_txid: Option<String> = None;

            for provider in providers {
                let Some(txid) = self.try_provider(provider.as_ref(), tx_hex, &mut last_error).await
                else {
                    continue;
                };

                match &final_txid {
                    Some(existing) if *existing != txid => {
                        tracing::error!(
                            first = %existing,
                            second = %txid,
                            tx_hex,
                            "Providers reported conflicting transaction ids"
                        );
                        return Err(BroadcastError::ConflictingTxIds {
                            first: existing.clone(),
                            second: txid,
                        });
                    }
                    Some(_) => {}
                    None => final_txid = Some(txid),
                }
            }

            if let Some(txid) = final_txid {
                return Ok(txid);
            }

            if attempt < max_attempts {
                let delay = self.config.retry_interval();
                tracing::warn!(
                    network = %network,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "Broadcast attempt failed, waiting before retrying"
                );
                if cancellable_sleep(delay, &self.shutdown).await == SleepOutcome::Cancelled {
                    return Err(BroadcastError::Cancelled);
                }
            }
        }

        Err(BroadcastError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Single pass; the first provider to return an id wins.
    async fn first_success(
        &self,
        network: Network,
        providers: &[Arc<dyn Provider>],
        tx_hex: &str,
    ) -> Result<String, BroadcastError> {
        metrics::record_broadcast_attempt(network);
        let mut last_error = None;

        for provider in providers {
            if let Some(txid) = self.try_provider(provider.as_ref(), tx_hex, &mut last_error).await {
                return Ok(txid);
            }
        }

        Err(BroadcastError::Exhausted {
            attempts: 1,
            last_error,
        })
    }

    /// One provider call. Failures are logged and remembered in `last_error`.
    async fn try_provider(
        &self,
        provider: &dyn Provider,
        tx_hex: &str,
        last_error: &mut Option<ProviderError>,
    ) -> Option<String> {
        let broadcaster = provider.broadcaster()?;
        let result =
            call_with_timeout(self.config.provider_timeout(), broadcaster.broadcast_tx(tx_hex)).await;

        match result {
            Ok(Some(txid)) => {
                metrics::record_provider_call(provider.name(), Capability::Broadcast, CallOutcome::Success);
                tracing::info!(provider = provider.name(), txid = %txid, "Broadcast succeeded");
                Some(txid)
            }
            Ok(None) => {
                metrics::record_provider_call(provider.name(), Capability::Broadcast, CallOutcome::Success);
                tracing::warn!(provider = provider.name(), "Provider accepted broadcast without a transaction id");
                None
            }
            Err(e) => {
                let outcome = match e {
                    ProviderError::Timeout(_) => CallOutcome::Timeout,
                    _ => CallOutcome::Failure,
                };
                metrics::record_provider_call(provider.name(), Capability::Broadcast, outcome);
                tracing::warn!(
                    provider = provider.name(),
                    error = %e,
                    "Broadcast through provider failed, trying another"
                );
                *last_error = Some(e);
                None
            }
        }
    }
}
