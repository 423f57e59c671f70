//! Read queries against a network's providers with failover.
//!
//! # Responsibilities
//! - Query balances, nonces and unspent outputs
//! - Fall through providers in registry order until one answers
//! - Bound every provider call by a timeout
//!
//! # Design Decisions
//! - First success wins; providers lacking the capability are skipped
//! - Exhausting every provider degrades to zero / empty, never an error,
//!   so issuance can still decide for itself what an empty wallet means

use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::types::{Network, Spendable};
use crate::observability::metrics::{self, CallOutcome};
use crate::providers::{Capability, Provider, ProviderError, ProviderRegistry};
use crate::resilience::timeouts::call_with_timeout;

/// Failover client for read queries on one network.
#[derive(Clone)]
pub struct BlockchainClient {
    registry: Arc<ProviderRegistry>,
    network: Network,
    use_local_node: bool,
    /// Deadline of each provider call.
    timeout_duration: Duration,
}

impl BlockchainClient {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        network: Network,
        use_local_node: bool,
        timeout_duration: Duration,
    ) -> Self {
        Self {
            registry,
            network,
            use_local_node,
            timeout_duration,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    fn providers(&self) -> Vec<Arc<dyn Provider>> {
        self.registry.providers_for(self.network, self.use_local_node)
    }

    /// Balance of `address` in satoshi or wei. Zero when no provider answers.
    pub async fn get_balance(&self, address: &str) -> u128 {
        for provider in self.providers() {
            let Some(lookup) = provider.balance() else {
                self.unsupported(provider.as_ref(), Capability::Balance);
                continue;
            };
            let result = call_with_timeout(self.timeout_duration, lookup.get_balance(address)).await;
            if let Some(balance) = self.settle(provider.as_ref(), Capability::Balance, result) {
                tracing::debug!(provider = provider.name(), balance, "Balance lookup succeeded");
                return balance;
            }
        }

        self.exhausted(Capability::Balance, address);
        0
    }

    /// Next nonce of `address`. Zero when no provider answers.
    pub async fn get_nonce(&self, address: &str) -> u64 {
        for provider in self.providers() {
            let Some(lookup) = provider.nonce() else {
                self.unsupported(provider.as_ref(), Capability::Nonce);
                continue;
            };
            let result = call_with_timeout(self.timeout_duration, lookup.get_nonce(address)).await;
            if let Some(nonce) = self.settle(provider.as_ref(), Capability::Nonce, result) {
                return nonce;
            }
        }

        self.exhausted(Capability::Nonce, address);
        0
    }

    /// Unspent outputs of `address`, ascending by value. Empty when no provider answers.
    pub async fn get_unspent_outputs(&self, address: &str) -> Vec<Spendable> {
        for provider in self.providers() {
            let Some(lookup) = provider.unspent_outputs() else {
                self.unsupported(provider.as_ref(), Capability::UnspentOutputs);
                continue;
            };
            let result =
                call_with_timeout(self.timeout_duration, lookup.get_unspent_outputs(address)).await;
            if let Some(mut spendables) =
                self.settle(provider.as_ref(), Capability::UnspentOutputs, result)
            {
                spendables.sort_by_key(|s| s.value);
                return spendables;
            }
        }

        self.exhausted(Capability::UnspentOutputs, address);
        Vec::new()
    }

    /// Log and count one provider call, keeping the value on success.
    fn settle<T>(
        &self,
        provider: &dyn Provider,
        capability: Capability,
        result: Result<T, ProviderError>,
    ) -> Option<T> {
        match result {
            Ok(value) => {
                metrics::record_provider_call(provider.name(), capability, CallOutcome::Success);
                Some(value)
            }
            Err(e) => {
                let outcome = match e {
                    ProviderError::Timeout(_) => CallOutcome::Timeout,
                    _ => CallOutcome::Failure,
                };
                metrics::record_provider_call(provider.name(), capability, outcome);
                tracing::warn!(
                    provider = provider.name(),
                    network = %self.network,
                    capability = %capability,
                    error = %e,
                    "Provider call failed, trying next provider"
                );
                None
            }
        }
    }

    fn unsupported(&self, provider: &dyn Provider, capability: Capability) {
        tracing::debug!(
            provider = provider.name(),
            network = %self.network,
            capability = %capability,
            "Provider does not support capability, skipping"
        );
    }

    fn exhausted(&self, capability: Capability, address: &str) {
        tracing::warn!(
            network = %self.network,
            capability = %capability,
            address,
            "No provider answered, returning empty result"
        );
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("network", &self.network)
            .field("use_local_node", &self.use_local_node)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{BalanceLookup, UnspentLookup};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BalanceLookup for Flaky {
        async fn get_balance(&self, _address: &str) -> Result<u128, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Transport("connection refused".into()))
        }
    }

    impl Provider for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }
        fn balance(&self) -> Option<&dyn BalanceLookup> {
            Some(self)
        }
    }

    #[derive(Debug)]
    struct Fixed(Vec<u64>);

    #[async_trait]
    impl BalanceLookup for Fixed {
        async fn get_balance(&self, _address: &str) -> Result<u128, ProviderError> {
            Ok(self.0.iter().map(|v| u128::from(*v)).sum())
        }
    }

    #[async_trait]
    impl UnspentLookup for Fixed {
        async fn get_unspent_outputs(&self, _address: &str) -> Result<Vec<Spendable>, ProviderError> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, value)| Spendable {
                    value: *value,
                    script_pubkey: "76a914".into(),
                    txid: format!("tx{}", i),
                    vout: 0,
                })
                .collect())
        }
    }

    impl Provider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn balance(&self) -> Option<&dyn BalanceLookup> {
            Some(self)
        }
        fn unspent_outputs(&self) -> Option<&dyn UnspentLookup> {
            Some(self)
        }
    }

    fn client(providers: Vec<Arc<dyn Provider>>) -> BlockchainClient {
        let registry = ProviderRegistry::builder()
            .with_providers(Network::BitcoinTestnet, providers)
            .build();
        BlockchainClient::new(Arc::new(registry), Network::BitcoinTestnet, false, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider() {
        let flaky = Arc::new(Flaky::default());
        let client = client(vec![flaky.clone(), Arc::new(Fixed(vec![10, 20]))]);

        assert_eq!(client.get_balance("addr").await, 30);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failing_returns_zero() {
        let client = client(vec![Arc::new(Flaky::default()), Arc::new(Flaky::default())]);
        assert_eq!(client.get_balance("addr").await, 0);
    }

    #[tokio::test]
    async fn test_unsupported_capability_is_skipped() {
        // Flaky has no unspent lookup and must not count as a failure
        let flaky = Arc::new(Flaky::default());
        let client = client(vec![flaky.clone(), Arc::new(Fixed(vec![500, 5, 50]))]);
        let values: Vec<_> = client
            .get_unspent_outputs("addr")
            .await
            .iter()
            .map(|s| s.value)
            .collect();
        assert_eq!(values, vec![5, 50, 500]);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 0);

        assert_eq!(client.get_nonce("addr").await, 0);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let client = client(Vec::new());
        assert!(client.get_unspent_outputs("addr").await.is_empty());
    }
}
