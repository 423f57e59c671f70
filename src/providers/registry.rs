//! Ordered provider lists per network.
//!
//! # Responsibilities
//! - Build every configured provider once at startup
//! - Answer `providers_for(network, use_local_node)` in fallback order
//!
//! # Design Decisions
//! - The registry is an explicit value passed to its consumers, not a global
//! - Local node mode bypasses the remote lists entirely
//! - Immutable after construction; shared via `Arc`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::types::{ChainFamily, Network};
use crate::config::schema::{EndpointConfig, EndpointKind, LocalNodeConfig, ProvidersConfig};
use crate::providers::{
    BitcoindProvider, BlockcypherProvider, EsploraProvider, EthereumNodeProvider,
    EtherscanProvider, InsightProvider, MockProvider, Provider, ProviderError,
};

/// Providers for every network, plus the issuer's local nodes.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    remote: HashMap<Network, Vec<Arc<dyn Provider>>>,
    bitcoin_node: Option<Arc<dyn Provider>>,
    ethereum_node: Option<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Start assembling a registry by hand.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Build the registry from configuration.
    ///
    /// `api_token` is used for token-bearing endpoints configured without
    /// their own. Blockcypher endpoints left without any token are skipped.
    pub fn from_config(
        config: &ProvidersConfig,
        api_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut builder = Self::builder().with_local_node(&config.local_node, timeout)?;

        for network in Network::ALL {
            let providers: Vec<Arc<dyn Provider>> = config
                .endpoints_for(network)
                .iter()
                .filter_map(|endpoint| build_endpoint(endpoint, api_token, timeout))
                .collect();

            tracing::debug!(
                network = %network,
                providers = providers.len(),
                "Configured remote providers"
            );
            builder = builder.with_providers(network, providers);
        }

        Ok(builder.build())
    }

    /// Providers to use for `network`, in fallback order.
    ///
    /// With `use_local_node` the answer is the single local node of the
    /// network's family (bitcoind for bitcoin-like and mock networks). A
    /// registry assembled without that node yields an empty list.
    pub fn providers_for(&self, network: Network, use_local_node: bool) -> Vec<Arc<dyn Provider>> {
        if use_local_node {
            let node = match network.family() {
                ChainFamily::Ethereum => &self.ethereum_node,
                ChainFamily::Bitcoin | ChainFamily::Mock => &self.bitcoin_node,
            };
            if node.is_none() {
                tracing::warn!(
                    network = %network,
                    "Local node requested but none is configured"
                );
            }
            return node.iter().cloned().collect();
        }

        self.remote.get(&network).cloned().unwrap_or_default()
    }
}

fn build_endpoint(
    endpoint: &EndpointConfig,
    fallback_token: Option<&str>,
    timeout: Duration,
) -> Option<Arc<dyn Provider>> {
    let token = endpoint
        .api_token
        .as_deref()
        .or(fallback_token)
        .filter(|t| !t.is_empty());

    let provider: Arc<dyn Provider> = match endpoint.kind {
        EndpointKind::Esplora => Arc::new(EsploraProvider::new(&endpoint.base_url, timeout)),
        EndpointKind::Insight => Arc::new(InsightProvider::new(&endpoint.base_url, timeout)),
        EndpointKind::Blockcypher => match token {
            Some(token) => Arc::new(BlockcypherProvider::new(&endpoint.base_url, token, timeout)),
            None => {
                tracing::warn!(
                    base_url = %endpoint.base_url,
                    "Skipping Blockcypher provider without an API token"
                );
                return None;
            }
        },
        EndpointKind::Etherscan => Arc::new(EtherscanProvider::new(
            &endpoint.base_url,
            token.map(str::to_string),
            timeout,
        )),
        EndpointKind::Mock => Arc::new(MockProvider),
    };

    Some(provider)
}

/// Explicit registry assembly.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    remote: HashMap<Network, Vec<Arc<dyn Provider>>>,
    bitcoin_node: Option<Arc<dyn Provider>>,
    ethereum_node: Option<Arc<dyn Provider>>,
}

impl RegistryBuilder {
    /// Replace the provider list of `network`.
    pub fn with_providers(mut self, network: Network, providers: Vec<Arc<dyn Provider>>) -> Self {
        self.remote.insert(network, providers);
        self
    }

    /// Append one provider to `network`'s list.
    pub fn with_provider(mut self, network: Network, provider: Arc<dyn Provider>) -> Self {
        self.remote.entry(network).or_default().push(provider);
        self
    }

    /// Connect both local nodes.
    pub fn with_local_node(
        self,
        config: &LocalNodeConfig,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let ethereum = EthereumNodeProvider::new(&config.ethereum_rpc_url)?;
        let bitcoind = BitcoindProvider::new(
            &config.bitcoind_url,
            &config.bitcoind_user,
            &config.bitcoind_password,
            timeout,
        );

        Ok(self
            .with_bitcoin_node(Arc::new(bitcoind))
            .with_ethereum_node(Arc::new(ethereum)))
    }

    pub fn with_bitcoin_node(mut self, provider: Arc<dyn Provider>) -> Self {
        self.bitcoin_node = Some(provider);
        self
    }

    pub fn with_ethereum_node(mut self, provider: Arc<dyn Provider>) -> Self {
        self.ethereum_node = Some(provider);
        self
    }

    /// Finish the registry.
    ///
    /// Local nodes are optional here, unlike in `ProviderRegistry::from_config`.
    /// Without one, local-node lookups for that family return no providers.
    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            remote: self.remote,
            bitcoin_node: self.bitcoin_node,
            ethereum_node: self.ethereum_node,
        }
    }
}
