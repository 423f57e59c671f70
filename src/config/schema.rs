//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the issuer.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal file only names what differs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::blockchain::types::{ChainFamily, Network};

/// Root configuration for the issuer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// Target network.
    pub chain: Network,

    /// Route every query and broadcast through the issuer's own node.
    pub use_local_node: bool,

    /// Address whose balance, nonce and outputs fund issuance.
    pub issuing_address: String,

    /// Fallback API token for remote providers configured without one.
    pub api_token: Option<String>,

    /// Secret source and safe-mode settings.
    pub secrets: SecretsConfig,

    /// Broadcast retry settings.
    pub broadcast: BroadcastConfig,

    /// Provider endpoints.
    pub providers: ProvidersConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            chain: Network::BitcoinTestnet,
            use_local_node: false,
            issuing_address: String::new(),
            api_token: None,
            secrets: SecretsConfig::default(),
            broadcast: BroadcastConfig::default(),
            providers: ProvidersConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Where the private key lives and how carefully it is loaded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Mount point of the removable media holding the key.
    pub usb_name: PathBuf,

    /// Key file name on that media.
    pub key_file: String,

    /// Require the machine offline with the media present while the key is loaded.
    pub safe_mode: bool,

    /// Delay between safe-mode condition checks.
    pub poll_interval_secs: u64,

    /// Give up waiting for safe-mode conditions after this long (None = wait forever).
    pub max_wait_secs: Option<u64>,

    /// URL probed to decide whether the machine is online.
    pub connectivity_url: String,

    /// Timeout of a single connectivity probe.
    pub connectivity_timeout_secs: u64,
}

impl SecretsConfig {
    /// Full path of the key file.
    pub fn secret_path(&self) -> PathBuf {
        self.usb_name.join(&self.key_file)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_secs(self.connectivity_timeout_secs)
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            usb_name: PathBuf::from("/media/usb"),
            key_file: "pk_issuer.txt".to_string(),
            safe_mode: true,
            poll_interval_secs: 10,
            max_wait_secs: Some(3600),
            connectivity_url: "http://google.com".to_string(),
            connectivity_timeout_secs: 5,
        }
    }
}

/// Broadcast retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Attempts over the full provider list before giving up.
    pub max_attempts: u32,

    /// Fixed delay between attempts.
    pub retry_interval_secs: u64,

    /// Deadline of a single provider call.
    pub provider_timeout_secs: u64,
}

impl BroadcastConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_interval_secs: 30,
            provider_timeout_secs: 10,
        }
    }
}

/// Remote provider lists and local node endpoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Per-network overrides. Networks not listed keep the built-in defaults.
    pub remote: Vec<NetworkProvidersConfig>,

    /// Issuer-run nodes used when `use_local_node` is set.
    pub local_node: LocalNodeConfig,
}

impl ProvidersConfig {
    /// Endpoints for `network`, in fallback order.
    pub fn endpoints_for(&self, network: Network) -> Vec<EndpointConfig> {
        self.remote
            .iter()
            .find(|entry| entry.network == network)
            .map(|entry| entry.endpoints.clone())
            .unwrap_or_else(|| default_endpoints(network))
    }
}

/// Ordered endpoints of one network.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkProvidersConfig {
    pub network: Network,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

/// A single remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    pub kind: EndpointKind,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_token: Option<String>,
}

impl EndpointConfig {
    pub fn new(kind: EndpointKind, base_url: &str) -> Self {
        Self {
            kind,
            base_url: base_url.to_string(),
            api_token: None,
        }
    }
}

/// Remote service flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    Esplora,
    Insight,
    Blockcypher,
    Etherscan,
    Mock,
}

impl EndpointKind {
    /// Chain family the service speaks.
    pub fn family(&self) -> ChainFamily {
        match self {
            EndpointKind::Esplora | EndpointKind::Insight | EndpointKind::Blockcypher => {
                ChainFamily::Bitcoin
            }
            EndpointKind::Etherscan => ChainFamily::Ethereum,
            EndpointKind::Mock => ChainFamily::Mock,
        }
    }

    /// Whether the service refuses requests without an API token.
    pub fn requires_token(&self) -> bool {
        matches!(self, EndpointKind::Blockcypher)
    }
}

/// Built-in provider lists.
pub fn default_endpoints(network: Network) -> Vec<EndpointConfig> {
    use EndpointKind::*;

    match network {
        Network::BitcoinMainnet => vec![
            EndpointConfig::new(Esplora, "https://blockstream.info/api"),
            EndpointConfig::new(Insight, "https://blockexplorer.com/api"),
            EndpointConfig::new(Blockcypher, "https://api.blockcypher.com/v1/btc/main"),
        ],
        Network::BitcoinTestnet => vec![
            EndpointConfig::new(Esplora, "https://blockstream.info/testnet/api"),
            EndpointConfig::new(Insight, "https://testnet.blockexplorer.com/api"),
        ],
        Network::EthereumMainnet => vec![EndpointConfig::new(Etherscan, "https://api.etherscan.io/api")],
        Network::EthereumRopsten => vec![EndpointConfig::new(
            Etherscan,
            "https://api-ropsten.etherscan.io/api",
        )],
        Network::Mockchain => vec![EndpointConfig::new(Mock, "")],
        Network::BitcoinRegtest | Network::EthereumTestnet => Vec::new(),
    }
}

/// Issuer-run full nodes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalNodeConfig {
    /// Bitcoin Core JSON-RPC URL.
    pub bitcoind_url: String,
    pub bitcoind_user: String,
    pub bitcoind_password: String,

    /// Ethereum JSON-RPC URL.
    pub ethereum_rpc_url: String,
}

impl Default for LocalNodeConfig {
    fn default() -> Self {
        Self {
            bitcoind_url: "http://localhost:8332".to_string(),
            bitcoind_user: "bitcoin".to_string(),
            bitcoind_password: "bitcoin".to_string(),
            ethereum_rpc_url: "http://localhost:8545".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
