//! Blockchain data providers.
//!
//! # Data Flow
//! ```text
//! IssuerConfig.providers
//!     → registry.rs (ordered providers per network, or the local node)
//!     → BlockchainClient (read queries, first success wins)
//!     → BroadcastOrchestrator (publication, consensus-checked)
//! ```
//!
//! # Design Decisions
//! - One trait per capability; a provider exposes only what its service supports
//! - Callers filter by capability before iterating, never assume support
//! - Providers are immutable after construction and shared via `Arc`
//! - Every non-success HTTP status is a `ProviderError`, recoverable by the caller

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::blockchain::types::Spendable;

pub mod bitcoind;
pub mod blockcypher;
pub mod esplora;
pub mod ethereum_node;
pub mod etherscan;
pub mod http;
pub mod insight;
pub mod mock;
pub mod registry;

pub use bitcoind::BitcoindProvider;
pub use blockcypher::BlockcypherProvider;
pub use esplora::EsploraProvider;
pub use ethereum_node::EthereumNodeProvider;
pub use etherscan::EtherscanProvider;
pub use insight::InsightProvider;
pub use mock::MockProvider;
pub use registry::{ProviderRegistry, RegistryBuilder};

/// A single provider call failed.
///
/// Always recoverable at the aggregator and orchestrator boundary: the next
/// provider is tried.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider answered with a non-success status.
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection or protocol failure before a response was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be parsed.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Provider answered but refused the request (API-level error).
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Call exceeded its deadline.
    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    /// Address or payload could not be sent to this provider.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Where a provider's answers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Third-party HTTP service.
    Remote,
    /// Trusted full node run by the issuer.
    LocalNode,
    /// Fake provider for the mock chain.
    Mock,
}

/// Capabilities a provider may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Balance,
    Nonce,
    UnspentOutputs,
    Broadcast,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Balance => "balance",
            Capability::Nonce => "nonce",
            Capability::UnspentOutputs => "unspent_outputs",
            Capability::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Balance lookup in the chain's base unit (satoshi or wei).
#[async_trait]
pub trait BalanceLookup: Send + Sync {
    async fn get_balance(&self, address: &str) -> Result<u128, ProviderError>;
}

/// Next transaction nonce of an account.
#[async_trait]
pub trait NonceLookup: Send + Sync {
    async fn get_nonce(&self, address: &str) -> Result<u64, ProviderError>;
}

/// Unspent outputs locked to an address.
#[async_trait]
pub trait UnspentLookup: Send + Sync {
    async fn get_unspent_outputs(&self, address: &str) -> Result<Vec<Spendable>, ProviderError>;
}

/// Publication of a signed transaction.
#[async_trait]
pub trait TxBroadcaster: Send + Sync {
    /// Returns the transaction id, or `None` when the provider accepted the
    /// request without reporting one.
    async fn broadcast_tx(&self, tx_hex: &str) -> Result<Option<String>, ProviderError>;
}

/// A configured endpoint exposing some subset of capabilities.
pub trait Provider: Send + Sync + fmt::Debug {
    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind {
        ProviderKind::Remote
    }

    fn balance(&self) -> Option<&dyn BalanceLookup> {
        None
    }

    fn nonce(&self) -> Option<&dyn NonceLookup> {
        None
    }

    fn unspent_outputs(&self) -> Option<&dyn UnspentLookup> {
        None
    }

    fn broadcaster(&self) -> Option<&dyn TxBroadcaster> {
        None
    }

    /// Whether the provider exposes `capability`.
    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Balance => self.balance().is_some(),
            Capability::Nonce => self.nonce().is_some(),
            Capability::UnspentOutputs => self.unspent_outputs().is_some(),
            Capability::Broadcast => self.broadcaster().is_some(),
        }
    }
}

/// Sum spendable values, the balance of UTXO providers without a balance endpoint.
pub(crate) fn sum_values(spendables: &[Spendable]) -> u128 {
    spendables.iter().map(|s| u128::from(s.value)).sum()
}
