//! Chain-specific types and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Family of a network, selecting signer and broadcast strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    /// UTXO chains signed with WIF keys.
    Bitcoin,
    /// Account chains signed with hex keys and EIP-155 chain ids.
    Ethereum,
    /// No-op chain for dry runs.
    Mock,
}

/// Blockchain network an issuer can anchor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Network {
    BitcoinMainnet,
    BitcoinTestnet,
    BitcoinRegtest,
    EthereumMainnet,
    EthereumRopsten,
    EthereumTestnet,
    Mockchain,
}

impl Network {
    /// All known networks.
    pub const ALL: [Network; 7] = [
        Network::BitcoinMainnet,
        Network::BitcoinTestnet,
        Network::BitcoinRegtest,
        Network::EthereumMainnet,
        Network::EthereumRopsten,
        Network::EthereumTestnet,
        Network::Mockchain,
    ];

    pub fn family(&self) -> ChainFamily {
        match self {
            Network::BitcoinMainnet | Network::BitcoinTestnet | Network::BitcoinRegtest => {
                ChainFamily::Bitcoin
            }
            Network::EthereumMainnet | Network::EthereumRopsten | Network::EthereumTestnet => {
                ChainFamily::Ethereum
            }
            Network::Mockchain => ChainFamily::Mock,
        }
    }

    /// Name used in configuration files and on the command line.
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::BitcoinMainnet => "bitcoinMainnet",
            Network::BitcoinTestnet => "bitcoinTestnet",
            Network::BitcoinRegtest => "bitcoinRegtest",
            Network::EthereumMainnet => "ethereumMainnet",
            Network::EthereumRopsten => "ethereumRopsten",
            Network::EthereumTestnet => "ethereumTestnet",
            Network::Mockchain => "mockchain",
        }
    }

    /// EIP-155 chain id bound into ethereum signatures.
    ///
    /// Only mainnet and ropsten carry one; other networks sign without replay
    /// protection.
    pub fn ethereum_chain_id(&self) -> Option<ChainId> {
        match self {
            Network::EthereumMainnet => Some(ChainId(1)),
            Network::EthereumRopsten => Some(ChainId(3)),
            _ => None,
        }
    }

    /// The `bitcoin` crate network, for bitcoin-like networks only.
    pub fn bitcoin_network(&self) -> Option<bitcoin::Network> {
        match self {
            Network::BitcoinMainnet => Some(bitcoin::Network::Bitcoin),
            Network::BitcoinTestnet => Some(bitcoin::Network::Testnet),
            Network::BitcoinRegtest => Some(bitcoin::Network::Regtest),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Network {
    type Err = UnknownChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|n| n.display_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownChainError(s.to_string()))
    }
}

/// Requested chain is not supported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown chain: {0}")]
pub struct UnknownChainError(pub String);

/// An unspent output that can fund a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spendable {
    /// Value in satoshis.
    pub value: u64,
    /// Locking script of the output (hex).
    pub script_pubkey: String,
    /// Hash of the transaction that created the output.
    pub txid: String,
    /// Output index within that transaction.
    pub vout: u32,
}
