//! Local ethereum node over JSON-RPC, via alloy.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::providers::{Provider as RpcProvider, ProviderBuilder};
use async_trait::async_trait;

use crate::providers::{
    BalanceLookup, NonceLookup, Provider, ProviderError, ProviderKind, TxBroadcaster,
};

pub struct EthereumNodeProvider {
    rpc_url: String,
    rpc: Arc<dyn RpcProvider + Send + Sync>,
}

impl EthereumNodeProvider {
    pub fn new(rpc_url: &str) -> Result<Self, ProviderError> {
        let url: url::Url = rpc_url.parse().map_err(|e| {
            ProviderError::InvalidInput(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            rpc: Arc::new(ProviderBuilder::new().connect_http(url)),
        })
    }
}

impl std::fmt::Debug for EthereumNodeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumNodeProvider")
            .field("rpc_url", &self.rpc_url)
            .finish_non_exhaustive()
    }
}

fn parse_address(address: &str) -> Result<Address, ProviderError> {
    Address::from_str(address)
        .map_err(|e| ProviderError::InvalidInput(format!("Invalid address '{}': {}", address, e)))
}

fn rpc_error(err: impl std::fmt::Display) -> ProviderError {
    ProviderError::Transport(format!("RPC error: {}", err))
}

#[async_trait]
impl BalanceLookup for EthereumNodeProvider {
    async fn get_balance(&self, address: &str) -> Result<u128, ProviderError> {
        let address = parse_address(address)?;
        let balance = self.rpc.get_balance(address).await.map_err(rpc_error)?;
        u128::try_from(balance)
            .map_err(|_| ProviderError::Decode(format!("Balance {} exceeds u128", balance)))
    }
}

#[async_trait]
impl NonceLookup for EthereumNodeProvider {
    async fn get_nonce(&self, address: &str) -> Result<u64, ProviderError> {
        let address = parse_address(address)?;
        self.rpc
            .get_transaction_count(address)
            .await
            .map_err(rpc_error)
    }
}

#[async_trait]
impl TxBroadcaster for EthereumNodeProvider {
    async fn broadcast_tx(&self, tx_hex: &str) -> Result<Option<String>, ProviderError> {
        let raw = hex::decode(tx_hex.trim_start_matches("0x"))
            .map_err(|e| ProviderError::InvalidInput(format!("Invalid transaction hex: {}", e)))?;

        let pending = self
            .rpc
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| ProviderError::Rejected(e.to_string()))?;

        Ok(Some(pending.tx_hash().to_string()))
    }
}

impl Provider for EthereumNodeProvider {
    fn name(&self) -> &str {
        "ethereum-node"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalNode
    }

    fn balance(&self) -> Option<&dyn BalanceLookup> {
        Some(self)
    }

    fn nonce(&self) -> Option<&dyn NonceLookup> {
        Some(self)
    }

    fn broadcaster(&self) -> Option<&dyn TxBroadcaster> {
        Some(self)
    }
}
