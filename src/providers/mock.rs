//! Provider for the mock chain. Nothing is published anywhere.

use async_trait::async_trait;

use crate::blockchain::types::Spendable;
use crate::providers::{
    BalanceLookup, NonceLookup, Provider, ProviderError, ProviderKind, TxBroadcaster,
    UnspentLookup,
};

/// Transaction id reported for every mock broadcast.
pub const MOCK_TXID: &str = "This has not been issued on a blockchain and is for testing only";

#[derive(Debug, Default, Clone, Copy)]
pub struct MockProvider;

#[async_trait]
impl BalanceLookup for MockProvider {
    async fn get_balance(&self, _address: &str) -> Result<u128, ProviderError> {
        Ok(0)
    }
}

#[async_trait]
impl NonceLookup for MockProvider {
    async fn get_nonce(&self, _address: &str) -> Result<u64, ProviderError> {
        Ok(0)
    }
}

#[async_trait]
impl UnspentLookup for MockProvider {
    async fn get_unspent_outputs(&self, _address: &str) -> Result<Vec<Spendable>, ProviderError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl TxBroadcaster for MockProvider {
    async fn broadcast_tx(&self, _tx_hex: &str) -> Result<Option<String>, ProviderError> {
        Ok(Some(MOCK_TXID.to_string()))
    }
}

impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    fn balance(&self) -> Option<&dyn BalanceLookup> {
        Some(self)
    }

    fn nonce(&self) -> Option<&dyn NonceLookup> {
        Some(self)
    }

    fn unspent_outputs(&self) -> Option<&dyn UnspentLookup> {
        Some(self)
    }

    fn broadcaster(&self) -> Option<&dyn TxBroadcaster> {
        Some(self)
    }
}
