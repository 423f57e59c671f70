//! Esplora (Blockstream-compatible) REST provider.
//!
//! Supports balance, unspent outputs and broadcast for bitcoin-like networks.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::blockchain::types::Spendable;
use crate::providers::http::{self, build_client, ensure_success, get_json, normalize_base_url};
use crate::providers::{
    BalanceLookup, Provider, ProviderError, TxBroadcaster, UnspentLookup,
};

#[derive(Debug, Deserialize)]
struct AddressInfo {
    #[serde(default)]
    chain_stats: TxoStats,
    #[serde(default)]
    mempool_stats: TxoStats,
}

#[derive(Debug, Default, Deserialize)]
struct TxoStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

impl AddressInfo {
    /// Confirmed plus unconfirmed balance, floored at zero.
    fn total_balance(&self) -> u128 {
        let funded = u128::from(self.chain_stats.funded_txo_sum)
            + u128::from(self.mempool_stats.funded_txo_sum);
        let spent = u128::from(self.chain_stats.spent_txo_sum)
            + u128::from(self.mempool_stats.spent_txo_sum);
        funded.saturating_sub(spent)
    }
}

#[derive(Debug, Deserialize)]
struct Utxo {
    txid: String,
    vout: u32,
    value: u64,
}

/// Esplora REST API client.
#[derive(Debug)]
pub struct EsploraProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl EsploraProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            name: format!("esplora({})", base_url),
            base_url: normalize_base_url(base_url),
            client: build_client(timeout),
        }
    }
}

/// Esplora does not return locking scripts, so derive the one the address implies.
fn script_for_address(address: &str) -> Result<String, ProviderError> {
    let parsed = bitcoin::Address::from_str(address)
        .map_err(|e| ProviderError::InvalidInput(format!("Invalid address '{}': {}", address, e)))?;
    Ok(parsed.assume_checked().script_pubkey().to_hex_string())
}

#[async_trait]
impl BalanceLookup for EsploraProvider {
    async fn get_balance(&self, address: &str) -> Result<u128, ProviderError> {
        let url = format!("{}/address/{}", self.base_url, address);
        let info: AddressInfo = get_json(&self.client, &url).await?;
        Ok(info.total_balance())
    }
}

#[async_trait]
impl UnspentLookup for EsploraProvider {
    async fn get_unspent_outputs(&self, address: &str) -> Result<Vec<Spendable>, ProviderError> {
        let script_pubkey = script_for_address(address)?;
        let url = format!("{}/address/{}/utxo", self.base_url, address);
        let utxos: Vec<Utxo> = get_json(&self.client, &url).await?;

        Ok(utxos
            .into_iter()
            .map(|u| Spendable {
                value: u.value,
                script_pubkey: script_pubkey.clone(),
                txid: u.txid,
                vout: u.vout,
            })
            .collect())
    }
}

#[async_trait]
impl TxBroadcaster for EsploraProvider {
    async fn broadcast_tx(&self, tx_hex: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/tx", self.base_url);
        let response = self
            .client
            .post(&url)
            .body(tx_hex.to_string())
            .send()
            .await
            .map_err(http::transport)?;

        // Response is just the txid as plain text
        let txid = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let txid = txid.trim();
        Ok((!txid.is_empty()).then(|| txid.to_string()))
    }
}

impl Provider for EsploraProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn balance(&self) -> Option<&dyn BalanceLookup> {
        Some(self)
    }

    fn unspent_outputs(&self) -> Option<&dyn UnspentLookup> {
        Some(self)
    }

    fn broadcaster(&self) -> Option<&dyn TxBroadcaster> {
        Some(self)
    }
}
