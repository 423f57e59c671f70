//! Insight API provider (blockexplorer.com and compatible explorers).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::blockchain::types::Spendable;
use crate::providers::http::{self, build_client, ensure_success, get_json, normalize_base_url, read_json};
use crate::providers::{
    sum_values, BalanceLookup, Provider, ProviderError, TxBroadcaster, UnspentLookup,
};

#[derive(Debug, Deserialize)]
struct InsightUtxo {
    txid: String,
    vout: u32,
    #[serde(rename = "scriptPubKey")]
    script_pub_key: String,
    satoshis: u64,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    txid: Option<String>,
}

#[derive(Debug)]
pub struct InsightProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl InsightProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            name: format!("insight({})", base_url),
            base_url: normalize_base_url(base_url),
            client: build_client(timeout),
        }
    }
}

#[async_trait]
impl UnspentLookup for InsightProvider {
    async fn get_unspent_outputs(&self, address: &str) -> Result<Vec<Spendable>, ProviderError> {
        let url = format!("{}/addr/{}/utxo", self.base_url, address);
        let utxos: Vec<InsightUtxo> = get_json(&self.client, &url).await?;

        Ok(utxos
            .into_iter()
            .map(|u| Spendable {
                value: u.satoshis,
                script_pubkey: u.script_pub_key,
                txid: u.txid,
                vout: u.vout,
            })
            .collect())
    }
}

#[async_trait]
impl BalanceLookup for InsightProvider {
    async fn get_balance(&self, address: &str) -> Result<u128, ProviderError> {
        let spendables = self.get_unspent_outputs(address).await?;
        Ok(sum_values(&spendables))
    }
}

#[async_trait]
impl TxBroadcaster for InsightProvider {
    async fn broadcast_tx(&self, tx_hex: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/tx/send", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "rawtx": tx_hex }))
            .send()
            .await
            .map_err(http::transport)?;

        let sent: SendResponse = read_json(ensure_success(response).await?).await?;
        Ok(sent.txid)
    }
}

impl Provider for InsightProvider {
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
