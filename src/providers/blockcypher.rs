//! Blockcypher push API. Broadcast only, needs an API token.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::providers::http::{self, build_client, ensure_success, normalize_base_url, read_json};
use crate::providers::{Provider, ProviderError, TxBroadcaster};

#[derive(Debug, Deserialize)]
struct PushResponse {
    tx: Option<PushedTx>,
    txid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushedTx {
    hash: Option<String>,
}

impl PushResponse {
    fn into_txid(self) -> Option<String> {
        self.tx.and_then(|tx| tx.hash).or(self.txid)
    }
}

pub struct BlockcypherProvider {
    name: String,
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl BlockcypherProvider {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Self {
        Self {
            name: format!("blockcypher({})", base_url),
            base_url: normalize_base_url(base_url),
            api_token: api_token.to_string(),
            client: build_client(timeout),
        }
    }
}

impl std::fmt::Debug for BlockcypherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockcypherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TxBroadcaster for BlockcypherProvider {
    async fn broadcast_tx(&self, tx_hex: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/txs/push", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("token", self.api_token.as_str())])
            .json(&json!({ "tx": tx_hex }))
            .send()
            .await
            .map_err(http::transport)?;

        let pushed: PushResponse = read_json(ensure_success(response).await?).await?;
        Ok(pushed.into_txid())
    }
}

impl Provider for BlockcypherProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn broadcaster(&self) -> Option<&dyn TxBroadcaster> {
        Some(self)
    }
}
