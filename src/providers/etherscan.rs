//! Etherscan API provider for ethereum networks.
//!
//! Balance comes from the `account` module, nonce and broadcast from the
//! `proxy` module (a thin wrapper over node JSON-RPC).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::providers::http::{self, build_client, ensure_success, normalize_base_url, read_json};
use crate::providers::{
    BalanceLookup, NonceLookup, Provider, ProviderError, TxBroadcaster,
};

/// Union of the `account` and `proxy` module response shapes.
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: Option<String>,
    message: Option<String>,
    result: Option<Value>,
    error: Option<Value>,
}

impl EtherscanResponse {
    /// The `result` string, or `Rejected` when the API reported an error.
    fn into_result(self) -> Result<String, ProviderError> {
        if let Some(error) = self.error {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ProviderError::Rejected(message));
        }

        if self.status.as_deref() == Some("0") {
            let detail = self
                .result
                .as_ref()
                .and_then(Value::as_str)
                .or(self.message.as_deref())
                .unwrap_or("NOTOK");
            return Err(ProviderError::Rejected(detail.to_string()));
        }

        match self.result {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(ProviderError::Decode(format!(
                "Expected string result, got {}",
                other
            ))),
            None => Err(ProviderError::Decode("Missing result field".to_string())),
        }
    }
}

fn parse_hex_u64(value: &str) -> Result<u64, ProviderError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::Decode(format!("Invalid hex quantity '{}': {}", value, e)))
}

pub struct EtherscanProvider {
    name: String,
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl EtherscanProvider {
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Self {
        Self {
            name: format!("etherscan({})", base_url),
            base_url: normalize_base_url(base_url),
            api_token: api_token.filter(|t| !t.is_empty()),
            client: build_client(timeout),
        }
    }

    fn query<'a>(&'a self, params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut query = params.to_vec();
        if let Some(token) = &self.api_token {
            query.push(("apikey", token.as_str()));
        }
        query
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query(params))
            .send()
            .await
            .map_err(http::transport)?;

        let body: EtherscanResponse = read_json(ensure_success(response).await?).await?;
        body.into_result()
    }
}

impl std::fmt::Debug for EtherscanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtherscanProvider")
            .field("base_url", &self.base_url)
            .field("has_api_token", &self.api_token.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BalanceLookup for EtherscanProvider {
    async fn get_balance(&self, address: &str) -> Result<u128, ProviderError> {
        let result = self
            .get(&[
                ("module", "account"),
                ("action", "balance"),
                ("address", address),
                ("tag", "latest"),
            ])
            .await?;

        result
            .trim()
            .parse::<u128>()
            .map_err(|e| ProviderError::Decode(format!("Invalid balance '{}': {}", result, e)))
    }
}

#[async_trait]
impl NonceLookup for EtherscanProvider {
    async fn get_nonce(&self, address: &str) -> Result<u64, ProviderError> {
        let result = self
            .get(&[
                ("module", "proxy"),
                ("action", "eth_getTransactionCount"),
                ("address", address),
                ("tag", "latest"),
            ])
            .await?;

        parse_hex_u64(&result)
    }
}

#[async_trait]
impl TxBroadcaster for EtherscanProvider {
    async fn broadcast_tx(&self, tx_hex: &str) -> Result<Option<String>, ProviderError> {
        let response = self
            .client
            .post(&self.base_url)
            .query(&self.query(&[("module", "proxy"), ("action", "eth_sendRawTransaction")]))
            .form(&[("hex", tx_hex)])
            .send()
            .await
            .map_err(http::transport)?;

        let body: EtherscanResponse = read_json(ensure_success(response).await?).await?;
        let txid = body.into_result()?;
        Ok((!txid.is_empty()).then_some(txid))
    }
}

impl Provider for EtherscanProvider {
    fn name(&self) -> &str {
        &self.name
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
