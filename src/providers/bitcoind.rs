//! Local Bitcoin Core node over JSON-RPC.
//!
//! Arbitrary addresses are not tracked by the node wallet, so unspent outputs
//! come from `scantxoutset`, which only sees confirmed outputs.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::blockchain::types::Spendable;
use crate::providers::http::{self, build_client, ensure_success, read_json};
use crate::providers::{
    sum_values, BalanceLookup, Provider, ProviderError, ProviderKind, TxBroadcaster,
    UnspentLookup,
};

const SATS_PER_BTC: f64 = 100_000_000.0;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ScanTxOutSet {
    #[serde(default)]
    unspents: Vec<ScanUnspent>,
}

#[derive(Debug, Deserialize)]
struct ScanUnspent {
    txid: String,
    vout: u32,
    #[serde(rename = "scriptPubKey")]
    script_pub_key: String,
    amount: f64,
}

fn btc_to_sats(amount: f64) -> u64 {
    (amount * SATS_PER_BTC).round() as u64
}

pub struct BitcoindProvider {
    url: String,
    user: String,
    password: String,
    client: reqwest::Client,
}

impl BitcoindProvider {
    pub fn new(url: &str, user: &str, password: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            client: build_client(timeout),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, ProviderError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "cert-anchor",
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(http::transport)?;

        // bitcoind answers RPC errors with HTTP 500 and a JSON body
        let response = match ensure_success(response).await {
            Ok(response) => response,
            Err(ProviderError::Status { body, .. }) if body.contains("\"code\"") => {
                return Err(ProviderError::Rejected(body));
            }
            Err(e) => return Err(e),
        };

        let reply: RpcResponse<T> = read_json(response).await?;
        if let Some(error) = reply.error {
            return Err(ProviderError::Rejected(format!(
                "RPC error {}: {}",
                error.code, error.message
            )));
        }

        reply
            .result
            .ok_or_else(|| ProviderError::Decode(format!("{} returned null result", method)))
    }

    async fn scan(&self, address: &str) -> Result<ScanTxOutSet, ProviderError> {
        self.call(
            "scantxoutset",
            vec![json!("start"), json!([format!("addr({})", address)])],
        )
        .await
    }
}

impl std::fmt::Debug for BitcoindProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitcoindProvider")
            .field("url", &self.url)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UnspentLookup for BitcoindProvider {
    async fn get_unspent_outputs(&self, address: &str) -> Result<Vec<Spendable>, ProviderError> {
        let scan = self.scan(address).await?;
        Ok(scan
            .unspents
            .into_iter()
            .map(|u| Spendable {
                value: btc_to_sats(u.amount),
                script_pubkey: u.script_pub_key,
                txid: u.txid,
                vout: u.vout,
            })
            .collect())
    }
}

#[async_trait]
impl BalanceLookup for BitcoindProvider {
    async fn get_balance(&self, address: &str) -> Result<u128, ProviderError> {
        let spendables = self.get_unspent_outputs(address).await?;
        Ok(sum_values(&spendables))
    }
}

#[async_trait]
impl TxBroadcaster for BitcoindProvider {
    async fn broadcast_tx(&self, tx_hex: &str) -> Result<Option<String>, ProviderError> {
        let txid: String = self.call("sendrawtransaction", vec![json!(tx_hex)]).await?;
        Ok(Some(txid))
    }
}

impl Provider for BitcoindProvider {
    fn name(&self) -> &str {
        "bitcoind"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalNode
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
