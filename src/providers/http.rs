//! Shared HTTP plumbing for remote providers.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::providers::ProviderError;

/// Build the HTTP client every provider uses.
///
/// The client carries the per-call timeout so a hung service cannot stall an
/// operation even when called outside the orchestrator.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("cert-anchor/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            Client::new()
        })
}

/// Strip a trailing slash so paths can be appended with `format!`.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Reject non-success responses, carrying the provider's error payload.
pub async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body: error_payload(&body),
    })
}

/// Decode a JSON body.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    response
        .json()
        .await
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Send a GET and decode its JSON body.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, ProviderError> {
    let response = client.get(url).send().await.map_err(transport)?;
    read_json(ensure_success(response).await?).await
}

pub fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.to_string())
}

/// Prefer the `error` field of a JSON error body, else the raw text.
fn error_payload(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value.get("error") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) if !other.is_null() => Some(other.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| body.to_string())
}
