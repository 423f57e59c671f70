//! Environment checks behind the safe-mode protocol.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

/// Whether the machine can reach the internet.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Whether the removable media holding the key is attached.
pub trait MediaProbe: Send + Sync {
    fn is_present(&self) -> bool;
}

/// Online when a GET to a well-known URL gets any response.
#[derive(Debug, Clone)]
pub struct HttpConnectivityProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpConnectivityProbe {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            client: crate::providers::http::build_client(timeout),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn is_online(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "Connectivity probe failed");
                false
            }
        }
    }
}

/// Media counts as present while the key file exists.
#[derive(Debug, Clone)]
pub struct PathMediaProbe {
    path: PathBuf,
}

impl PathMediaProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MediaProbe for PathMediaProbe {
    fn is_present(&self) -> bool {
        self.path.exists()
    }
}
