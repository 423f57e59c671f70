//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every provider call with a deadline
//! - Turn an elapsed deadline into a recoverable provider error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from transport errors

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::providers::ProviderError;

/// Run a provider call, failing with [`ProviderError::Timeout`] after `limit`.
pub async fn call_with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}
