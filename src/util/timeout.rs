//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

/// Wrap a provider future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(duration.as_millis() as u64)),
    }
}
