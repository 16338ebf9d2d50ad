//! Deadlines for provider calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{RagError, Result};

/// Await `future`, failing with [`RagError::ProviderTimeout`] once `timeout` elapses.
///
/// `None` waits indefinitely.
pub(crate) async fn with_deadline<T, F>(
    operation: &str,
    timeout: Option<Duration>,
    future: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(timeout) = timeout else {
        return future.await;
    };

    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?timeout, "provider call exceeded deadline");
            Err(RagError::ProviderTimeout { operation: operation.to_string(), timeout })
        }
    }
}
