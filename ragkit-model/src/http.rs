//! Shared `reqwest` plumbing for the HTTP backends.

use std::time::Duration;

use ragkit_core::{RagError, Result};
use tracing::error;

pub(crate) fn client(backend: &str, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| RagError::generation(backend, format!("failed to build HTTP client: {e}")))
}

pub(crate) fn request_failed(backend: &str, e: reqwest::Error) -> RagError {
    error!(backend, error = %e, "request failed");
    RagError::generation(backend, format!("request failed: {e}"))
}

pub(crate) fn malformed_response(backend: &str, e: reqwest::Error) -> RagError {
    error!(backend, error = %e, "failed to parse response");
    RagError::generation(backend, format!("failed to parse response: {e}"))
}
