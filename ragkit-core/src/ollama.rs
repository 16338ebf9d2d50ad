//! Embedding provider for a local Ollama server.
//!
//! This module is only available when the `ollama` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::Embedding;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "ollama";

/// The default Ollama server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// An [`EmbeddingProvider`] that calls Ollama's `/api/embed` endpoint.
///
/// Ollama does not report a model's dimensionality up front, so it must be
/// supplied by the caller; responses of any other size are rejected by the
/// store.
///
/// ```rust,ignore
/// let provider = OllamaEmbeddingProvider::new("nomic-embed-text", 768)?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for `model` producing `dimensions`-sized vectors.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Result<Self> {
        let model = model.into();
        if model.is_empty() {
            return Err(RagError::embedding(PROVIDER, "model must not be empty"));
        }
        if dimensions == 0 {
            return Err(RagError::embedding(PROVIDER, "dimensions must be greater than zero"));
        }
        Ok(Self { client: reqwest::Client::new(), base_url: DEFAULT_BASE_URL.into(), model, dimensions })
    }

    /// Override the server address.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fail requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            RagError::embedding(PROVIDER, format!("failed to build HTTP client: {e}"))
        })?;
        Ok(self)
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "server returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest { model: &self.model, input: texts })
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "server error");
            return Err(RagError::embedding(PROVIDER, format!("server returned {status}: {body}")));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            RagError::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })?;
        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
