//! Gemini embedding provider using the `batchEmbedContents` REST endpoint.
//!
//! This module is only available when the `gemini` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::Embedding;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "gemini";

/// The default Generative Language API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// Documents and queries are embedded with the `RETRIEVAL_DOCUMENT` task type
/// so that both sides of the similarity comparison share one vector space.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    output_dimensionality: Option<usize>,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Default embedding dimensions for `gemini-embedding-001`.
    const DEFAULT_DIMENSIONS: usize = 3072;

    /// Default embedding model.
    const DEFAULT_MODEL: &'static str = "gemini-embedding-001";

    /// Create a new provider using the given API key and the default
    /// `gemini-embedding-001` model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::embedding(PROVIDER, "API key must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: Self::DEFAULT_MODEL.into(),
            output_dimensionality: None,
            dimensions: Self::DEFAULT_DIMENSIONS,
        })
    }

    /// Set the model name (without the `models/` prefix).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensionality (truncates the embedding vector).
    pub fn with_output_dimensionality(mut self, dims: usize) -> Self {
        self.output_dimensionality = Some(dims);
        self.dimensions = dims;
        self
    }

    /// Override the API base URL.
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
#[serde(rename_all = "camelCase")]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let model = format!("models/{}", self.model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|&text| EmbedContentRequest {
                    model: model.clone(),
                    content: Content { parts: [Part { text }] },
                    task_type: "RETRIEVAL_DOCUMENT",
                    output_dimensionality: self.output_dimensionality,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/{model}:batchEmbedContents", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "batch embedding request failed");
                RagError::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::embedding(PROVIDER, format!("API returned {status}: {body}")));
        }

        let parsed: BatchEmbedResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
