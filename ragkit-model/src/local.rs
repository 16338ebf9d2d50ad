//! Locally hosted models served by Ollama.

use std::time::Duration;

use async_trait::async_trait;
use ragkit_core::{Generator, RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::http;

/// The default Ollama server address.
pub const OLLAMA_HOST: &str = "http://localhost:11434";

const BACKEND: &str = "local";

/// Configuration for [`LocalModel`].
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Ollama model tag, e.g. `llama3.2`.
    pub model: String,
    /// Server base URL without a trailing slash.
    pub host: String,
    /// Per-request timeout; `None` keeps the client default.
    pub timeout: Option<Duration>,
}

impl LocalConfig {
    /// Default local model.
    pub const DEFAULT_MODEL: &'static str = "llama3.2";

    /// Configuration for `model` on [`OLLAMA_HOST`] with no timeout.
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), host: OLLAMA_HOST.to_string(), timeout: None }
    }

    /// Point at another server. Trailing slashes are stripped.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound each request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Completes prompts with Ollama's non-streaming `/api/generate` endpoint.
///
/// The token budget is passed as `options.num_predict`.
pub struct LocalModel {
    client: reqwest::Client,
    config: LocalConfig,
}

impl LocalModel {
    /// Build the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Generation`] if the model name is empty or
    /// the client cannot be built.
    pub fn new(config: LocalConfig) -> Result<Self> {
        if config.model.is_empty() {
            return Err(RagError::generation(BACKEND, "model must not be empty"));
        }
        let client = http::client(BACKEND, config.timeout)?;
        Ok(Self { client, config })
    }

    /// The configured model tag.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl Generator for LocalModel {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        debug!(backend = BACKEND, model = %self.config.model, prompt_len = prompt.len(), max_tokens, "generating");

        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions { num_predict: max_tokens },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.host))
            .json(&request)
            .send()
            .await
            .map_err(|e| http::request_failed(BACKEND, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = BACKEND, %status, "server error");
            return Err(RagError::generation(BACKEND, format!("server returned {status}: {body}")));
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| http::malformed_response(BACKEND, e))?;
        Ok(parsed.response)
    }
}
