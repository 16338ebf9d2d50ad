//! OpenAI chat completions backend.

use std::time::Duration;

use async_trait::async_trait;
use ragkit_core::{Generator, RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::http;

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const BACKEND: &str = "openai";

/// Configuration for [`OpenAIChat`].
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl OpenAIConfig {
    /// Default chat model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_BASE.to_string(),
            timeout: None,
        }
    }

    /// Configuration for an OpenAI-compatible server (vLLM, LocalAI, ...).
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(api_key, model).with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Answers prompts with `/chat/completions`, sending the prompt as a single user message.
///
/// ```rust,ignore
/// use ragkit_model::openai::{OpenAIChat, OpenAIConfig};
///
/// let model = OpenAIChat::new(OpenAIConfig::new(api_key, "gpt-4o-mini"))?;
/// let answer = model.generate("Context: ...\n\nQuery: ...\n\nAnswer:", 150).await?;
/// ```
pub struct OpenAIChat {
    client: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAIChat {
    /// Create a new OpenAI chat backend.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::generation(BACKEND, "API key must not be empty"));
        }
        let client = http::client(BACKEND, config.timeout)?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl Generator for OpenAIChat {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        debug!(backend = BACKEND, model = %self.config.model, prompt_len = prompt.len(), max_tokens, "generating");

        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::request_failed(BACKEND, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(backend = BACKEND, %status, "API error");
            return Err(RagError::generation(BACKEND, format!("API returned {status}: {detail}")));
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|e| http::malformed_response(BACKEND, e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::generation(BACKEND, "response contained no completion"))
    }
}
