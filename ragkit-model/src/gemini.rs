//! Gemini `generateContent` backend.

use std::time::Duration;

use async_trait::async_trait;
use ragkit_core::{Generator, RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::http;

/// The default Generative Language API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const BACKEND: &str = "gemini";

/// Configuration for [`GeminiChat`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    /// Default generation model.
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
            timeout: None,
        }
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

/// Answers prompts with `models/{model}:generateContent`.
pub struct GeminiChat {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiChat {
    pub fn new(config: GeminiConfig) -> Result<Self> {
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl Generator for GeminiChat {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        debug!(backend = BACKEND, model = %self.config.model, prompt_len = prompt.len(), max_tokens, "generating");

        let request = GenerateRequest {
            contents: [Content { role: "user", parts: [Part { text: prompt }] }],
            generation_config: GenerationConfig { max_output_tokens: max_tokens },
        };

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.config.base_url, self.config.model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::request_failed(BACKEND, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = BACKEND, %status, "API error");
            return Err(RagError::generation(BACKEND, format!("API returned {status}: {body}")));
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| http::malformed_response(BACKEND, e))?;
        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(RagError::generation(BACKEND, "response contained no candidates"));
        };
        if let Some(reason) = candidate.finish_reason.as_deref().filter(|r| *r != "STOP") {
            warn!(backend = BACKEND, finish_reason = reason, "generation finished early");
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        Ok(text)
    }
}
