//! Configuration for retrieval, generation and embedding providers.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::embedding::{BatchedEmbedder, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::lexical::LexicalEmbeddingProvider;

/// Configuration parameters for a [`RagSystem`](crate::RagSystem).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Number of documents retrieved as context for each query.
    pub top_k: usize,
    /// Output token budget used when a caller does not pass one.
    pub max_output_tokens: u32,
    /// Deadline for each embedding call, in milliseconds.
    pub embed_timeout_ms: Option<u64>,
    /// Deadline for each generation call, in milliseconds.
    pub generate_timeout_ms: Option<u64>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { top_k: 3, max_output_tokens: 150, embed_timeout_ms: None, generate_timeout_ms: None }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Embedding deadline as a [`Duration`].
    pub fn embed_timeout(&self) -> Option<Duration> {
        self.embed_timeout_ms.map(Duration::from_millis)
    }

    /// Generation deadline as a [`Duration`].
    pub fn generate_timeout(&self) -> Option<Duration> {
        self.generate_timeout_ms.map(Duration::from_millis)
    }

    /// Check that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `top_k == 0`
    /// - `max_output_tokens == 0`
    /// - either timeout is set to zero
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.max_output_tokens == 0 {
            return Err(RagError::ConfigError(
                "max_output_tokens must be greater than zero".to_string(),
            ));
        }
        if self.embed_timeout_ms == Some(0) || self.generate_timeout_ms == Some(0) {
            return Err(RagError::ConfigError("timeouts must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of documents retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the default output token budget.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.config.max_output_tokens = tokens;
        self
    }

    /// Set the deadline for embedding calls.
    pub fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.config.embed_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the deadline for generation calls.
    pub fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.config.generate_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Sub-batching applied on top of any embedding provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchingConfig {
    /// Maximum number of texts per provider call.
    pub batch_size: usize,
    /// Maximum number of provider calls in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

/// Selects and configures an embedding provider.
///
/// ```toml
/// [embedder]
/// provider = "openai"
/// model = "text-embedding-3-small"
/// api_key_env = "OPENAI_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum EmbedderConfig {
    /// Offline feature-hashing embedder.
    Lexical {
        #[serde(default = "default_lexical_dimensions")]
        dimensions: usize,
        #[serde(default)]
        max_input_chars: Option<usize>,
        #[serde(default)]
        batching: Option<BatchingConfig>,
    },
    /// OpenAI `/v1/embeddings`.
    #[cfg(feature = "openai")]
    #[serde(rename = "openai")]
    OpenAI {
        #[serde(flatten)]
        credentials: ApiCredentials,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        dimensions: Option<usize>,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
        #[serde(default)]
        batching: Option<BatchingConfig>,
    },
    /// Gemini `batchEmbedContents`.
    #[cfg(feature = "gemini")]
    Gemini {
        #[serde(flatten)]
        credentials: ApiCredentials,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        dimensions: Option<usize>,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
        #[serde(default)]
        batching: Option<BatchingConfig>,
    },
    /// A local Ollama server.
    #[cfg(feature = "ollama")]
    Ollama {
        model: String,
        dimensions: usize,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
        #[serde(default)]
        batching: Option<BatchingConfig>,
    },
}

fn default_lexical_dimensions() -> usize {
    LexicalEmbeddingProvider::DEFAULT_DIMENSIONS
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self::Lexical {
            dimensions: LexicalEmbeddingProvider::DEFAULT_DIMENSIONS,
            max_input_chars: None,
            batching: None,
        }
    }
}

impl EmbedderConfig {
    /// Construct the configured provider, wrapped in a [`BatchedEmbedder`] if batching is set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for missing credentials and the
    /// provider's own construction errors.
    pub fn build(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let (provider, batching): (Arc<dyn EmbeddingProvider>, _) = match self {
            Self::Lexical { dimensions, max_input_chars, batching } => {
                let mut provider = LexicalEmbeddingProvider::new(*dimensions)?;
                if let Some(limit) = max_input_chars {
                    provider = provider.with_max_input_chars(*limit);
                }
                (Arc::new(provider), batching)
            }
            #[cfg(feature = "openai")]
            Self::OpenAI { credentials, model, dimensions, base_url, timeout_secs, batching } => {
                let mut provider =
                    crate::openai::OpenAIEmbeddingProvider::new(credentials.resolve()?)?;
                if let Some(model) = model {
                    provider = provider.with_model(model);
                }
                if let Some(dims) = dimensions {
                    provider = provider.with_dimensions(*dims);
                }
                if let Some(url) = base_url {
                    provider = provider.with_base_url(url);
                }
                if let Some(secs) = timeout_secs {
                    provider = provider.with_timeout(Duration::from_secs(*secs))?;
                }
                (Arc::new(provider), batching)
            }
            #[cfg(feature = "gemini")]
            Self::Gemini { credentials, model, dimensions, base_url, timeout_secs, batching } => {
                let mut provider =
                    crate::gemini::GeminiEmbeddingProvider::new(credentials.resolve()?)?;
                if let Some(model) = model {
                    provider = provider.with_model(model);
                }
                if let Some(dims) = dimensions {
                    provider = provider.with_output_dimensionality(*dims);
                }
                if let Some(url) = base_url {
                    provider = provider.with_base_url(url);
                }
                if let Some(secs) = timeout_secs {
                    provider = provider.with_timeout(Duration::from_secs(*secs))?;
                }
                (Arc::new(provider), batching)
            }
            #[cfg(feature = "ollama")]
            Self::Ollama { model, dimensions, base_url, timeout_secs, batching } => {
                let mut provider = crate::ollama::OllamaEmbeddingProvider::new(model, *dimensions)?;
                if let Some(url) = base_url {
                    provider = provider.with_base_url(url);
                }
                if let Some(secs) = timeout_secs {
                    provider = provider.with_timeout(Duration::from_secs(*secs))?;
                }
                (Arc::new(provider), batching)
            }
        };

        Ok(match batching {
            Some(b) => Arc::new(BatchedEmbedder::new(provider, b.batch_size, b.concurrency)),
            None => provider,
        })
    }
}

/// An API key given inline or named by an environment variable.
///
/// The key is resolved once, when the provider is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiCredentials {
    /// The key itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Name of the environment variable holding the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl ApiCredentials {
    /// Use `key` directly.
    pub fn key(key: impl Into<String>) -> Self {
        Self { api_key: Some(key.into()), api_key_env: None }
    }

    /// Read the key from environment variable `var` at build time.
    pub fn env(var: impl Into<String>) -> Self {
        Self { api_key: None, api_key_env: Some(var.into()) }
    }

    /// Return the inline key, or read the named environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if neither source yields a key.
    pub fn resolve(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        let Some(var) = &self.api_key_env else {
            return Err(RagError::ConfigError("either api_key or api_key_env is required".into()));
        };
        std::env::var(var).map_err(|_| {
            RagError::ConfigError(format!("environment variable {var} is not set"))
        })
    }
}
