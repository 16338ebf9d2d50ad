//! Generator backend selection.
//!
//! A [`GeneratorBackend`] is built once from a [`GeneratorConfig`] and then
//! used as a plain [`Generator`]; the variant never changes afterwards.

#[cfg(any(feature = "openai", feature = "gemini", feature = "local"))]
use std::time::Duration;

use async_trait::async_trait;
use ragkit_core::{Generator, Result};
#[cfg(any(feature = "openai", feature = "gemini"))]
use ragkit_core::ApiCredentials;
use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "gemini")]
use crate::gemini::{GeminiChat, GeminiConfig};
#[cfg(feature = "local")]
use crate::local::{LocalConfig, LocalModel};
use crate::mock::MockGenerator;
#[cfg(feature = "openai")]
use crate::openai::{OpenAIChat, OpenAIConfig};

/// Generator settings, usually read from the `[generator]` config section.
///
/// ```toml
/// [generator]
/// backend = "openai"
/// model = "gpt-4o-mini"
/// api_key_env = "OPENAI_API_KEY"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum GeneratorConfig {
    /// OpenAI (or compatible) chat completions.
    #[cfg(feature = "openai")]
    #[serde(rename = "openai")]
    OpenAI {
        #[serde(flatten)]
        credentials: ApiCredentials,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    /// Gemini `generateContent`.
    #[cfg(feature = "gemini")]
    Gemini {
        #[serde(flatten)]
        credentials: ApiCredentials,
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    /// A model served by a local Ollama instance.
    #[cfg(feature = "local")]
    Local {
        #[serde(default = "default_local_model")]
        model: String,
        #[serde(default)]
        host: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    /// Fixed answer, no network.
    Mock {
        #[serde(default)]
        answer: Option<String>,
    },
}

#[cfg(feature = "openai")]
fn default_openai_model() -> String {
    OpenAIConfig::DEFAULT_MODEL.to_string()
}

#[cfg(feature = "gemini")]
fn default_gemini_model() -> String {
    GeminiConfig::DEFAULT_MODEL.to_string()
}

#[cfg(feature = "local")]
fn default_local_model() -> String {
    LocalConfig::DEFAULT_MODEL.to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::Mock { answer: None }
    }
}

/// The generation backend chosen at startup.
pub enum GeneratorBackend {
    #[cfg(feature = "openai")]
    OpenAIChat(OpenAIChat),
    #[cfg(feature = "gemini")]
    GeminiChat(GeminiChat),
    #[cfg(feature = "local")]
    LocalModel(LocalModel),
    Mock(MockGenerator),
}

impl GeneratorBackend {
    /// Build the backend described by `config`, resolving credentials once.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](ragkit_core::RagError::ConfigError)
    /// for missing credentials and
    /// [`RagError::Generation`](ragkit_core::RagError::Generation) if the
    /// client cannot be created.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let backend = match config {
            #[cfg(feature = "openai")]
            GeneratorConfig::OpenAI { credentials, model, base_url, timeout_secs } => {
                let mut cfg = OpenAIConfig::new(credentials.resolve()?, model.clone());
                if let Some(url) = base_url {
                    cfg = cfg.with_base_url(url.clone());
                }
                if let Some(secs) = timeout_secs {
                    cfg = cfg.with_timeout(Duration::from_secs(*secs));
                }
                Self::OpenAIChat(OpenAIChat::new(cfg)?)
            }
            #[cfg(feature = "gemini")]
            GeneratorConfig::Gemini { credentials, model, base_url, timeout_secs } => {
                let mut cfg = GeminiConfig::new(credentials.resolve()?, model.clone());
                if let Some(url) = base_url {
                    cfg = cfg.with_base_url(url.clone());
                }
                if let Some(secs) = timeout_secs {
                    cfg = cfg.with_timeout(Duration::from_secs(*secs));
                }
                Self::GeminiChat(GeminiChat::new(cfg)?)
            }
            #[cfg(feature = "local")]
            GeneratorConfig::Local { model, host, timeout_secs } => {
                let mut cfg = LocalConfig::new(model.clone());
                if let Some(host) = host {
                    cfg = cfg.with_host(host.clone());
                }
                if let Some(secs) = timeout_secs {
                    cfg = cfg.with_timeout(Duration::from_secs(*secs));
                }
                Self::LocalModel(LocalModel::new(cfg)?)
            }
            GeneratorConfig::Mock { answer } => Self::Mock(match answer {
                Some(answer) => MockGenerator::new(answer.clone()),
                None => MockGenerator::default(),
            }),
        };
        info!(backend = backend.name(), model = backend.model(), "generator ready");
        Ok(backend)
    }

    /// Model identifier, or `"mock"` for the mock backend.
    pub fn model(&self) -> &str {
        match self {
            #[cfg(feature = "openai")]
            Self::OpenAIChat(g) => g.model(),
            #[cfg(feature = "gemini")]
            Self::GeminiChat(g) => g.model(),
            #[cfg(feature = "local")]
            Self::LocalModel(g) => g.model(),
            Self::Mock(_) => "mock",
        }
    }

    fn inner(&self) -> &dyn Generator {
        match self {
            #[cfg(feature = "openai")]
            Self::OpenAIChat(g) => g,
            #[cfg(feature = "gemini")]
            Self::GeminiChat(g) => g,
            #[cfg(feature = "local")]
            Self::LocalModel(g) => g,
            Self::Mock(g) => g,
        }
    }
}

#[async_trait]
impl Generator for GeneratorBackend {
    fn name(&self) -> &str {
        self.inner().name()
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.inner().generate(prompt, max_tokens).await
    }
}

impl std::fmt::Debug for GeneratorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorBackend")
            .field("backend", &self.name())
            .field("model", &self.model())
            .finish()
    }
}
