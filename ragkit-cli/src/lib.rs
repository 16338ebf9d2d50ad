//! # ragkit-cli
//!
//! Configuration loading and system assembly for the `ragkit` binary.
//!
//! A single TOML file drives every section; all of them are optional:
//!
//! ```toml
//! [rag]
//! top_k = 3
//! max_output_tokens = 150
//!
//! [chunking]
//! strategy = "recursive"
//! size = 800
//! overlap = 80
//!
//! [embedder]
//! provider = "openai"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [generator]
//! backend = "local"
//! model = "llama3.2"
//!
//! [server]
//! addr = "0.0.0.0:8080"
//!
//! [logging]
//! level = "ragkit_core=debug,info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use ragkit_core::{ChunkStrategy, EmbedderConfig, LoadSource, RagConfig, RagSystem};
use ragkit_model::{GeneratorBackend, GeneratorConfig};
use ragkit_server::ServerConfig;
use ragkit_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rag: RagConfig,
    /// Split loaded files before embedding; files are stored whole when unset.
    pub chunking: Option<ChunkStrategy>,
    pub embedder: EmbedderConfig,
    pub generator: GeneratorConfig,
    pub server: ServerConfig,
    pub logging: TelemetryConfig,
}

impl AppConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.rag.validate()?;
        Ok(config)
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Assemble a [`RagSystem`] from the embedder, generator and chunking sections.
    pub fn build_system(&self) -> anyhow::Result<RagSystem> {
        let provider = self.embedder.build().context("failed to build embedder")?;
        let generator =
            GeneratorBackend::from_config(&self.generator).context("failed to build generator")?;
        info!(embedder = provider.name(), generator = %generator.model(), "system assembled");

        let mut builder = RagSystem::builder()
            .config(self.rag.clone())
            .embedding_provider(provider)
            .generator(Arc::new(generator));
        if let Some(strategy) = &self.chunking {
            builder = builder.chunker(strategy.build()?);
        }
        Ok(builder.build()?)
    }
}

/// Load every file in `paths` into `system`, returning the number of stored documents.
pub async fn load_files(system: &RagSystem, paths: &[PathBuf]) -> anyhow::Result<usize> {
    let mut total = 0;
    for path in paths {
        let ids = system
            .retriever()
            .load_documents(&LoadSource::path(path))
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        total += ids.len();
    }
    Ok(total)
}
