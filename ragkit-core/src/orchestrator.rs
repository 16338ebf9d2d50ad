//! RAG orchestrator: retrieve context, build a prompt, generate an answer.
//!
//! [`RagSystem`] composes a [`Retriever`] with a [`Generator`]. Each query
//! is embedded once, the top-k documents are joined into a `Context:` block,
//! and the rendered prompt is handed to the generator with the caller's
//! token budget.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit_core::{LexicalEmbeddingProvider, LoadSource, RagConfig, RagSystem};
//!
//! let system = RagSystem::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(LexicalEmbeddingProvider::default()))
//!     .generator(Arc::new(my_generator))
//!     .build()?;
//!
//! system.retriever().load_documents(&LoadSource::path("faq.json")).await?;
//! let answer = system.process_query("What is Python?", 150).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::deadline::with_deadline;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generator::Generator;
use crate::retriever::Retriever;
use crate::store::DocumentStore;

/// The retrieval-augmented generation orchestrator.
///
/// Construct one via [`RagSystem::builder()`].
pub struct RagSystem {
    config: RagConfig,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
}

impl RagSystem {
    /// Create a new [`RagSystemBuilder`].
    pub fn builder() -> RagSystemBuilder {
        RagSystemBuilder::default()
    }

    /// Return a reference to the system configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The retriever, for ingestion and direct retrieval.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// The generator backend.
    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    /// Answer `query` using the configured `top_k` documents as context.
    ///
    /// The generator's answer is returned verbatim. With an empty store the
    /// prompt carries an empty context.
    ///
    /// # Errors
    ///
    /// Retrieval and generator errors propagate unchanged; a generation
    /// call that exceeds the configured deadline yields
    /// [`RagError::ProviderTimeout`].
    pub async fn process_query(&self, query: &str, max_output_tokens: u32) -> Result<String> {
        if max_output_tokens == 0 {
            return Err(RagError::InvalidArgument(
                "max_output_tokens must be greater than zero".to_string(),
            ));
        }

        let documents = self.retriever.retrieve(query, self.config.top_k).await.inspect_err(|e| {
            error!(error = %e, "retrieval failed during query");
        })?;
        let prompt = Self::build_prompt(query, &documents);

        let answer = with_deadline(
            "generation",
            self.config.generate_timeout(),
            self.generator.generate(&prompt, max_output_tokens),
        )
        .await
        .inspect_err(|e| {
            error!(generator = self.generator.name(), error = %e, "generation failed");
        })?;

        info!(
            context_documents = documents.len(),
            prompt_len = prompt.len(),
            answer_len = answer.len(),
            "query answered"
        );
        Ok(answer)
    }

    /// Render the generation prompt for `query` over `documents` in rank order.
    ///
    /// Document contents are joined with a single space:
    ///
    /// ```text
    /// Context: <doc1> <doc2> ...
    ///
    /// Query: <query>
    ///
    /// Answer:
    /// ```
    pub fn build_prompt(query: &str, documents: &[Document]) -> String {
        let context =
            documents.iter().map(|d| d.content.as_str()).collect::<Vec<_>>().join(" ");
        format!("Context: {context}\n\nQuery: {query}\n\nAnswer:")
    }
}

impl std::fmt::Debug for RagSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagSystem")
            .field("config", &self.config)
            .field("retriever", &self.retriever)
            .field("generator", &self.generator.name())
            .finish()
    }
}

/// Builder for constructing a [`RagSystem`].
///
/// A `generator` and either an `embedding_provider` or a prebuilt `store`
/// are required; `config` defaults to [`RagConfig::default()`] and `chunker`
/// is optional. A store created from an embedding provider gets the
/// configured embed timeout; a prebuilt store is used as-is.
///
/// # Example
///
/// ```rust,ignore
/// let system = RagSystem::builder()
///     .config(RagConfig::builder().top_k(5).build()?)
///     .embedding_provider(Arc::new(LexicalEmbeddingProvider::default()))
///     .chunker(Arc::new(RecursiveChunker::new(1000, 0)?))  // optional
///     .generator(Arc::new(generator))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagSystemBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<DocumentStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    generator: Option<Arc<dyn Generator>>,
}

impl RagSystemBuilder {
    /// Set the system configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used to create a fresh store.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Use an existing document store instead of creating one.
    pub fn store(mut self, store: Arc<DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the chunker applied to loaded sources.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the generator backend.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`RagSystem`], validating the configuration and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// the configuration is invalid.
    pub fn build(self) -> Result<RagSystem> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;
        let store = match (self.store, self.embedding_provider) {
            (Some(store), _) => store,
            (None, Some(provider)) => {
                Arc::new(DocumentStore::new(provider).with_embed_timeout(config.embed_timeout()))
            }
            (None, None) => {
                return Err(RagError::ConfigError(
                    "embedding_provider or store is required".to_string(),
                ));
            }
        };
        let mut retriever = Retriever::new(store);
        if let Some(chunker) = self.chunker {
            retriever = retriever.with_chunker(chunker);
        }

        Ok(RagSystem { config, retriever, generator })
    }
}
