//! # ragkit-core
//!
//! Retrieval core for ragkit: chunk documents, embed them, keep them in an
//! in-memory store, and retrieve the top-k most similar ones for a query.
//!
//! ## Overview
//!
//! - [`Chunker`] implementations split text into [`Chunk`]s
//!   ([`FixedSizeChunker`], [`DelimiterChunker`], [`RecursiveChunker`],
//!   [`MarkdownChunker`]).
//! - [`EmbeddingProvider`] turns text into vectors. [`LexicalEmbeddingProvider`]
//!   works offline; OpenAI, Gemini and Ollama providers are feature-gated.
//! - [`DocumentStore`] holds documents and their embeddings as parallel arrays.
//! - [`Retriever`] ranks stored documents by cosine similarity.
//! - [`RagSystem`] builds a prompt from the retrieved context and calls a
//!   [`Generator`].
//! - [`loader`] turns text, JSON, CSV and PDF sources into documents.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit_core::{LexicalEmbeddingProvider, LoadSource, RagSystem};
//!
//! let system = RagSystem::builder()
//!     .embedding_provider(Arc::new(LexicalEmbeddingProvider::default()))
//!     .generator(generator)
//!     .build()?;
//!
//! system.retriever().load_documents(&LoadSource::path("docs/guide.md")).await?;
//! let answer = system.process_query("How do I configure it?", 150).await?;
//! ```
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `openai` | [`openai::OpenAIEmbeddingProvider`] (default) |
//! | `gemini` | [`gemini::GeminiEmbeddingProvider`] (default) |
//! | `ollama` | [`ollama::OllamaEmbeddingProvider`] (default) |
//! | `pdf` | PDF loading via `pdf-extract` |

pub mod chunking;
pub mod config;
mod deadline;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod lexical;
pub mod loader;
pub mod orchestrator;
pub mod retriever;
pub mod store;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{
    ChunkStrategy, Chunker, DelimiterChunker, FixedSizeChunker, LatexChunker, MarkdownChunker,
    RecursiveChunker, SentenceChunker,
};
pub use config::{ApiCredentials, BatchingConfig, EmbedderConfig, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, DocumentId, Embedding, RawDocument, SearchResult};
pub use embedding::{BatchedEmbedder, EmbeddingProvider};
pub use error::{RagError, Result};
pub use generator::Generator;
pub use lexical::LexicalEmbeddingProvider;
pub use loader::{LoadSource, SourceFormat};
pub use orchestrator::{RagSystem, RagSystemBuilder};
pub use retriever::{Retriever, cosine_similarity};
pub use store::DocumentStore;
