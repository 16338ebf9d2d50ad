//! Embedding provider trait for generating vector embeddings from text.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::debug;

use crate::document::Embedding;
use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (OpenAI, Gemini, Ollama,
/// the offline lexical embedder) behind a unified async interface. Providers
/// are deterministic for a fixed configuration: the same text always yields
/// the same vector. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The result has one vector per input, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Splits large batches into sub-batches and embeds them with bounded concurrency.
///
/// Results are reassembled in input order regardless of completion order.
///
/// # Example
///
/// ```rust,ignore
/// let provider = BatchedEmbedder::new(Arc::new(openai), 64, 4);
/// let vectors = provider.embed_batch(&texts).await?; // at most 4 requests in flight
/// ```
pub struct BatchedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    concurrency: usize,
}

impl BatchedEmbedder {
    /// Wrap `inner`. `batch_size` and `concurrency` are raised to at least 1.
    pub fn new(inner: Arc<dyn EmbeddingProvider>, batch_size: usize, concurrency: usize) -> Self {
        Self { inner, batch_size: batch_size.max(1), concurrency: concurrency.max(1) }
    }
}

#[async_trait]
impl EmbeddingProvider for BatchedEmbedder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.len() <= self.batch_size {
            return self.inner.embed_batch(texts).await;
        }

        debug!(
            provider = self.inner.name(),
            total = texts.len(),
            batch_size = self.batch_size,
            concurrency = self.concurrency,
            "embedding in sub-batches"
        );

        let requests: Vec<_> =
            texts.chunks(self.batch_size).map(|batch| self.inner.embed_batch(batch)).collect();
        let batches: Vec<Vec<Embedding>> =
            stream::iter(requests).buffered(self.concurrency).try_collect().await?;

        for (batch, vectors) in texts.chunks(self.batch_size).zip(&batches) {
            if vectors.len() != batch.len() {
                return Err(RagError::embedding(
                    self.inner.name(),
                    format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
                ));
            }
        }

        Ok(batches.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
