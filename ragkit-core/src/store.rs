//! In-memory document store with parallel embedding storage.
//!
//! [`DocumentStore`] keeps documents in insertion order next to a parallel
//! array of embeddings, both behind a single `tokio::sync::RwLock`. Embedding
//! runs outside the lock; the append of documents and vectors happens in one
//! critical section, so the two arrays never diverge, even when several
//! callers insert concurrently.
//!
//! Each mutation embeds only the new documents and appends their vectors.
//! [`DocumentStore::rebuild_embeddings`] re-derives the whole matrix when a
//! full recomputation is wanted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::deadline::with_deadline;
use crate::document::{Document, DocumentId, Embedding, RawDocument, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::{self, LoadSource};
use crate::retriever::cosine_similarity;

#[derive(Debug, Default)]
struct StoreState {
    documents: Vec<Document>,
    embeddings: Vec<Embedding>,
}

/// An append-only, in-memory collection of embedded documents.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::{DocumentStore, LexicalEmbeddingProvider};
///
/// let store = DocumentStore::new(Arc::new(LexicalEmbeddingProvider::default()));
/// let id = store.add_document("Rust has no garbage collector", HashMap::new()).await?;
/// assert_eq!(store.len().await, 1);
/// ```
pub struct DocumentStore {
    provider: Arc<dyn EmbeddingProvider>,
    embed_timeout: Option<Duration>,
    state: RwLock<StoreState>,
}

impl DocumentStore {
    /// Create an empty store that embeds with `provider`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider, embed_timeout: None, state: RwLock::new(StoreState::default()) }
    }

    /// Fail embedding calls that take longer than `timeout`.
    pub fn with_embed_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// The embedding provider used for documents and queries.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Dimension D shared by every stored embedding.
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.documents.is_empty()
    }

    /// Snapshot of all documents in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.state.read().await.documents.clone()
    }

    /// Look up a document by id.
    pub async fn get(&self, id: DocumentId) -> Option<Document> {
        let state = self.state.read().await;
        state.documents.get(id.0 as usize).cloned()
    }

    /// Embed and append a single document.
    ///
    /// Nothing is appended if embedding fails.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the provider fails or returns a
    /// malformed vector, and [`RagError::ProviderTimeout`] if it exceeds the deadline.
    pub async fn add_document(
        &self,
        content: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> Result<DocumentId> {
        let raw = RawDocument { content: content.into(), metadata };
        let ids = self.add_documents(vec![raw]).await?;
        ids.into_iter().next().ok_or_else(|| {
            RagError::embedding(self.provider.name(), "no document was appended".to_string())
        })
    }

    /// Embed all `documents` in one batch call and append them together.
    ///
    /// Either every document is appended or none is.
    ///
    /// # Errors
    ///
    /// Same as [`add_document`](Self::add_document).
    pub async fn add_documents(&self, documents: Vec<RawDocument>) -> Result<Vec<DocumentId>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let embeddings = self.embed_texts(&texts).await.inspect_err(|e| {
            error!(document_count = documents.len(), error = %e, "embedding failed during insertion");
        })?;

        let mut state = self.state.write().await;
        let mut ids = Vec::with_capacity(documents.len());
        for (raw, embedding) in documents.into_iter().zip(embeddings) {
            let id = DocumentId(state.documents.len() as u64);
            state.documents.push(Document { id, content: raw.content, metadata: raw.metadata });
            state.embeddings.push(embedding);
            ids.push(id);
        }

        info!(added = ids.len(), total = state.documents.len(), "documents added");
        Ok(ids)
    }

    /// Load `source` with its format loader and insert every document it yields.
    ///
    /// All documents from the source are embedded in a single batch call.
    ///
    /// # Errors
    ///
    /// Loader errors ([`RagError::UnsupportedFormat`], [`RagError::Loader`],
    /// [`RagError::Io`]) and embedding errors abort the whole call without
    /// appending anything.
    pub async fn load_documents(&self, source: &LoadSource) -> Result<Vec<DocumentId>> {
        let documents = loader::load(source).await?;
        let ids = self.add_documents(documents).await?;
        info!(source = %source.name(), loaded = ids.len(), "source loaded");
        Ok(ids)
    }

    /// Attach a metadata entry to an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if no document has `id`.
    pub async fn add_metadata(
        &self,
        id: DocumentId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let document = state
            .documents
            .get_mut(id.0 as usize)
            .ok_or_else(|| RagError::InvalidArgument(format!("unknown document id {id}")))?;
        document.metadata.insert(key.into(), value.into());
        Ok(())
    }

    /// Re-embed every stored document and replace the embedding matrix.
    ///
    /// The old matrix stays in place if embedding fails. Documents appended
    /// while the rebuild is running keep the vectors they were inserted with.
    pub async fn rebuild_embeddings(&self) -> Result<()> {
        let contents: Vec<String> =
            self.state.read().await.documents.iter().map(|d| d.content.clone()).collect();
        if contents.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = contents.iter().map(String::as_str).collect();
        let embeddings = self.embed_texts(&texts).await?;

        let mut state = self.state.write().await;
        let rebuilt = embeddings.len();
        for (slot, embedding) in state.embeddings.iter_mut().zip(embeddings) {
            *slot = embedding;
        }
        info!(rebuilt, "embedding matrix rebuilt");
        Ok(())
    }

    /// Verify that documents and embeddings are parallel and every vector has dimension D.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] describing the first violation found.
    pub async fn check_invariants(&self) -> Result<()> {
        let state = self.state.read().await;
        if state.documents.len() != state.embeddings.len() {
            return Err(RagError::embedding(
                self.provider.name(),
                format!(
                    "{} documents but {} embeddings",
                    state.documents.len(),
                    state.embeddings.len()
                ),
            ));
        }
        let dimensions = self.dimensions();
        if let Some((index, vector)) =
            state.embeddings.iter().enumerate().find(|(_, v)| v.len() != dimensions)
        {
            return Err(RagError::embedding(
                self.provider.name(),
                format!("embedding {index} has dimension {}, expected {dimensions}", vector.len()),
            ));
        }
        Ok(())
    }

    /// Rank every stored document against `query` by cosine similarity.
    ///
    /// Results are ordered by descending score; equal scores keep insertion
    /// order. At most `top_k` results are returned.
    pub async fn search(&self, query: &[f32], top_k: usize) -> Vec<SearchResult> {
        let state = self.state.read().await;

        let mut scored: Vec<(usize, f32)> = state
            .embeddings
            .iter()
            .enumerate()
            .map(|(index, embedding)| (index, cosine_similarity(query, embedding)))
            .collect();
        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        debug!(candidates = state.documents.len(), returned = scored.len(), "similarity search");
        scored
            .into_iter()
            .map(|(index, score)| SearchResult { document: state.documents[index].clone(), score })
            .collect()
    }

    /// Embed `texts` under the configured deadline and validate the output.
    pub(crate) async fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let embeddings =
            with_deadline("embedding", self.embed_timeout, self.provider.embed_batch(texts))
                .await?;
        self.validate(texts.len(), &embeddings)?;
        Ok(embeddings)
    }

    fn validate(&self, expected: usize, embeddings: &[Embedding]) -> Result<()> {
        let provider = self.provider.name();
        if embeddings.len() != expected {
            return Err(RagError::embedding(
                provider,
                format!("expected {expected} embeddings, got {}", embeddings.len()),
            ));
        }
        let dimensions = self.dimensions();
        for vector in embeddings {
            if vector.len() != dimensions {
                return Err(RagError::embedding(
                    provider,
                    format!("expected dimension {dimensions}, got {}", vector.len()),
                ));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(RagError::embedding(provider, "embedding contains NaN or infinity"));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("provider", &self.provider.name())
            .field("embed_timeout", &self.embed_timeout)
            .finish_non_exhaustive()
    }
}
