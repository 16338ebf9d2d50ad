//! Top-k similarity retrieval over a [`DocumentStore`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::chunking::Chunker;
use crate::document::{Document, DocumentId, RawDocument, SearchResult};
use crate::error::{RagError, Result};
use crate::loader::{self, LoadSource};
use crate::store::DocumentStore;

/// Metadata key holding a chunk's position within its source document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// Metadata key holding a chunk's character offset within its source document.
pub const CHUNK_OFFSET_KEY: &str = "chunk_offset";

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    // f64 accumulation: squares of large finite f32 components overflow f32.
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() { similarity.clamp(-1.0, 1.0) as f32 } else { 0.0 }
}

/// Embeds queries and ranks stored documents by cosine similarity.
///
/// The retriever also fronts ingestion: documents loaded through it are
/// passed through the optional [`Chunker`] before insertion.
///
/// # Example
///
/// ```rust,ignore
/// let retriever = Retriever::new(Arc::new(store)).with_chunker(chunker);
/// retriever.load_documents(&LoadSource::path("notes.md")).await?;
/// let top = retriever.retrieve("how do I install it?", 3).await?;
/// ```
#[derive(Clone)]
pub struct Retriever {
    store: Arc<DocumentStore>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl Retriever {
    /// Create a retriever over `store` that inserts loaded documents unchunked.
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store, chunker: None }
    }

    /// Split loaded documents with `chunker` before inserting them.
    pub fn with_chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// The underlying document store.
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Return the `top_k` documents most similar to `query`, best first.
    ///
    /// The result holds `min(top_k, store size)` documents. Ties are broken by
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `top_k` is zero, and
    /// propagates embedding errors and timeouts for the query embedding.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Document>> {
        let results = self.retrieve_scored(query, top_k).await?;
        Ok(results.into_iter().map(|r| r.document).collect())
    }

    /// Like [`retrieve`](Self::retrieve), but keeps the similarity scores.
    pub async fn retrieve_scored(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::InvalidArgument("top_k must be greater than zero".to_string()));
        }
        if self.store.is_empty().await {
            debug!("retrieval against empty store");
            return Ok(Vec::new());
        }

        let embeddings = self.store.embed_texts(&[query]).await?;
        let query_embedding = embeddings.into_iter().next().ok_or_else(|| {
            RagError::embedding(self.store.provider().name(), "no query embedding returned")
        })?;

        let results = self.store.search(&query_embedding, top_k).await;
        info!(top_k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Embed and insert a single document without chunking it.
    pub async fn add_document(
        &self,
        content: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> Result<DocumentId> {
        self.store.add_document(content, metadata).await
    }

    /// Load `source`, chunk each document if a chunker is set, and insert the result.
    ///
    /// Chunks inherit their document's metadata plus the chunker's boundary
    /// metadata, a `chunk_index` and a `chunk_offset` (character offset into
    /// the source document). Everything from the source is embedded in one
    /// batch call; any failure leaves the store unchanged.
    pub async fn load_documents(&self, source: &LoadSource) -> Result<Vec<DocumentId>> {
        let documents = loader::load(source).await?;
        let documents = match &self.chunker {
            Some(chunker) => split_documents(chunker.as_ref(), documents),
            None => documents,
        };
        let ids = self.store.add_documents(documents).await?;
        info!(source = %source.name(), loaded = ids.len(), "source loaded");
        Ok(ids)
    }
}

fn split_documents(chunker: &dyn Chunker, documents: Vec<RawDocument>) -> Vec<RawDocument> {
    documents
        .into_iter()
        .flat_map(|document| {
            chunker.chunk(&document.content).into_iter().enumerate().map(move |(i, chunk)| {
                let mut metadata = document.metadata.clone();
                metadata.extend(chunk.metadata);
                metadata.insert(CHUNK_INDEX_KEY.to_string(), i.to_string());
                metadata.insert(CHUNK_OFFSET_KEY.to_string(), chunk.offset.to_string());
                RawDocument { content: chunk.text, metadata }
            })
        })
        .collect()
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("store", &self.store)
            .field("chunked", &self.chunker.is_some())
            .finish()
    }
}
