//! Data types for documents, chunks, and search results.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// Store-assigned document identifier, monotonic in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored document: retrievable text plus metadata.
///
/// Documents are never edited in place once embedded. Only metadata may be
/// extended, through [`DocumentStore::add_metadata`](crate::DocumentStore::add_metadata).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier assigned at insertion.
    pub id: DocumentId,
    /// The text content that was embedded.
    pub content: String,
    /// Key-value metadata, e.g. the source path.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Content and metadata that have not been inserted yet.
///
/// Loaders produce these; [`DocumentStore::add_documents`](crate::DocumentStore::add_documents)
/// turns them into [`Document`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawDocument {
    /// The text content.
    pub content: String,
    /// Key-value metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RawDocument {
    /// Create a raw document without metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), metadata: HashMap::new() }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded slice of a larger text produced by a [`Chunker`](crate::Chunker).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The chunk text.
    pub text: String,
    /// Offset of the first character of the chunk in the source text, in characters.
    pub offset: usize,
    /// Boundary metadata chosen by the strategy (e.g. `header_path`).
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    pub(crate) fn new(text: impl Into<String>, offset: usize) -> Self {
        Self { text: text.into(), offset, metadata: HashMap::new() }
    }
}

/// A retrieved [`Document`] paired with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved document.
    pub document: Document,
    /// Cosine similarity in `[-1, 1]` (higher is more relevant).
    pub score: f32,
}
