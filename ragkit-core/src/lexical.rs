//! Offline, deterministic bag-of-words embeddings.
//!
//! [`LexicalEmbeddingProvider`] hashes lower-cased alphanumeric tokens into a
//! fixed number of buckets (the "hashing trick") and L2-normalises the counts.
//! Texts that share words land close together under cosine similarity, which
//! is enough for demos, tests, and keyword-heavy corpora without an API key.

use async_trait::async_trait;

use crate::document::Embedding;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Feature-hashing embedder with no external dependencies.
#[derive(Debug, Clone)]
pub struct LexicalEmbeddingProvider {
    dimensions: usize,
    max_input_chars: Option<usize>,
}

impl LexicalEmbeddingProvider {
    /// Default number of hash buckets.
    pub const DEFAULT_DIMENSIONS: usize = 1024;

    /// Create a provider producing `dimensions`-long vectors.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::InvalidArgument(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimensions, max_input_chars: None })
    }

    /// Reject inputs longer than `limit` characters with an embedding error.
    pub fn with_max_input_chars(mut self, limit: usize) -> Self {
        self.max_input_chars = Some(limit);
        self
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token
            .bytes()
            .fold(FNV_OFFSET, |acc, b| (acc ^ u64::from(b)).wrapping_mul(FNV_PRIME));
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Result<Embedding> {
        if let Some(limit) = self.max_input_chars {
            let len = text.chars().count();
            if len > limit {
                return Err(RagError::embedding(
                    self.name(),
                    format!("input of {len} characters exceeds the {limit} character limit"),
                ));
            }
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            vector[self.bucket(&token.to_lowercase())] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

impl Default for LexicalEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: Self::DEFAULT_DIMENSIONS, max_input_chars: None }
    }
}

#[async_trait]
impl EmbeddingProvider for LexicalEmbeddingProvider {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.vectorize(text)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|text| self.vectorize(text)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::cosine_similarity;

    #[tokio::test]
    async fn same_text_gives_same_vector() {
        let provider = LexicalEmbeddingProvider::default();
        let a = provider.embed("Rust is fast").await.unwrap();
        let b = provider.embed("Rust is fast").await.unwrap();
        assert_eq!(a, b);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn tokens_are_case_insensitive() {
        let provider = LexicalEmbeddingProvider::default();
        let a = provider.embed("PYTHON language").await.unwrap();
        let b = provider.embed("python, Language!").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_text_is_the_zero_vector() {
        let provider = LexicalEmbeddingProvider::new(8).unwrap();
        let v = provider.embed("  ...  ").await.unwrap();
        assert_eq!(v, vec![0.0; 8]);
    }

    #[tokio::test]
    async fn oversize_input_is_an_embedding_error() {
        let provider = LexicalEmbeddingProvider::new(8).unwrap().with_max_input_chars(5);
        let err = provider.embed("too long for the limit").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { .. }));
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(LexicalEmbeddingProvider::new(0), Err(RagError::InvalidArgument(_))));
    }
}
