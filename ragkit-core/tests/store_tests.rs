//! Document store and retriever behaviour over the offline lexical embedder.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use proptest::prelude::*;
use ragkit_core::{
    DocumentId, DocumentStore, Embedding, EmbeddingProvider, LexicalEmbeddingProvider, LoadSource,
    RagError, RawDocument, Result, Retriever, cosine_similarity,
};

fn lexical_store() -> Arc<DocumentStore> {
    Arc::new(DocumentStore::new(Arc::new(LexicalEmbeddingProvider::default())))
}

/// Provider that fails every call and counts how often it was asked.
#[derive(Default)]
struct FailingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RagError::EmbeddingError { provider: "failing".into(), message: "offline".into() })
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Provider that returns vectors of the wrong size.
struct WrongDimensionProvider;

#[async_trait]
impl EmbeddingProvider for WrongDimensionProvider {
    fn name(&self) -> &str {
        "wrong-dim"
    }

    async fn embed(&self, _text: &str) -> Result<Embedding> {
        Ok(vec![1.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// Lexical provider wrapper that counts single and batch calls separately.
#[derive(Default)]
struct CountingProvider {
    inner: LexicalEmbeddingProvider,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Provider returning fixed vectors keyed by the leading word of the text.
struct FixedVectorProvider;

#[async_trait]
impl EmbeddingProvider for FixedVectorProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(match text.split_whitespace().next() {
            Some("big") => vec![1e20, 1.0, 0.0],
            Some("mixed") => vec![1e20, 0.0, 1e20],
            _ => vec![0.0, 0.0, 1.0],
        })
    }

    fn dimensions(&self) -> usize {
        3
    }
}

#[tokio::test]
async fn add_document_appends_last_and_keeps_arrays_parallel() {
    let store = lexical_store();
    for (i, text) in ["alpha", "beta gamma", ""].into_iter().enumerate() {
        let metadata = HashMap::from([("n".to_string(), i.to_string())]);
        let id = store.add_document(text, metadata.clone()).await.unwrap();

        let documents = store.documents().await;
        let last = documents.last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.content, text);
        assert_eq!(last.metadata, metadata);
        store.check_invariants().await.unwrap();
    }
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn ids_follow_insertion_order() {
    let store = lexical_store();
    let ids = store
        .add_documents(vec![RawDocument::new("one"), RawDocument::new("two")])
        .await
        .unwrap();
    let third = store.add_document("three", HashMap::new()).await.unwrap();
    assert_eq!(ids, vec![DocumentId(0), DocumentId(1)]);
    assert_eq!(third, DocumentId(2));
    assert_eq!(store.get(DocumentId(1)).await.unwrap().content, "two");
    assert!(store.get(DocumentId(7)).await.is_none());
}

#[tokio::test]
async fn failed_embedding_leaves_store_untouched() {
    let provider = Arc::new(FailingProvider::default());
    let store = DocumentStore::new(provider.clone());

    let err = store.add_document("anything", HashMap::new()).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));

    let batch = vec![RawDocument::new("a"), RawDocument::new("b"), RawDocument::new("c")];
    assert!(store.add_documents(batch).await.is_err());

    assert!(store.is_empty().await);
    store.check_invariants().await.unwrap();
}

#[tokio::test]
async fn wrong_dimension_is_rejected_before_append() {
    let store = DocumentStore::new(Arc::new(WrongDimensionProvider));
    let err = store.add_document("text", HashMap::new()).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { provider, .. } if provider == "wrong-dim"));
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn add_metadata_updates_existing_documents_only() {
    let store = lexical_store();
    let id = store.add_document("text", HashMap::new()).await.unwrap();
    store.add_metadata(id, "lang", "en").await.unwrap();
    assert_eq!(store.get(id).await.unwrap().metadata["lang"], "en");

    let err = store.add_metadata(DocumentId(42), "lang", "en").await.unwrap_err();
    assert!(matches!(err, RagError::InvalidArgument(_)));
}

#[tokio::test]
async fn rebuild_embeddings_preserves_ranking() {
    let store = lexical_store();
    store
        .add_documents(vec![RawDocument::new("red apples"), RawDocument::new("green pears")])
        .await
        .unwrap();
    let retriever = Retriever::new(store.clone());
    let before = retriever.retrieve_scored("apples", 2).await.unwrap();

    store.rebuild_embeddings().await.unwrap();
    store.check_invariants().await.unwrap();

    let after = retriever.retrieve_scored("apples", 2).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn concurrent_inserts_never_diverge() {
    let store = lexical_store();
    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.add_document(format!("document number {i}"), HashMap::new()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.len().await, 16);
    store.check_invariants().await.unwrap();
    let documents = store.documents().await;
    for (index, document) in documents.iter().enumerate() {
        assert_eq!(document.id, DocumentId(index as u64));
    }
}

#[tokio::test]
async fn closest_document_is_ranked_first() {
    let store = lexical_store();
    store
        .add_documents(vec![
            RawDocument::new("Cats sleep all day"),
            RawDocument::new("Rust enforces ownership rules at compile time"),
            RawDocument::new("Bread needs flour and water"),
        ])
        .await
        .unwrap();

    let results = Retriever::new(store).retrieve("rust ownership rules", 3).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].id, DocumentId(1));
}

#[tokio::test]
async fn identical_text_has_similarity_one() {
    let provider = LexicalEmbeddingProvider::default();
    let a = provider.embed("the same sentence twice").await.unwrap();
    let b = provider.embed("the same sentence twice").await.unwrap();
    assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn empty_store_returns_nothing_without_embedding() {
    let provider = Arc::new(FailingProvider::default());
    let retriever = Retriever::new(Arc::new(DocumentStore::new(provider.clone())));
    for top_k in [1, 3, 100] {
        assert!(retriever.retrieve("anything", top_k).await.unwrap().is_empty());
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn top_k_is_capped_by_store_size() {
    let store = lexical_store();
    store
        .add_documents(vec![
            RawDocument::new("first"),
            RawDocument::new("second"),
            RawDocument::new("third"),
        ])
        .await
        .unwrap();
    let results = Retriever::new(store).retrieve("first", 10).await.unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn zero_top_k_is_invalid() {
    let retriever = Retriever::new(lexical_store());
    let err = retriever.retrieve("query", 0).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidArgument(_)));
}

#[tokio::test]
async fn ties_keep_insertion_order() {
    let store = lexical_store();
    store
        .add_documents(vec![
            RawDocument::new("unrelated words"),
            RawDocument::new("duplicate"),
            RawDocument::new("duplicate"),
            RawDocument::new(""),
        ])
        .await
        .unwrap();
    let results = Retriever::new(store).retrieve_scored("duplicate", 4).await.unwrap();
    let ids: Vec<u64> = results.iter().map(|r| r.document.id.0).collect();
    assert_eq!(&ids[..2], &[1, 2]);
    // Zero-norm content scores 0 and ranks with the other non-matches, in insertion order.
    assert_eq!(&ids[2..], &[0, 3]);
    assert_eq!(results[3].score, 0.0);
}

#[tokio::test]
async fn python_documents_rank_above_dog_document() {
    let store = lexical_store();
    store
        .add_documents(vec![
            RawDocument::new("Python is great"),
            RawDocument::new("Dogs are loyal"),
            RawDocument::new("Python snakes are reptiles"),
        ])
        .await
        .unwrap();

    let results =
        Retriever::new(store).retrieve("Tell me about the Python language", 2).await.unwrap();
    let contents: Vec<&str> = results.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(contents.len(), 2);
    assert!(contents.contains(&"Python is great"));
    assert!(contents.contains(&"Python snakes are reptiles"));
}

#[tokio::test]
async fn loading_json_records_appends_in_file_order() {
    let records: Vec<serde_json::Value> = (0..5)
        .map(|i| serde_json::json!({ "content": format!("record {i}"), "metadata": { "n": i } }))
        .collect();
    let data = serde_json::to_vec(&records).unwrap();

    let store = lexical_store();
    store.add_document("already here", HashMap::new()).await.unwrap();
    let ids = store.load_documents(&LoadSource::bytes("records.json", data)).await.unwrap();

    assert_eq!(ids.len(), 5);
    let documents = store.documents().await;
    for (i, id) in ids.iter().enumerate() {
        let document = &documents[id.0 as usize];
        assert_eq!(document.content, format!("record {i}"));
        assert_eq!(document.metadata["n"], i.to_string());
        assert_eq!(document.metadata["source"], "records.json");
    }
    store.check_invariants().await.unwrap();
}

#[tokio::test]
async fn unsupported_source_appends_nothing() {
    let store = lexical_store();
    let err = store.load_documents(&LoadSource::bytes("slides.pptx", vec![1, 2, 3])).await;
    assert!(matches!(err, Err(RagError::UnsupportedFormat { extension }) if extension == "pptx"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn loading_a_source_embeds_in_one_batch_call() {
    let data = serde_json::to_vec(&serde_json::json!([
        { "content": "first record" },
        { "content": "second record" },
        { "content": "third record" },
    ]))
    .unwrap();
    let provider = Arc::new(CountingProvider::default());
    let store = DocumentStore::new(provider.clone());

    let ids = store.load_documents(&LoadSource::bytes("records.json", data)).await.unwrap();

    assert_eq!(ids.len(), 3);
    assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.single_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn embedding_failure_while_loading_appends_nothing() {
    let data = br#"[{"content": "a"}, {"content": "b"}, {"content": "c"}]"#.to_vec();
    let store = DocumentStore::new(Arc::new(FailingProvider::default()));

    let err = store.load_documents(&LoadSource::bytes("records.json", data)).await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { provider, .. } if provider == "failing"));
    assert!(store.is_empty().await);
    store.check_invariants().await.unwrap();
}

#[tokio::test]
async fn large_magnitude_embeddings_rank_deterministically() {
    let store = Arc::new(DocumentStore::new(Arc::new(FixedVectorProvider)));
    store
        .add_documents(
            ["big 0", "small 1", "mixed 2", "big 3", "small 4"]
                .into_iter()
                .map(RawDocument::new)
                .collect(),
        )
        .await
        .unwrap();

    let results = Retriever::new(store).retrieve_scored("big query", 5).await.unwrap();

    let ids: Vec<u64> = results.iter().map(|r| r.document.id.0).collect();
    assert_eq!(ids, [0, 3, 2, 1, 4]);
    for result in &results {
        assert!(result.score.is_finite());
        assert!((-1.0..=1.0).contains(&result.score));
    }
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert!((results[2].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
}

fn arb_contents() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-e]{1,3}( [a-e]{1,3}){0,4}", 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn retrieval_is_sorted_and_bounded(contents in arb_contents(), query in "[a-e]{1,3}( [a-e]{1,3}){0,3}", top_k in 1usize..16) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (results, stored) = rt.block_on(async {
            let store = lexical_store();
            let raw = contents.iter().map(RawDocument::new).collect();
            store.add_documents(raw).await.unwrap();
            let results = Retriever::new(store.clone()).retrieve_scored(&query, top_k).await.unwrap();
            (results, store.len().await)
        });

        prop_assert_eq!(results.len(), top_k.min(stored));
        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].document.id < pair[1].document.id);
            }
        }
    }
}
