//! Structured log events emitted by ingestion and query handling.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ragkit_core::{
    DocumentStore, Embedding, EmbeddingProvider, Generator, LexicalEmbeddingProvider, LoadSource,
    RagError, RagSystem, RawDocument, Result,
};
use ragkit_telemetry::EventCapture;

struct OfflineProvider;

#[async_trait]
impl EmbeddingProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn embed(&self, _text: &str) -> Result<Embedding> {
        Err(RagError::EmbeddingError { provider: "offline".into(), message: "no route".into() })
    }

    fn dimensions(&self) -> usize {
        8
    }
}

struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String> {
        Ok(prompt.to_string())
    }
}

#[tokio::test]
async fn insertion_reports_added_and_total() {
    let capture = EventCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    let store = DocumentStore::new(Arc::new(LexicalEmbeddingProvider::default()));
    store.add_document("first", HashMap::new()).await.unwrap();
    store
        .add_documents(vec![RawDocument::new("second"), RawDocument::new("third")])
        .await
        .unwrap();

    let added: Vec<_> =
        capture.events().into_iter().filter(|e| e.message == "documents added").collect();
    assert_eq!(added.len(), 2);
    assert_eq!(added[1].level, "INFO");
    assert_eq!(added[1].target, "ragkit_core::store");
    assert_eq!(added[1].fields["added"], 2);
    assert_eq!(added[1].fields["total"], 3);
}

#[tokio::test]
async fn failed_load_logs_the_embedding_error() {
    let capture = EventCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    let store = DocumentStore::new(Arc::new(OfflineProvider));
    let data = b"title,body\na,one\nb,two\nc,three\n".to_vec();
    assert!(store.load_documents(&LoadSource::bytes("rows.csv", data)).await.is_err());

    let failure = capture.find("embedding failed during insertion").unwrap();
    assert_eq!(failure.level, "ERROR");
    assert_eq!(failure.fields["document_count"], 3);
    assert!(failure.fields["error"].as_str().unwrap().contains("no route"));
    assert!(capture.find("documents added").is_none());
    assert!(capture.find("source loaded").is_none());
}

#[tokio::test]
async fn answered_query_reports_context_size() {
    let capture = EventCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    let system = RagSystem::builder()
        .embedding_provider(Arc::new(LexicalEmbeddingProvider::default()))
        .generator(Arc::new(EchoGenerator))
        .build()
        .unwrap();
    for text in ["borrow checker", "lifetimes", "traits", "macros"] {
        system.retriever().add_document(text, HashMap::new()).await.unwrap();
    }
    capture.clear();

    system.process_query("borrow checker rules", 20).await.unwrap();

    let retrieval = capture.find("retrieval completed").unwrap();
    assert_eq!(retrieval.fields["top_k"], 3);
    assert_eq!(retrieval.fields["result_count"], 3);
    let answered = capture.find("query answered").unwrap();
    assert_eq!(answered.fields["context_documents"], 3);
}
