//! HTTP embedding providers against a mock server.

#![cfg(all(feature = "openai", feature = "gemini", feature = "ollama"))]

use std::sync::Arc;
use std::time::Duration;

use ragkit_core::gemini::GeminiEmbeddingProvider;
use ragkit_core::ollama::OllamaEmbeddingProvider;
use ragkit_core::openai::OpenAIEmbeddingProvider;
use ragkit_core::{DocumentStore, EmbeddingProvider, RagError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn openai_orders_embeddings_by_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "text-embedding-3-small", "input": ["a", "b"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new("sk-test")
        .unwrap()
        .with_base_url(format!("{}/v1", server.uri()))
        .with_dimensions(2);
    let vectors = provider.embed_batch(&["a", "b"]).await.unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn openai_api_errors_become_embedding_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "rate limited" }
        })))
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new("sk-test").unwrap().with_base_url(server.uri());
    let err = provider.embed("hello").await.unwrap_err();
    match err {
        RagError::EmbeddingError { provider, message } => {
            assert_eq!(provider, "openai");
            assert!(message.contains("429"));
            assert!(message.contains("rate limited"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn openai_rejects_empty_key() {
    assert!(matches!(OpenAIEmbeddingProvider::new(""), Err(RagError::EmbeddingError { .. })));
}

#[tokio::test]
async fn malformed_provider_vectors_never_reach_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "index": 0, "embedding": [1.0, 2.0, 3.0] }]
        })))
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new("sk-test")
        .unwrap()
        .with_base_url(server.uri())
        .with_dimensions(8);
    let store = DocumentStore::new(Arc::new(provider));
    let err = store.add_document("text", Default::default()).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn slow_provider_hits_store_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [{ "index": 0, "embedding": [1.0] }] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new("sk-test")
        .unwrap()
        .with_base_url(server.uri())
        .with_dimensions(1);
    let store = DocumentStore::new(Arc::new(provider))
        .with_embed_timeout(Some(Duration::from_millis(100)));
    let err = store.add_document("text", Default::default()).await.unwrap_err();
    assert!(matches!(err, RagError::ProviderTimeout { operation, .. } if operation == "embedding"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn gemini_batch_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-embedding-001:batchEmbedContents"))
        .and(header("x-goog-api-key", "g-key"))
        .and(body_partial_json(json!({
            "requests": [
                {
                    "model": "models/gemini-embedding-001",
                    "content": { "parts": [{ "text": "hello" }] },
                    "taskType": "RETRIEVAL_DOCUMENT",
                    "outputDimensionality": 3
                }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [{ "values": [0.1, 0.2, 0.3] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiEmbeddingProvider::new("g-key")
        .unwrap()
        .with_base_url(server.uri())
        .with_output_dimensionality(3);
    assert_eq!(provider.dimensions(), 3);
    let vector = provider.embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn ollama_embed_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({ "model": "nomic-embed-text", "input": ["x", "y"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0], [0.0, 1.0]]
        })))
        .mount(&server)
        .await;

    let provider =
        OllamaEmbeddingProvider::new("nomic-embed-text", 2).unwrap().with_base_url(server.uri());
    let vectors = provider.embed_batch(&["x", "y"]).await.unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(provider.name(), "ollama");
}

#[tokio::test]
async fn ollama_server_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let provider =
        OllamaEmbeddingProvider::new("missing", 2).unwrap().with_base_url(server.uri());
    let err = provider.embed("x").await.unwrap_err();
    assert!(err.to_string().contains("model not found"));
}
