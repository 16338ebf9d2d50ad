//! Generator backends against a mock HTTP server.

#![cfg(all(feature = "openai", feature = "gemini", feature = "local"))]

use ragkit_core::{ApiCredentials, Generator, RagError};
use ragkit_model::gemini::GeminiConfig;
use ragkit_model::local::LocalConfig;
use ragkit_model::openai::OpenAIConfig;
use ragkit_model::{GeminiChat, GeneratorBackend, GeneratorConfig, LocalModel, OpenAIChat};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROMPT: &str = "Context: Python is great\n\nQuery: What is Python?\n\nAnswer:";

#[tokio::test]
async fn openai_sends_single_user_message_with_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": PROMPT }],
            "max_tokens": 150
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "A programming language." } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = OpenAIConfig::new("sk-test", "gpt-4o-mini").with_base_url(format!("{}/v1", server.uri()));
    let model = OpenAIChat::new(config).unwrap();
    assert_eq!(model.generate(PROMPT, 150).await.unwrap(), "A programming language.");
}

#[tokio::test]
async fn openai_errors_carry_backend_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "invalid api key" }
        })))
        .mount(&server)
        .await;

    let model = OpenAIChat::new(OpenAIConfig::new("bad", "gpt-4o-mini").with_base_url(server.uri()))
        .unwrap();
    match model.generate(PROMPT, 10).await.unwrap_err() {
        RagError::Generation { backend, message } => {
            assert_eq!(backend, "openai");
            assert!(message.contains("invalid api key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn gemini_passes_max_output_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "g-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": PROMPT }] }],
            "generationConfig": { "maxOutputTokens": 64 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "A " }, { "text": "language." }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = GeminiChat::new(
        GeminiConfig::new("g-key", GeminiConfig::DEFAULT_MODEL).with_base_url(server.uri()),
    )
    .unwrap();
    assert_eq!(model.generate(PROMPT, 64).await.unwrap(), "A language.");
}

#[tokio::test]
async fn gemini_without_candidates_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let model =
        GeminiChat::new(GeminiConfig::new("g-key", "gemini-x").with_base_url(server.uri())).unwrap();
    assert!(matches!(model.generate(PROMPT, 5).await, Err(RagError::Generation { .. })));
}

#[tokio::test]
async fn local_model_uses_non_streaming_generate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(json!({
            "model": "llama3.2",
            "prompt": PROMPT,
            "stream": false,
            "options": { "num_predict": 150 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "response": "Python is a language.",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = LocalModel::new(LocalConfig::new("llama3.2").with_host(server.uri())).unwrap();
    assert_eq!(model.generate(PROMPT, 150).await.unwrap(), "Python is a language.");
}

#[tokio::test]
async fn backend_built_from_config_dispatches_to_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
        .mount(&server)
        .await;

    let config: GeneratorConfig = toml::from_str(&format!(
        "backend = \"local\"\nmodel = \"phi3\"\nhost = \"{}\"\ntimeout_secs = 5\n",
        server.uri()
    ))
    .unwrap();
    let backend = GeneratorBackend::from_config(&config).unwrap();
    assert_eq!(backend.name(), "local");
    assert_eq!(backend.model(), "phi3");
    assert_eq!(backend.generate(PROMPT, 3).await.unwrap(), "ok");
}

#[test]
fn openai_config_reads_key_from_named_env_var() {
    let config: GeneratorConfig = toml::from_str(
        "backend = \"openai\"\napi_key_env = \"RAGKIT_MODEL_TEST_UNSET_KEY\"\n",
    )
    .unwrap();
    assert_eq!(
        config,
        GeneratorConfig::OpenAI {
            credentials: ApiCredentials::env("RAGKIT_MODEL_TEST_UNSET_KEY"),
            model: OpenAIConfig::DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout_secs: None,
        }
    );
    assert!(matches!(GeneratorBackend::from_config(&config), Err(RagError::ConfigError(_))));
}

#[tokio::test]
async fn default_config_is_offline_mock() {
    let backend = GeneratorBackend::from_config(&GeneratorConfig::default()).unwrap();
    assert_eq!(backend.name(), "mock");
    assert!(!backend.generate(PROMPT, 10).await.unwrap().is_empty());
}

#[test]
fn empty_api_key_is_rejected() {
    assert!(OpenAIChat::new(OpenAIConfig::new("", "m")).is_err());
    assert!(GeminiChat::new(GeminiConfig::new("", "m")).is_err());
}
