//! # ragkit-model
//!
//! Text generation backends for ragkit.
//!
//! ## Overview
//!
//! Every backend implements [`ragkit_core::Generator`]:
//!
//! - [`OpenAIChat`] - OpenAI chat completions (or any compatible server)
//! - [`GeminiChat`] - Google Gemini `generateContent`
//! - [`LocalModel`] - models served by a local Ollama instance
//! - [`MockGenerator`] - fixed answers for tests and offline use
//!
//! [`GeneratorBackend`] picks one of these from a [`GeneratorConfig`] at
//! startup.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragkit_core::ApiCredentials;
//! use ragkit_model::{GeneratorBackend, GeneratorConfig};
//!
//! let generator = GeneratorBackend::from_config(&GeneratorConfig::OpenAI {
//!     credentials: ApiCredentials::env("OPENAI_API_KEY"),
//!     model: "gpt-4o-mini".into(),
//!     base_url: None,
//!     timeout_secs: Some(30),
//! })?;
//! let answer = generator.generate("Context: ...\n\nQuery: ...\n\nAnswer:", 150).await?;
//! ```

pub mod backend;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(any(feature = "openai", feature = "gemini", feature = "local"))]
mod http;
#[cfg(feature = "local")]
pub mod local;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use backend::{GeneratorBackend, GeneratorConfig};
#[cfg(feature = "gemini")]
pub use gemini::GeminiChat;
#[cfg(feature = "local")]
pub use local::LocalModel;
pub use mock::MockGenerator;
#[cfg(feature = "openai")]
pub use openai::OpenAIChat;
