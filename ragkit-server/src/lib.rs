//! # ragkit-server
//!
//! HTTP front end over a [`RagSystem`].
//!
//! | Route | Body | Response |
//! |-------|------|----------|
//! | `POST /query` | `{"text", "max_tokens"?}` | `{"result"}` |
//! | `POST /documents` | `{"content", "metadata"?}` | `{"id"}` |
//! | `POST /upload` | multipart `file` | `{"loaded", "ids"}` |
//! | `GET /health` | | `{"status", "documents"}` |
//!
//! Failures are returned as `{"error": "..."}` with a status code derived
//! from the [`RagError`](ragkit_core::RagError) variant.
//!
//! ```rust,ignore
//! let state = AppState::new(Arc::new(system));
//! ragkit_server::serve(create_app(state, &ServerConfig::default()), "127.0.0.1:8080").await?;
//! ```

pub mod error;
pub mod rest;

use std::sync::Arc;

use ragkit_core::RagSystem;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

pub use error::ApiError;
pub use rest::create_app;

/// Server settings, usually read from the `[server]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub addr: String,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: "127.0.0.1:8080".to_string(), max_body_bytes: 10 * 1024 * 1024 }
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The system every request queries and loads into.
    pub system: Arc<RagSystem>,
}

impl AppState {
    /// Wrap a shared system for the router.
    pub fn new(system: Arc<RagSystem>) -> Self {
        Self { system }
    }
}

/// Bind `addr` and serve `app` until the process is stopped.
pub async fn serve(app: axum::Router, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "ragkit server listening");
    axum::serve(listener, app).await
}
