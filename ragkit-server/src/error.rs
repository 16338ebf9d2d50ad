//! Mapping of library errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ragkit_core::RagError;
use serde_json::json;
use tracing::{error, warn};

/// An error returned by a handler.
#[derive(Debug)]
pub enum ApiError {
    /// A failure from the retrieval or generation layer.
    Rag(RagError),
    /// The request itself was malformed.
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rag(err) => match err {
                RagError::InvalidArgument(_)
                | RagError::UnsupportedFormat { .. }
                | RagError::Loader { .. } => StatusCode::BAD_REQUEST,
                RagError::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                RagError::EmbeddingError { .. } | RagError::Generation { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                RagError::ConfigError(_) | RagError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self::Rag(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rag(err) => err.fmt(f),
            Self::BadRequest(message) => f.write_str(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(%status, error = %message, "request failed");
        } else {
            warn!(%status, error = %message, "request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
