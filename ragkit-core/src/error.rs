//! Error types for the `ragkit-core` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in retrieval and generation operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The source has a file extension no loader understands.
    #[error("Unsupported format: '{extension}'")]
    UnsupportedFormat {
        /// The offending extension (lower-cased, without the dot).
        extension: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A caller-supplied argument was out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An embedding or generation call did not finish before its deadline.
    #[error("{operation} timed out after {timeout:?}")]
    ProviderTimeout {
        /// The operation that was cut off (`"embedding"` or `"generation"`).
        operation: String,
        /// The deadline that expired.
        timeout: Duration,
    },

    /// The generation backend failed.
    #[error("Generation error ({backend}): {message}")]
    Generation {
        /// The generator backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A loader could not parse its input.
    #[error("Failed to load {format} source: {message}")]
    Loader {
        /// The format being parsed.
        format: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error while reading a source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into() }
    }

    pub(crate) fn loader(format: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Loader { format: format.into(), message: message.to_string() }
    }

    /// Create a generation error for the named backend.
    pub fn generation(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation { backend: backend.into(), message: message.into() }
    }
}

/// A convenience result type for ragkit operations.
pub type Result<T> = std::result::Result<T, RagError>;
