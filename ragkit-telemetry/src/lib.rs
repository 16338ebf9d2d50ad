//! # ragkit-telemetry
//!
//! Logging setup for ragkit binaries.
//!
//! [`init_telemetry`] installs a global `tracing` subscriber that writes to
//! stderr, either as human-readable text or as one JSON object per line.
//! The `RUST_LOG` environment variable overrides the configured level.
//!
//! ```rust,ignore
//! use ragkit_telemetry::{LogFormat, TelemetryConfig, init_telemetry};
//!
//! init_telemetry(&TelemetryConfig { format: LogFormat::Json, ..Default::default() })?;
//! tracing::info!(documents = 12, "store ready");
//! ```
//!
//! [`capture::EventCapture`] records events in memory for tests that assert
//! on log output.

pub mod capture;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use capture::{CaptureLayer, CapturedEvent, EventCapture};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// Newline-delimited JSON objects.
    Json,
}

/// Logging configuration, usually read from the `[logging]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `info`, `ragkit_core=debug`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Emit ANSI colours in text output.
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Text, ansi: true }
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },

    /// A global subscriber was already installed.
    #[error("telemetry already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Build the level filter: `RUST_LOG` if set, otherwise `config.level`.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
        directive: config.level.clone(),
        message: e.to_string(),
    })
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a malformed level and
/// [`TelemetryError::AlreadyInitialized`] if called twice.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    let json = (config.format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text = (config.format == LogFormat::Text).then(|| {
        tracing_subscriber::fmt::layer().with_ansi(config.ansi).with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_info_text() {
        let config: TelemetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TelemetryConfig::default());
    }

    #[test]
    fn config_parses_json_format() {
        let config: TelemetryConfig =
            serde_json::from_str(r#"{"level": "debug", "format": "json"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "debug");
        assert!(config.ansi);
    }

    #[test]
    fn second_init_is_rejected() {
        let config = TelemetryConfig { ansi: false, ..Default::default() };
        init_telemetry(&config).unwrap();
        assert!(matches!(init_telemetry(&config), Err(TelemetryError::AlreadyInitialized(_))));
    }
}
