//! # Sentinel Telemetry
//!
//! Structured logging setup for the security pipeline. Every pipeline
//! decision (acceptance, rejection, shutdown) is emitted as a `tracing` event
//! with structured fields; this crate owns the subscriber configuration.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SENTINEL_LOG_LEVEL` or `RUST_LOG` | `info` | Log level filter |
//! | `SENTINEL_JSON_LOGS` | `false` | JSON-formatted log lines |
//! | `SENTINEL_SERVICE_NAME` | `agent-sentinel` | Service name field |

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Telemetry initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("tracing subscriber already initialized: {0}")]
    AlreadyInitialized(String),

    /// The configured filter directive did not parse.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Telemetry configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines.
    pub service_name: String,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
    /// Emit JSON-formatted log lines.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "agent-sentinel".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("SENTINEL_SERVICE_NAME")
                .unwrap_or_else(|_| "agent-sentinel".to_string()),
            log_level: std::env::var("SENTINEL_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
            json_logs: std::env::var("SENTINEL_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Call once at process start; returns an error (rather than panicking) if a
/// subscriber is already installed, so tests can call it freely.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "telemetry initialized"
    );
    Ok(())
}
