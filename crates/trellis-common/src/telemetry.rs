//! Logging initialization
//!
//! Structured logging through `tracing-subscriber`:
//! - `RUST_LOG`-style filtering via `EnvFilter`, with a Trellis default
//! - JSON output for in-cluster runs, compact text for terminals
//! - Written to stderr so command output on stdout stays parseable

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,trellis=debug,kube=info,tower=warn,hyper=warn";

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Log line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Text,
    /// JSON objects with the current span
    Json,
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded on startup (e.g., "trellis")
    pub service_name: String,
    /// Output format
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "trellis".to_string(),
            format: LogFormat::default(),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

/// Initialize the global tracing subscriber
///
/// Fails if a subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::debug!(service = %config.service_name, "telemetry initialized");
    Ok(())
}
