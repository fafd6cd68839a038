//! Global CLI configuration
//!
//! Every flag has an environment fallback so the binary can run unattended
//! inside a pod as well as from a terminal.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

use trellis_common::kube_utils::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};
use trellis_common::telemetry::{LogFormat, TelemetryConfig};

use crate::commands::OutputFormat;

/// Log line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    /// Compact human-readable lines
    #[default]
    Text,
    /// JSON objects
    Json,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to kubeconfig file (default: in-cluster config or ~/.kube/config)
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Access token to act as; without one the kubeconfig identity acts as
    /// platform operator
    #[arg(long, env = "TRELLIS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Connect timeout for cluster API calls, in seconds
    #[arg(long, env = "TRELLIS_CONNECT_TIMEOUT", global = true, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
    pub connect_timeout: u64,

    /// Read timeout for cluster API calls, in seconds
    #[arg(long, env = "TRELLIS_READ_TIMEOUT", global = true, default_value_t = DEFAULT_READ_TIMEOUT.as_secs())]
    pub read_timeout: u64,

    /// Log output format
    #[arg(long, env = "TRELLIS_LOG_FORMAT", global = true, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl GlobalArgs {
    /// Telemetry settings for this invocation
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: "trellis-cli".to_string(),
            format: match self.log_format {
                LogFormatArg::Text => LogFormat::Text,
                LogFormatArg::Json => LogFormat::Json,
            },
            ..TelemetryConfig::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }
}
