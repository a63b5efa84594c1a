//! Observability configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Telemetry configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TelemetryConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Record dispatch metrics in the prometheus registry.
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_true() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            enable_metrics: default_true(),
        }
    }
}
