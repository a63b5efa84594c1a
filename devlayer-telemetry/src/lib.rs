//! # devlayer Telemetry
//!
//! Logging setup, structured lifecycle events and prometheus metrics.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
