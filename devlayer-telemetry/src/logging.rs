//! ## devlayer-telemetry::logging
//! **Subscriber setup and structured lifecycle events**
//!
//! `RUST_LOG` wins over the configured default level.

use opentelemetry::KeyValue;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global fmt subscriber with the `info` default level.
    pub fn init() {
        Self::init_with_level("info")
    }

    /// Installs the global fmt subscriber. Later calls are ignored.
    pub fn init_with_level(default_level: &str) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init();
    }

    /// Records a stack lifecycle event (initialization, shutdown, loop
    /// start/stop) with its attributes.
    pub fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = tracing::info_span!(
            "lifecycle_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );
        let _entered = span.enter();

        tracing::info!(metadata = ?metadata, "Lifecycle event");
    }
}
