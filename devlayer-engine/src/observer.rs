//! Hook for recording what the processing context does.

use std::time::Duration;

use devlayer_core::events::Event;
use devlayer_telemetry::MetricsRecorder;

/// Receives a callback for every entry the processing context runs.
///
/// Callbacks execute on the processing context and must return quickly.
pub trait DispatchObserver: Send + Sync {
    fn on_event_dispatched(&self, _event: &Event, _elapsed: Duration) {}

    fn on_work_item_run(&self) {}

    fn on_handler_failure(&self, _event: &Event) {}

    fn on_queue_rejection(&self) {}
}

impl DispatchObserver for MetricsRecorder {
    fn on_event_dispatched(&self, _event: &Event, elapsed: Duration) {
        self.events_dispatched.inc();
        self.dispatch_latency.observe(elapsed.as_nanos() as f64);
    }

    fn on_work_item_run(&self) {
        self.work_items.inc();
    }

    fn on_handler_failure(&self, _event: &Event) {
        self.handler_failures.inc();
    }

    fn on_queue_rejection(&self) {
        self.queue_rejections.inc();
    }
}
