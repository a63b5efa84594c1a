//! ## devlayer-telemetry::metrics
//! **Prometheus registry for dispatch metrics**

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub events_dispatched: IntCounter,
    pub work_items: IntCounter,
    pub handler_failures: IntCounter,
    pub queue_rejections: IntCounter,
    pub dispatch_latency: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events_dispatched = IntCounter::new(
            "devlayer_events_dispatched_total",
            "Events routed through the dispatch pipeline",
        )?;
        let work_items = IntCounter::new(
            "devlayer_work_items_total",
            "Work items executed on the processing context",
        )?;
        let handler_failures = IntCounter::new(
            "devlayer_handler_failures_total",
            "Application handlers that failed or panicked",
        )?;
        let queue_rejections = IntCounter::new(
            "devlayer_queue_rejections_total",
            "Submissions rejected because the event queue was full",
        )?;
        let dispatch_latency = Histogram::with_opts(
            HistogramOpts::new(
                "devlayer_dispatch_latency_ns",
                "Time spent dispatching one event through all three stages",
            )
            .buckets(vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0]),
        )?;

        registry.register(Box::new(events_dispatched.clone()))?;
        registry.register(Box::new(work_items.clone()))?;
        registry.register(Box::new(handler_failures.clone()))?;
        registry.register(Box::new(queue_rejections.clone()))?;
        registry.register(Box::new(dispatch_latency.clone()))?;

        Ok(Self {
            registry,
            events_dispatched,
            work_items,
            handler_failures,
            queue_rejections,
            dispatch_latency,
        })
    }

    /// Renders the registry in the prometheus text format.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.events_dispatched.inc();
        metrics.events_dispatched.inc();
        metrics.dispatch_latency.observe(2_500.0);

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("devlayer_events_dispatched_total 2"));
        assert!(text.contains("devlayer_dispatch_latency_ns_count 1"));
    }

    #[test]
    fn recorders_are_independent() {
        let a = MetricsRecorder::new().unwrap();
        let b = MetricsRecorder::new().unwrap();
        a.work_items.inc();
        assert_eq!(a.work_items.get(), 1);
        assert_eq!(b.work_items.get(), 0);
    }
}
