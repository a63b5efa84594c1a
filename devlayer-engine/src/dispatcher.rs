//! Three-stage dispatch pipeline.
//!
//! Every event passes through the system layer, then the device layer, then
//! the application layer, exactly once each and in that order. The pipeline
//! itself holds no per-event state.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use devlayer_core::events::Event;
use devlayer_core::platform::{DeviceLayerComponent, Platform};
use devlayer_core::registry::{EventHandlerRegistry, ForEachAction};
use devlayer_core::stats::DispatchStats;

use crate::observer::DispatchObserver;

pub struct EventDispatcher {
    platform: Arc<dyn Platform>,
    registry: Arc<EventHandlerRegistry>,
    components: Vec<Arc<dyn DeviceLayerComponent>>,
    stats: Arc<DispatchStats>,
    observer: Option<Arc<dyn DispatchObserver>>,
}

impl EventDispatcher {
    pub fn new(
        platform: Arc<dyn Platform>,
        registry: Arc<EventHandlerRegistry>,
        components: Vec<Arc<dyn DeviceLayerComponent>>,
        stats: Arc<DispatchStats>,
        observer: Option<Arc<dyn DispatchObserver>>,
    ) -> Self {
        Self {
            platform,
            registry,
            components,
            stats,
            observer,
        }
    }

    /// Routes `event` through all three stages.
    pub fn dispatch_event(&self, event: &Event) {
        let started = Instant::now();
        trace!(event_type = %event.event_type(), "Dispatching event");

        self.dispatch_to_system_layer(event);
        self.dispatch_to_device_layer(event);
        self.dispatch_to_application(event);

        self.stats.increment_events_dispatched();
        if let Some(observer) = &self.observer {
            observer.on_event_dispatched(event, started.elapsed());
        }
    }

    pub fn dispatch_to_system_layer(&self, event: &Event) {
        self.isolate(event, "platform system layer", || {
            self.platform.dispatch_to_system_layer(event)
        });
    }

    /// Device-layer components in registration order, then the platform's
    /// own device-layer hook. A panicking component is logged and counted;
    /// the rest of the stage still runs.
    pub fn dispatch_to_device_layer(&self, event: &Event) {
        for component in &self.components {
            trace!(component = component.name(), "Device layer component");
            self.isolate(event, component.name(), || component.on_platform_event(event));
        }
        self.isolate(event, "platform device layer", || {
            self.platform.dispatch_to_device_layer(event)
        });
    }

    fn isolate<F: FnOnce()>(&self, event: &Event, stage: &str, run: F) {
        if panic::catch_unwind(AssertUnwindSafe(run)).is_err() {
            warn!(event_type = %event.event_type(), stage, "Device layer stage panicked");
            self.record_handler_failure(event);
        }
    }

    /// Calls every registered application handler in registration order.
    ///
    /// Internal events stop here without reaching any handler. A handler that
    /// returns an error or panics is logged and counted; the remaining
    /// handlers still run.
    pub fn dispatch_to_application(&self, event: &Event) {
        let event_type = event.event_type();
        if event_type.is_internal() {
            trace!(%event_type, "Internal event withheld from application");
            return;
        }

        let mut delivered = 0usize;
        self.registry.for_each(|entry| {
            delivered += 1;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| entry.handler().call(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(%event_type, handler = ?entry.handler(), "Application event handler failed: {err}");
                    self.record_handler_failure(event);
                }
                Err(_) => {
                    warn!(%event_type, handler = ?entry.handler(), "Application event handler panicked");
                    self.record_handler_failure(event);
                }
            }
            ForEachAction::Continue
        });
        debug!(%event_type, handlers = delivered, "Event delivered to application");
    }

    fn record_handler_failure(&self, event: &Event) {
        self.stats.increment_handler_failures();
        if let Some(observer) = &self.observer {
            observer.on_handler_failure(event);
        }
    }
}
