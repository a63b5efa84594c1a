//! Platform for hosted targets: a condition variable stands in for the
//! wake/wait primitive of an embedded RTOS.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use devlayer_core::events::Event;
use devlayer_core::platform::Platform;

#[derive(Debug, Default)]
pub struct HostPlatform {
    notified: Mutex<bool>,
    wakeup: Condvar,
}

impl HostPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Platform for HostPlatform {
    fn notify_processing_context(&self) {
        let mut notified = self.notified.lock();
        *notified = true;
        self.wakeup.notify_one();
    }

    fn wait_for_notification(&self, timeout: Duration) {
        let deadline = Instant::now().checked_add(timeout);
        let mut notified = self.notified.lock();
        while !*notified {
            match deadline {
                Some(deadline) => {
                    if self.wakeup.wait_until(&mut notified, deadline).timed_out() {
                        break;
                    }
                }
                // Timeout beyond what the clock can represent.
                None => self.wakeup.wait(&mut notified),
            }
        }
        *notified = false;
    }

    fn dispatch_to_system_layer(&self, event: &Event) {
        if let Event::SystemLayer { target, kind, argument } = event {
            trace!(system_target = target, kind, argument, "System layer event");
        }
    }
}
