//! The processing context: a loop that runs queued work and dispatches
//! queued events until asked to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use opentelemetry::KeyValue;
use tracing::{debug, info, instrument};

use devlayer_core::error::{DeviceLayerError, PlatformError, Result, StackState};
use devlayer_telemetry::EventLogger;

use crate::manager::PlatformManager;

/// Releases the event loop claim when the loop exits, including by unwinding.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to an event loop running on its own thread.
pub struct EventLoopHandle {
    manager: PlatformManager,
    thread: JoinHandle<()>,
}

impl EventLoopHandle {
    pub fn thread_name(&self) -> Option<&str> {
        self.thread.thread().name()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Asks the loop to exit after draining the queue and waits for it.
    pub fn stop(self) -> Result<()> {
        self.manager.stop_event_loop();
        self.thread
            .join()
            .map_err(|_| DeviceLayerError::Platform(PlatformError::EventLoopPanicked))
    }
}

impl PlatformManager {
    /// Runs the processing context on the calling thread until
    /// [`PlatformManager::stop_event_loop`] is called and the queue is empty.
    pub fn run_event_loop(&self) -> Result<()> {
        self.ensure_running()?;
        self.claim_event_loop()?;
        self.event_loop_body();
        Ok(())
    }

    /// Spawns the processing context on a dedicated, named thread.
    pub fn start_event_loop_task(&self) -> Result<EventLoopHandle> {
        self.ensure_running()?;
        self.claim_event_loop()?;

        let manager = self.clone();
        let spawned = thread::Builder::new()
            .name(self.inner.thread_name.clone())
            .spawn(move || manager.event_loop_body());

        match spawned {
            Ok(thread) => Ok(EventLoopHandle {
                manager: self.clone(),
                thread,
            }),
            Err(err) => {
                self.inner.loop_running.store(false, Ordering::Release);
                Err(PlatformError::Spawn(err).into())
            }
        }
    }

    pub fn is_event_loop_running(&self) -> bool {
        self.inner.loop_running.load(Ordering::Acquire)
    }

    fn ensure_running(&self) -> Result<()> {
        match self.state() {
            StackState::Running => Ok(()),
            actual => Err(DeviceLayerError::InvalidState {
                expected: StackState::Running,
                actual,
            }),
        }
    }

    fn claim_event_loop(&self) -> Result<()> {
        self.inner
            .loop_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| DeviceLayerError::EventLoopRunning)?;
        self.inner.stop_requested.store(false, Ordering::Release);
        Ok(())
    }

    #[instrument(name = "event_loop", skip(self))]
    fn event_loop_body(&self) {
        let inner = &self.inner;
        let _running = RunningGuard(&inner.loop_running);
        info!("Event loop started");
        EventLogger::log_event(
            "event_loop_started",
            vec![KeyValue::new("idle_wait_ms", inner.idle_wait.as_millis() as i64)],
        );

        let mut cycles: u64 = 0;
        loop {
            let ran = self.run_cycle();
            cycles += 1;

            if inner.stop_requested.load(Ordering::Acquire) && inner.queue.is_empty() {
                break;
            }
            if ran == 0 {
                inner.platform.wait_for_notification(inner.idle_wait);
            }
        }

        debug!(cycles, "Event loop drained");
        info!("Event loop stopped");
        EventLogger::log_event("event_loop_stopped", vec![KeyValue::new("cycles", cycles as i64)]);
    }
}
