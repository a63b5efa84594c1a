//! Platform manager: the owner of the handler registry, the event queue and
//! the dispatch pipeline, and the public face of the device layer.
//!
//! A manager is a cheap handle; clones share the same stack. Producers on
//! any thread may post events and schedule work; exactly one thread at a time
//! runs the processing context (see [`PlatformManager::run_cycle`] and the
//! event loop in [`crate::event_loop`]).

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, info, instrument, trace, warn};

use devlayer_config::DevLayerConfig;
use devlayer_core::error::{DeviceLayerError, Result, StackState};
use devlayer_core::events::{Event, EventQueue, QueueEntry};
use devlayer_core::platform::{DeviceLayerComponent, Platform, SecurityManager};
use devlayer_core::registry::{EventHandler, EventHandlerRegistry};
use devlayer_core::stats::{DispatchStats, StatsSnapshot};
use devlayer_core::work::WorkItem;
use devlayer_telemetry::EventLogger;

use crate::dispatcher::EventDispatcher;
use crate::observer::DispatchObserver;
use crate::session::SessionCompletionBridge;

/// Guard returned by [`PlatformManager::lock_stack`].
pub type StackLockGuard<'a> = ReentrantMutexGuard<'a, ()>;

pub(crate) struct ManagerInner {
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) queue: EventQueue,
    registry: Arc<EventHandlerRegistry>,
    dispatcher: EventDispatcher,
    security: Option<Arc<dyn SecurityManager>>,
    stats: Arc<DispatchStats>,
    observer: Option<Arc<dyn DispatchObserver>>,
    state: Mutex<StackState>,
    stack_lock: ReentrantMutex<()>,
    pub(crate) loop_running: AtomicBool,
    pub(crate) stop_requested: AtomicBool,
    pub(crate) idle_wait: Duration,
    pub(crate) thread_name: String,
}

#[derive(Clone)]
pub struct PlatformManager {
    pub(crate) inner: Arc<ManagerInner>,
}

/// Assembles a [`PlatformManager`]. Collaborators are fixed at build time.
pub struct PlatformManagerBuilder {
    platform: Arc<dyn Platform>,
    queue_capacity: usize,
    max_handlers: usize,
    idle_wait: Duration,
    thread_name: String,
    components: Vec<Arc<dyn DeviceLayerComponent>>,
    security: Option<Arc<dyn SecurityManager>>,
    observer: Option<Arc<dyn DispatchObserver>>,
}

impl PlatformManagerBuilder {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self::from_config(platform, &DevLayerConfig::default())
    }

    pub fn from_config(platform: Arc<dyn Platform>, config: &DevLayerConfig) -> Self {
        Self {
            platform,
            queue_capacity: config.core.event_queue.capacity,
            max_handlers: config.core.registry.max_handlers,
            idle_wait: config.idle_wait(),
            thread_name: config.core.event_loop.thread_name.clone(),
            components: Vec::new(),
            security: None,
            observer: None,
        }
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn max_handlers(mut self, max_handlers: usize) -> Self {
        self.max_handlers = max_handlers;
        self
    }

    pub fn idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Adds a device-layer subsystem. Components see events in the order
    /// they were added.
    pub fn device_component(mut self, component: Arc<dyn DeviceLayerComponent>) -> Self {
        self.components.push(component);
        self
    }

    pub fn security_manager(mut self, security: Arc<dyn SecurityManager>) -> Self {
        self.security = Some(security);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<PlatformManager> {
        let queue = EventQueue::with_capacity(self.queue_capacity)?;
        let registry = Arc::new(EventHandlerRegistry::with_capacity(self.max_handlers)?);
        let stats = Arc::new(DispatchStats::new());
        let dispatcher = EventDispatcher::new(
            self.platform.clone(),
            registry.clone(),
            self.components,
            stats.clone(),
            self.observer.clone(),
        );

        debug!(
            queue_capacity = self.queue_capacity,
            max_handlers = self.max_handlers,
            "Platform manager built"
        );

        Ok(PlatformManager {
            inner: Arc::new(ManagerInner {
                platform: self.platform,
                queue,
                registry,
                dispatcher,
                security: self.security,
                stats,
                observer: self.observer,
                state: Mutex::new(StackState::Uninitialized),
                stack_lock: ReentrantMutex::new(()),
                loop_running: AtomicBool::new(false),
                stop_requested: AtomicBool::new(false),
                idle_wait: self.idle_wait,
                thread_name: self.thread_name,
            }),
        })
    }
}

impl PlatformManager {
    pub fn builder(platform: Arc<dyn Platform>) -> PlatformManagerBuilder {
        PlatformManagerBuilder::new(platform)
    }

    pub(crate) fn from_inner(inner: Arc<ManagerInner>) -> Self {
        Self { inner }
    }

    pub fn state(&self) -> StackState {
        *self.inner.state.lock()
    }

    /// Brings the stack up: initializes the platform and installs the
    /// session-established bridge into the security subsystem.
    #[instrument(skip(self))]
    pub fn init_stack(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if *state != StackState::Uninitialized {
            return Err(DeviceLayerError::InvalidState {
                expected: StackState::Uninitialized,
                actual: *state,
            });
        }

        self.inner.platform.init()?;

        if let Some(security) = &self.inner.security {
            let bridge = SessionCompletionBridge::new(Arc::downgrade(&self.inner), security);
            security.set_session_established_callback(bridge.into_callback());
            debug!("Session established callback installed");
        }

        *state = StackState::Running;
        info!("Device layer stack initialized");
        EventLogger::log_event(
            "stack_initialized",
            vec![
                KeyValue::new("queue_capacity", self.inner.queue.capacity() as i64),
                KeyValue::new("max_handlers", self.inner.registry.capacity() as i64),
            ],
        );
        Ok(())
    }

    /// Takes the stack down. The queue stops accepting input; entries already
    /// queued are still drained by the event loop before it exits.
    #[instrument(skip(self))]
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if *state != StackState::Running {
            return Err(DeviceLayerError::InvalidState {
                expected: StackState::Running,
                actual: *state,
            });
        }

        self.inner.queue.close();
        self.stop_event_loop();
        self.inner.platform.shutdown();
        *state = StackState::Shutdown;

        info!(pending = self.inner.queue.len(), "Device layer stack shut down");
        EventLogger::log_event(
            "stack_shutdown",
            vec![KeyValue::new("pending", self.inner.queue.len() as i64)],
        );
        Ok(())
    }

    /// Appends an application event handler.
    pub fn add_event_handler(&self, handler: EventHandler) -> Result<()> {
        self.inner.registry.add_event_handler(handler)
    }

    /// Removes the first registration of `handler`; unknown handlers are
    /// ignored.
    pub fn remove_event_handler(&self, handler: &EventHandler) {
        self.inner.registry.remove_event_handler(handler)
    }

    pub fn handler_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Queues `work` to run on the processing context and wakes it.
    pub fn schedule_work<F>(&self, work: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(QueueEntry::Work(WorkItem::new(work)))
    }

    /// Queues `event` for dispatch on the processing context and wakes it.
    pub fn post_event(&self, event: Event) -> Result<()> {
        if let Event::Platform { event_type, .. } = event {
            if !event_type.is_platform_specific() {
                return Err(DeviceLayerError::InvalidArgument(format!(
                    "platform event type {event_type} lies outside the platform-specific ranges"
                )));
            }
        }
        self.submit(QueueEntry::Event(event))
    }

    fn submit(&self, entry: QueueEntry) -> Result<()> {
        if let Err(err) = self.inner.queue.enqueue(entry) {
            if err.is_resource_exhausted() {
                self.inner.stats.increment_queue_rejections();
                if let Some(observer) = &self.inner.observer {
                    observer.on_queue_rejection();
                }
                warn!(capacity = self.inner.queue.capacity(), "Event queue full, submission rejected");
            }
            return Err(err);
        }
        self.inner.platform.notify_processing_context();
        Ok(())
    }

    /// Routes one event through the pipeline on the calling thread.
    pub fn dispatch_event(&self, event: &Event) {
        let _guard = self.lock_stack();
        self.inner.dispatcher.dispatch_event(event);
    }

    /// Runs one processing cycle: every entry queued when the cycle starts,
    /// in FIFO order. Entries queued while the cycle runs wait for the next
    /// one. Returns the number of entries run.
    pub fn run_cycle(&self) -> usize {
        let batch = self.inner.queue.len();
        let mut ran = 0;

        while ran < batch {
            let Some(entry) = self.inner.queue.dequeue() else {
                break;
            };
            self.run_entry(entry);
            ran += 1;
        }

        if ran > 0 {
            trace!(ran, remaining = self.inner.queue.len(), "Processing cycle complete");
        }
        ran
    }

    fn run_entry(&self, entry: QueueEntry) {
        let _guard = self.lock_stack();
        match entry {
            QueueEntry::Event(event) => self.inner.dispatcher.dispatch_event(&event),
            QueueEntry::Work(work) => {
                if panic::catch_unwind(AssertUnwindSafe(|| work.run())).is_err() {
                    warn!("Scheduled work item panicked");
                }
                self.inner.stats.increment_work_items_run();
                if let Some(observer) = &self.inner.observer {
                    observer.on_work_item_run();
                }
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    /// Acquires the stack lock. The processing context holds it while it runs
    /// an entry; other threads take it before touching stack state. The lock
    /// is re-entrant, so handlers may take it again.
    pub fn lock_stack(&self) -> StackLockGuard<'_> {
        self.inner.stack_lock.lock()
    }

    pub fn try_lock_stack(&self) -> Option<StackLockGuard<'_>> {
        self.inner.stack_lock.try_lock()
    }

    /// Asks a running event loop to exit once the queue is drained.
    pub fn stop_event_loop(&self) {
        self.inner.stop_requested.store(true, Ordering::Release);
        self.inner.platform.notify_processing_context();
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }
}
