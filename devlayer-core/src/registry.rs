//! ## devlayer-core::registry
//! **Ordered collection of application event handlers**
//!
//! Handlers are kept in registration order. Registering the same handler
//! twice creates two entries, and each removal takes out the first match
//! only. Iteration works on a snapshot of the list, so a handler may add or
//! remove handlers (including itself) while it is being invoked; entries
//! removed mid-iteration are skipped, entries added mid-iteration are picked
//! up by the next dispatch.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::error::{DeviceLayerError, Resource, Result};
use crate::events::Event;

/// Failure reported by an application handler. It is logged by the
/// dispatcher and never propagated.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Plain function handler paired with an integer context argument.
pub type HandlerFn = fn(&Event, usize) -> HandlerResult;

type Callback = dyn Fn(&Event) -> HandlerResult + Send + Sync;

/// What makes two handlers "the same" for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerKey {
    Closure(usize),
    Function { func: usize, arg: usize },
}

/// An application event handler.
///
/// Cloning a handler yields the same handler: registering both clones
/// creates two entries and removing either clone removes one of them.
/// Handlers built with [`EventHandler::with_arg`] compare by function and
/// argument, so an identical pair built twice is the same handler.
#[derive(Clone)]
pub struct EventHandler {
    callback: Arc<Callback>,
    key: HandlerKey,
}

impl EventHandler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        let callback: Arc<Callback> = Arc::new(callback);
        let key = HandlerKey::Closure(Arc::as_ptr(&callback) as *const () as usize);
        Self { callback, key }
    }

    /// Wraps a plain function and its argument. Identity is the function's
    /// address plus `arg`; distinct functions with identical bodies may be
    /// merged by the compiler and then compare equal.
    pub fn with_arg(func: HandlerFn, arg: usize) -> Self {
        Self {
            callback: Arc::new(move |event: &Event| func(event, arg)),
            key: HandlerKey::Function {
                func: func as usize,
                arg,
            },
        }
    }

    #[inline]
    pub fn call(&self, event: &Event) -> HandlerResult {
        (self.callback)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for EventHandler {}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            HandlerKey::Closure(addr) => write!(f, "EventHandler(closure@{addr:#x})"),
            HandlerKey::Function { func, arg } => {
                write!(f, "EventHandler(fn@{func:#x}, arg={arg})")
            }
        }
    }
}

/// A registered handler.
pub struct HandlerEntry {
    handler: EventHandler,
    live: AtomicBool,
}

impl HandlerEntry {
    pub fn handler(&self) -> &EventHandler {
        &self.handler
    }

    /// False once the entry has been removed from the registry.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Visitor verdict for [`EventHandlerRegistry::for_each`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForEachAction {
    Continue,
    /// Remove the entry just visited, then continue.
    Remove,
}

pub struct EventHandlerRegistry {
    entries: RwLock<Vec<Arc<HandlerEntry>>>,
    capacity: usize,
}

impl EventHandlerRegistry {
    /// Creates a registry holding at most `capacity` handlers.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DeviceLayerError::InvalidArgument(
                "handler registry capacity must be non-zero".into(),
            ));
        }

        Ok(Self {
            entries: RwLock::new(Vec::with_capacity(capacity)),
            capacity,
        })
    }

    /// Appends a handler after every handler registered so far.
    pub fn add_event_handler(&self, handler: EventHandler) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            return Err(DeviceLayerError::ResourceExhausted {
                resource: Resource::HandlerRegistry,
            });
        }

        debug!(?handler, position = entries.len(), "Event handler added");
        entries.push(Arc::new(HandlerEntry {
            handler,
            live: AtomicBool::new(true),
        }));
        Ok(())
    }

    /// Removes the first entry matching `handler`. Unknown handlers are
    /// ignored.
    pub fn remove_event_handler(&self, handler: &EventHandler) {
        let mut entries = self.entries.write();
        if let Some(pos) = entries.iter().position(|e| e.handler == *handler) {
            let entry = entries.remove(pos);
            entry.live.store(false, Ordering::Release);
            debug!(?handler, "Event handler removed");
        }
    }

    /// Visits the live entries in registration order.
    ///
    /// No lock is held while `visitor` runs.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&HandlerEntry) -> ForEachAction,
    {
        let snapshot: Vec<Arc<HandlerEntry>> = self.entries.read().clone();

        for entry in snapshot {
            if !entry.is_live() {
                continue;
            }
            if visitor(&entry) == ForEachAction::Remove {
                self.remove_entry(&entry);
            }
        }
    }

    fn remove_entry(&self, target: &Arc<HandlerEntry>) {
        let mut entries = self.entries.write();
        if let Some(pos) = entries.iter().position(|e| Arc::ptr_eq(e, target)) {
            entries.remove(pos);
        }
        target.live.store(false, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every registered handler.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        for entry in entries.drain(..) {
            entry.live.store(false, Ordering::Release);
        }
    }
}

impl fmt::Debug for EventHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlerRegistry")
            .field("handlers", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;

    fn noop(_: &Event, _: usize) -> HandlerResult {
        Ok(())
    }

    fn other(_: &Event, arg: usize) -> HandlerResult {
        if arg == 0 {
            return Err(HandlerError::new("zero argument"));
        }
        Ok(())
    }

    /// Handler that appends `tag` to `log` whenever it runs.
    fn recording(log: &Arc<Mutex<Vec<u32>>>, tag: u32) -> EventHandler {
        let log = log.clone();
        EventHandler::new(move |_| {
            log.lock().push(tag);
            Ok(())
        })
    }

    fn visit_all(registry: &EventHandlerRegistry) {
        registry.for_each(|entry| {
            let _ = entry.handler().call(&Event::NoOp);
            ForEachAction::Continue
        });
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            EventHandlerRegistry::with_capacity(0),
            Err(DeviceLayerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn visits_in_registration_order() {
        let registry = EventHandlerRegistry::with_capacity(8).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in 1..=3 {
            registry.add_event_handler(recording(&log, tag)).unwrap();
        }

        visit_all(&registry);
        assert_eq!(*log.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_registration_runs_twice() {
        let registry = EventHandlerRegistry::with_capacity(8).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recording(&log, 7);
        registry.add_event_handler(handler.clone()).unwrap();
        registry.add_event_handler(handler.clone()).unwrap();

        visit_all(&registry);
        assert_eq!(*log.lock(), vec![7, 7]);

        registry.remove_event_handler(&handler);
        assert_eq!(registry.len(), 1);

        log.lock().clear();
        visit_all(&registry);
        assert_eq!(*log.lock(), vec![7]);
    }

    #[test]
    fn function_handlers_compare_by_function_and_argument() {
        assert_eq!(EventHandler::with_arg(noop, 1), EventHandler::with_arg(noop, 1));
        assert_ne!(EventHandler::with_arg(noop, 1), EventHandler::with_arg(noop, 2));
        assert_ne!(EventHandler::with_arg(noop, 1), EventHandler::with_arg(other, 1));

        let registry = EventHandlerRegistry::with_capacity(8).unwrap();
        registry.add_event_handler(EventHandler::with_arg(noop, 1)).unwrap();
        registry.add_event_handler(EventHandler::with_arg(noop, 2)).unwrap();

        registry.remove_event_handler(&EventHandler::with_arg(noop, 2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn removing_unknown_handler_is_noop() {
        let registry = EventHandlerRegistry::with_capacity(8).unwrap();
        registry.add_event_handler(EventHandler::with_arg(noop, 1)).unwrap();

        registry.remove_event_handler(&EventHandler::new(|_| Ok(())));
        registry.remove_event_handler(&EventHandler::with_arg(noop, 9));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn full_registry_rejects_without_state_change() {
        let registry = EventHandlerRegistry::with_capacity(2).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.add_event_handler(recording(&log, 1)).unwrap();
        registry.add_event_handler(recording(&log, 2)).unwrap();

        let err = registry.add_event_handler(recording(&log, 3)).unwrap_err();
        assert!(err.is_resource_exhausted());
        assert_eq!(registry.len(), 2);

        visit_all(&registry);
        assert_eq!(*log.lock(), vec![1, 2]);
    }

    #[test]
    fn visitor_can_remove_current_entry() {
        let registry = EventHandlerRegistry::with_capacity(8).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recording(&log, 1);
        registry.add_event_handler(first.clone()).unwrap();
        registry.add_event_handler(recording(&log, 2)).unwrap();

        registry.for_each(|entry| {
            let _ = entry.handler().call(&Event::NoOp);
            if *entry.handler() == first {
                ForEachAction::Remove
            } else {
                ForEachAction::Continue
            }
        });
        assert_eq!(*log.lock(), vec![1, 2]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn entries_removed_mid_iteration_are_skipped() {
        let registry = Arc::new(EventHandlerRegistry::with_capacity(8).unwrap());
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim = recording(&log, 3);

        let remover = {
            let registry = registry.clone();
            let victim = victim.clone();
            let log = log.clone();
            EventHandler::new(move |_| {
                log.lock().push(1);
                registry.remove_event_handler(&victim);
                Ok(())
            })
        };
        registry.add_event_handler(remover).unwrap();
        registry.add_event_handler(recording(&log, 2)).unwrap();
        registry.add_event_handler(victim).unwrap();

        visit_all(&registry);
        assert_eq!(*log.lock(), vec![1, 2]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn entries_added_mid_iteration_wait_for_next_pass() {
        let registry = Arc::new(EventHandlerRegistry::with_capacity(8).unwrap());
        let log = Arc::new(Mutex::new(Vec::new()));

        let adder = {
            let registry = registry.clone();
            let late = recording(&log, 2);
            EventHandler::new(move |_| {
                if registry.len() == 1 {
                    registry.add_event_handler(late.clone()).unwrap();
                }
                Ok(())
            })
        };
        registry.add_event_handler(adder).unwrap();

        visit_all(&registry);
        assert!(log.lock().is_empty());

        visit_all(&registry);
        assert_eq!(*log.lock(), vec![2]);
    }

    #[test]
    fn clear_drops_everything() {
        let registry = EventHandlerRegistry::with_capacity(4).unwrap();
        registry.add_event_handler(EventHandler::with_arg(noop, 1)).unwrap();
        registry.add_event_handler(EventHandler::with_arg(noop, 2)).unwrap();
        registry.clear();
        assert!(registry.is_empty());
    }

    proptest! {
        #[test]
        fn iteration_order_matches_any_registration_sequence(tags in proptest::collection::vec(0u32..16, 0..32)) {
            let registry = EventHandlerRegistry::with_capacity(32).unwrap();
            let log = Arc::new(Mutex::new(Vec::new()));
            for &tag in &tags {
                registry.add_event_handler(recording(&log, tag)).unwrap();
            }

            visit_all(&registry);
            prop_assert_eq!(log.lock().clone(), tags);
        }
    }
}
