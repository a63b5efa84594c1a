//! Bounded queue feeding the processing context.
//!
//! Producers on any thread (platform drivers, the security subsystem, other
//! tasks, handlers running inside a dispatch) push entries; the single
//! processing context pops them. Both operations are lock-free and never
//! block, and a push against a full queue fails without side effects.

use std::fmt;

use concurrent_queue::{ConcurrentQueue, PushError};
use tracing::trace;

use super::Event;
use crate::error::{DeviceLayerError, Resource, Result, StackState};
use crate::work::WorkItem;

/// One unit of input for the processing context.
pub enum QueueEntry {
    /// Routed through the three-stage dispatch pipeline.
    Event(Event),
    /// Executed directly on the processing context.
    Work(WorkItem),
}

impl fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueEntry::Event(event) => f.debug_tuple("Event").field(event).finish(),
            QueueEntry::Work(work) => f.debug_tuple("Work").field(work).finish(),
        }
    }
}

pub struct EventQueue {
    queue: ConcurrentQueue<QueueEntry>,
}

impl EventQueue {
    /// Creates a queue holding at most `capacity` pending entries.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DeviceLayerError::InvalidArgument(
                "event queue capacity must be non-zero".into(),
            ));
        }

        Ok(Self {
            queue: ConcurrentQueue::bounded(capacity),
        })
    }

    /// Appends an entry. A full queue reports `ResourceExhausted` and leaves
    /// the queue untouched; a closed one reports the stack as shut down.
    #[inline]
    pub fn enqueue(&self, entry: QueueEntry) -> Result<()> {
        match self.queue.push(entry) {
            Ok(()) => {
                trace!(pending = self.queue.len(), "Entry queued");
                Ok(())
            }
            Err(PushError::Full(_)) => Err(DeviceLayerError::ResourceExhausted {
                resource: Resource::EventQueue,
            }),
            Err(PushError::Closed(_)) => Err(DeviceLayerError::InvalidState {
                expected: StackState::Running,
                actual: StackState::Shutdown,
            }),
        }
    }

    /// Takes the oldest entry, or `None` if the queue is empty.
    #[inline]
    pub fn dequeue(&self) -> Option<QueueEntry> {
        self.queue.pop().ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity().unwrap_or(usize::MAX)
    }

    /// Rejects further pushes. Entries already queued can still be drained.
    pub fn close(&self) -> bool {
        self.queue.close()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
