//! ## devlayer-core::stats
//! **Dispatch counters**
//!
//! Counters are updated by the processing context and read from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct DispatchStats {
    events_dispatched: AtomicU64,
    work_items_run: AtomicU64,
    handler_failures: AtomicU64,
    queue_rejections: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub events_dispatched: u64,
    pub work_items_run: u64,
    pub handler_failures: u64,
    pub queue_rejections: u64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_events_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_work_items_run(&self) {
        self.work_items_run.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_handler_failures(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_queue_rejections(&self) {
        self.queue_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched.load(Ordering::Relaxed)
    }

    pub fn work_items_run(&self) -> u64 {
        self.work_items_run.load(Ordering::Relaxed)
    }

    pub fn handler_failures(&self) -> u64 {
        self.handler_failures.load(Ordering::Relaxed)
    }

    pub fn queue_rejections(&self) -> u64 {
        self.queue_rejections.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_dispatched: self.events_dispatched(),
            work_items_run: self.work_items_run(),
            handler_failures: self.handler_failures(),
            queue_rejections: self.queue_rejections(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        assert_eq!(DispatchStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn multiple_increments() {
        let stats = DispatchStats::new();
        for _ in 0..100 {
            stats.increment_events_dispatched();
            stats.increment_work_items_run();
            stats.increment_handler_failures();
            stats.increment_queue_rejections();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.events_dispatched, 100);
        assert_eq!(snapshot.work_items_run, 100);
        assert_eq!(snapshot.handler_failures, 100);
        assert_eq!(snapshot.queue_rejections, 100);
    }
}
