//! Deferred work executed on the processing context.

use std::fmt;

/// A one-shot closure scheduled onto the processing context.
///
/// The closure owns whatever context it needs. Once queued it always runs;
/// callers that need cancellation check a flag of their own inside it.
pub struct WorkItem {
    work: Box<dyn FnOnce() + Send + 'static>,
}

impl WorkItem {
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            work: Box::new(work),
        }
    }

    /// Runs the work, consuming the item.
    #[inline]
    pub fn run(self) {
        (self.work)()
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WorkItem")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn runs_captured_context() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        WorkItem::new(move || flag.store(true, Ordering::SeqCst)).run();
        assert!(ran.load(Ordering::SeqCst));
    }
}
