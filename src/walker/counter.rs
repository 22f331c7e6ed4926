//! In-flight traversal task accounting
//!
//! Every traversal task owns exactly one [`WorkGuard`]. The guard is created
//! (and the counter incremented) by whoever spawns the task, before the task
//! exists, so the count can never read zero while work is still pending.
//! Dropping the guard decrements the counter on every exit path, including
//! early returns and panics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    zero: Notify,
}

/// Atomic count of in-flight traversal tasks with an awaitable zero barrier
#[derive(Debug, Clone, Default)]
pub struct WorkCounter {
    inner: Arc<Inner>,
}

impl WorkCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one unit of work
    pub fn register(&self) -> WorkGuard {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        WorkGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Current number of registered, unfinished units of work
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Wait until the count drops to zero.
    ///
    /// Returns immediately if nothing is registered.
    pub async fn wait_zero(&self) {
        loop {
            let notified = self.inner.zero.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }

            notified.await;
        }
    }
}

/// One registered unit of work; deregisters on drop
#[derive(Debug)]
pub struct WorkGuard {
    inner: Arc<Inner>,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        if self.inner.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.zero.notify_waiters();
        }
    }
}
