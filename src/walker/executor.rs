//! Bounded executor for directory listings
//!
//! One traversal task is spawned per directory, so the number of tasks is
//! unbounded. The executor caps how many of them may be inside a listing at
//! the same time. Waiting for a permit is raced against the cancel signal so
//! queued waiters are released as soon as the run is cancelled.

use crate::cancel::CancelSignal;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Permission to run one listing. Dropping it returns it to the pool.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

/// Outcome of [`BoundedExecutor::acquire`]
#[derive(Debug)]
pub enum Acquire {
    Granted(Permit),
    Cancelled,
}

/// Fixed pool of K listing permits
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    cancel: CancelSignal,
}

impl BoundedExecutor {
    pub fn new(capacity: usize, cancel: CancelSignal) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            cancel,
        }
    }

    /// Wait for a permit or for cancellation, whichever happens first.
    ///
    /// Neither branch is preferred when both are ready.
    pub async fn acquire(&self) -> Acquire {
        tokio::select! {
            permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                Ok(permit) => Acquire::Granted(Permit { _permit: permit }),
                // The pool is never closed; treat it as the end of the run
                Err(_) => Acquire::Cancelled,
            },
            _ = self.cancel.fired() => Acquire::Cancelled,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held
    pub fn in_use(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}
