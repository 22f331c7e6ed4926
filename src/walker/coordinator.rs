//! Disk usage coordinator - orchestrates a parallel walk using tokio
//!
//! Wires the pieces of a run together:
//!
//! 1. registers one unit of work per root, then spawns a walker per root
//! 2. spawns the closer, which waits for the work counter to reach zero
//!    and drops the last coordinator-held sender
//! 3. runs the aggregator on the calling task until the stream closes
//! 4. joins the closer, so no walker task outlives the returned result

use crate::cancel::CancelSignal;
use crate::config::WalkConfig;
use crate::error::{Result, WorkerError};
use crate::walker::aggregator::{Aggregator, RunningTotals};
use crate::walker::lister::{DirLister, FsLister};
use crate::walker::tree::{spawn_walk, WalkContext};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Result of a finished (or cancelled) walk
#[derive(Debug, Clone)]
pub struct DiskUsageResult {
    /// Files and bytes counted by the aggregator
    pub totals: RunningTotals,

    /// Directories successfully listed
    pub dirs: u64,

    /// Directories that could not be listed
    pub errors: u64,

    /// Directories skipped by exclude patterns
    pub excluded: u64,

    pub duration: Duration,

    /// False if the run was cancelled
    pub completed: bool,
}

/// Async disk usage coordinator
pub struct DiskUsageCoordinator {
    config: Arc<WalkConfig>,
    lister: Arc<dyn DirLister>,
    cancel: CancelSignal,
}

impl DiskUsageCoordinator {
    /// Coordinator over the local filesystem
    pub fn new(config: WalkConfig) -> Self {
        Self::with_lister(config, Arc::new(FsLister))
    }

    /// Coordinator over an arbitrary listing source
    pub fn with_lister(config: WalkConfig, lister: Arc<dyn DirLister>) -> Self {
        Self {
            config: Arc::new(config),
            lister,
            cancel: CancelSignal::new(),
        }
    }

    /// Get the cancel signal for triggers (stdin, Ctrl-C, timeout)
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Run the walk.
    ///
    /// `on_tick` receives a snapshot on every report tick when the config
    /// has a report interval.
    pub async fn run<F>(self, on_tick: F) -> Result<DiskUsageResult>
    where
        F: FnMut(&RunningTotals),
    {
        let start_time = Instant::now();

        info!(
            roots = self.config.roots.len(),
            concurrency = self.config.concurrency,
            "Starting disk usage walk"
        );

        let ctx = Arc::new(WalkContext::new(
            Arc::clone(&self.config),
            Arc::clone(&self.lister),
            self.cancel.clone(),
        ));
        let (size_tx, size_rx) = mpsc::channel::<u64>(self.config.queue_size);

        // Register every root before spawning any, so the counter cannot
        // touch zero while a later root is still being set up
        let guards: Vec<_> = self
            .config
            .roots
            .iter()
            .map(|_| ctx.counter.register())
            .collect();

        for (root, guard) in self.config.roots.iter().zip(guards) {
            debug!(root = %root.display(), "Spawning root walker");
            spawn_walk(Arc::clone(&ctx), root.clone(), guard, size_tx.clone());
        }

        let closer = {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                ctx.counter.wait_zero().await;
                drop(size_tx);
                debug!("All walkers finished, size stream closing");
            })
        };

        let outcome = Aggregator::new(size_rx, self.cancel.clone())
            .with_interval(self.config.report_interval)
            .run(on_tick)
            .await;
        // The stream can close in the same instant the signal fires; a run
        // whose walkers saw the signal is still incomplete
        let cancelled = outcome.cancelled || self.cancel.is_fired();

        closer.await.map_err(|e| WorkerError::TaskFailed {
            name: "size-stream-closer",
            message: e.to_string(),
        })?;

        let duration = start_time.elapsed();
        let result = DiskUsageResult {
            totals: outcome.totals,
            dirs: ctx.stats.dirs(),
            errors: ctx.stats.error_count(),
            excluded: ctx.stats.excluded_count(),
            duration,
            completed: !cancelled,
        };

        info!(
            files = result.totals.files,
            bytes = result.totals.bytes,
            dirs = result.dirs,
            errors = result.errors,
            drained = outcome.drained,
            duration_ms = duration.as_millis() as u64,
            completed = result.completed,
            "Disk usage walk finished"
        );

        Ok(result)
    }
}
