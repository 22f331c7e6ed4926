//! Recursive tree walker
//!
//! Each directory is walked by its own tokio task:
//!
//! ```text
//! walk(dir)
//! ├── cancelled?            → return (guard dropped)
//! ├── acquire permit        → cancelled wins? empty listing
//! ├── list dir (blocking pool, permit held)
//! └── for each entry
//!     ├── directory         → register guard, spawn walk(subdir)
//!     └── anything else     → send size to the aggregator
//! ```
//!
//! The [`WorkGuard`] handed to a task is held for the whole task body, so
//! the work counter drops only after the task has sent every size and
//! spawned all of its children.

use crate::cancel::CancelSignal;
use crate::config::WalkConfig;
use crate::error::ListError;
use crate::walker::counter::{WorkCounter, WorkGuard};
use crate::walker::executor::{Acquire, BoundedExecutor};
use crate::walker::lister::{DirEntry, DirLister};
use crate::TOOL_NAME;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Sending half of the file size stream
pub type SizeSender = mpsc::Sender<u64>;

/// Receiving half of the file size stream
pub type SizeReceiver = mpsc::Receiver<u64>;

/// Diagnostic counters shared by all walker tasks
#[derive(Debug, Default)]
pub struct WalkStats {
    pub dirs_listed: AtomicU64,
    pub errors: AtomicU64,
    pub excluded: AtomicU64,
}

impl WalkStats {
    pub fn record_dir(&self) {
        self.dirs_listed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_excluded(&self) {
        self.excluded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dirs(&self) -> u64 {
        self.dirs_listed.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn excluded_count(&self) -> u64 {
        self.excluded.load(Ordering::Relaxed)
    }
}

/// Everything a walker task needs, passed explicitly to every task
pub struct WalkContext {
    pub config: Arc<WalkConfig>,
    pub executor: BoundedExecutor,
    pub cancel: CancelSignal,
    pub counter: WorkCounter,
    pub lister: Arc<dyn DirLister>,
    pub stats: WalkStats,
}

impl WalkContext {
    pub fn new(config: Arc<WalkConfig>, lister: Arc<dyn DirLister>, cancel: CancelSignal) -> Self {
        let executor = BoundedExecutor::new(config.concurrency, cancel.clone());
        Self {
            config,
            executor,
            cancel,
            counter: WorkCounter::new(),
            lister,
            stats: WalkStats::default(),
        }
    }
}

/// Spawn a detached walker task for `dir`.
///
/// `guard` must have been registered with `ctx.counter` by the caller.
pub fn spawn_walk(ctx: Arc<WalkContext>, dir: PathBuf, guard: WorkGuard, sink: SizeSender) {
    tokio::spawn(walk_dir(ctx, dir, guard, sink));
}

fn walk_dir(
    ctx: Arc<WalkContext>,
    dir: PathBuf,
    guard: WorkGuard,
    sink: SizeSender,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        let _guard = guard;

        if ctx.cancel.is_fired() {
            return;
        }

        for entry in list_dir(&ctx, &dir).await {
            if entry.is_dir() {
                if ctx.cancel.is_fired() {
                    continue;
                }
                if ctx.config.is_excluded(&entry.path) {
                    ctx.stats.record_excluded();
                    debug!(path = %entry.path.display(), "Excluded directory");
                    continue;
                }

                let child = ctx.counter.register();
                spawn_walk(Arc::clone(&ctx), entry.path, child, sink.clone());
            } else if sink.send(entry.size).await.is_err() {
                debug!(path = %dir.display(), "Size stream closed, abandoning directory");
                return;
            }
        }
    })
}

/// List one directory under a permit.
///
/// Cancellation while waiting for the permit and listing failures both
/// yield an empty listing.
async fn list_dir(ctx: &WalkContext, dir: &Path) -> Vec<DirEntry> {
    let _permit = match ctx.executor.acquire().await {
        Acquire::Granted(permit) => permit,
        Acquire::Cancelled => {
            trace!(path = %dir.display(), "Cancelled while waiting for a permit");
            return Vec::new();
        }
    };

    let lister = Arc::clone(&ctx.lister);
    let path = dir.to_path_buf();
    let listed = tokio::task::spawn_blocking(move || lister.list(&path)).await;

    match listed {
        Ok(Ok(entries)) => {
            ctx.stats.record_dir();
            trace!(path = %dir.display(), entries = entries.len(), "Listed directory");
            entries
        }
        Ok(Err(e)) => {
            ctx.stats.record_error();
            report_list_error(&e);
            Vec::new()
        }
        Err(e) => {
            ctx.stats.record_error();
            warn!(path = %dir.display(), error = %e, "Listing task failed");
            Vec::new()
        }
    }
}

/// Write a listing failure to the diagnostic stream
fn report_list_error(err: &ListError) {
    eprintln!("{}: {}", TOOL_NAME, err);

    if err.is_not_found() {
        debug!(path = %err.path.display(), "Directory vanished before listing");
    } else {
        debug!(path = %err.path.display(), error = %err.source, "Directory listing failed");
    }
}
