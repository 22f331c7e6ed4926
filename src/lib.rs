//! du-walker - Concurrent Disk Usage Walker
//!
//! Walks one or more directory trees in parallel, sums file sizes and
//! reports totals, periodically if asked. A run can be cancelled at any
//! point (keypress, Ctrl-C, timeout); the totals counted up to that point
//! are still reported.
//!
//! # Features
//!
//! - **Task per Directory**: every directory is walked by its own tokio
//!   task, so wide and deep trees fan out naturally.
//!
//! - **Bounded Filesystem Concurrency**: at most K directory listings run
//!   at once, no matter how many tasks are waiting.
//!
//! - **Single-Owner Totals**: walkers send file sizes over a channel to one
//!   aggregator, which owns the totals outright.
//!
//! - **Cooperative Cancellation**: a one-shot signal stops new listings,
//!   releases queued permit waiters and switches the aggregator into a
//!   drain mode that never leaves a walker blocked.
//!
//! # Example
//!
//! ```bash
//! # Walk the current directory
//! du-walker
//!
//! # Several roots, progress every 500ms, stop after a minute
//! du-walker -v --timeout 60 /usr /var /home
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod progress;
pub mod walker;

/// Prefix for diagnostics written to stderr
pub const TOOL_NAME: &str = env!("CARGO_PKG_NAME");

pub use cancel::CancelSignal;
pub use config::{CliArgs, WalkConfig};
pub use error::{ListError, Result, WalkerError};
pub use walker::{DiskUsageCoordinator, DiskUsageResult, RunningTotals};
