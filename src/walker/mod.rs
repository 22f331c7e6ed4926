//! Concurrent disk usage walker
//!
//! # Architecture
//!
//! ```text
//!   roots ──► walker task per directory ──┐
//!               │  (spawns a task per     │ file sizes
//!               │   subdirectory)         ▼
//!               │                   ┌────────────┐
//!               ▼                   │ Aggregator │──► progress lines
//!        ┌────────────────┐         │  (totals)  │──► final total
//!        │BoundedExecutor │         └────────────┘
//!        │  K permits for │               ▲
//!        │  read_dir      │               │ closes stream
//!        └────────────────┘         ┌────────────┐
//!               ▲                   │   closer   │◄── WorkCounter == 0
//!               │                   └────────────┘
//!          CancelSignal ─────────────────────┘ (walkers, executor, aggregator)
//! ```

pub mod aggregator;
pub mod coordinator;
pub mod counter;
pub mod executor;
pub mod lister;
pub mod tree;

pub use aggregator::{AggregateOutcome, Aggregator, RunningTotals};
pub use coordinator::{DiskUsageCoordinator, DiskUsageResult};
pub use counter::{WorkCounter, WorkGuard};
pub use executor::{Acquire, BoundedExecutor, Permit};
pub use lister::{DirEntry, DirLister, EntryKind, FsLister, MemoryLister};
pub use tree::{spawn_walk, SizeReceiver, SizeSender, WalkContext, WalkStats};
