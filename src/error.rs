//! Error types for du-walker
//!
//! This module defines the error hierarchy used by the library:
//! - Directory listing errors (recoverable, reported and skipped)
//! - Configuration and CLI errors
//! - Worker/task errors
//!
//! Cancellation has no variant here: it is a control-flow signal observed
//! through [`crate::cancel::CancelSignal`], never an error value.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the du-walker library
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (runtime setup, terminal, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single directory could not be listed
///
/// Listing errors never propagate past the task that hit them: the walker
/// reports the error and treats the directory as empty.
#[derive(Error, Debug)]
#[error("{}: {source}", .path.display())]
pub struct ListError {
    /// Directory that failed to list
    pub path: PathBuf,

    /// Underlying I/O failure
    #[source]
    pub source: std::io::Error,
}

impl ListError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// The directory vanished between being discovered and being listed.
    ///
    /// Common on live filesystems; logged at a lower level than other failures.
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == std::io::ErrorKind::NotFound
    }

    pub fn is_permission_denied(&self) -> bool {
        self.source.kind() == std::io::ErrorKind::PermissionDenied
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid listing concurrency
    #[error("Invalid concurrency {count}: must be between 1 and {max}")]
    InvalidConcurrency { count: usize, max: usize },

    /// Invalid runtime thread count
    #[error("Invalid thread count {count}: must be between 1 and {max}")]
    InvalidThreadCount { count: usize, max: usize },

    /// Invalid size channel capacity
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Reporting interval too small to be useful
    #[error("Invalid report interval {millis}ms: must be at least {min}ms")]
    InvalidInterval { millis: u64, min: u64 },

    /// Timeout of zero seconds would cancel before the walk starts
    #[error("Invalid timeout: must be at least one second")]
    InvalidTimeout,

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// A root was given as an empty string
    #[error("Invalid root path '{}': {reason}", .path.display())]
    InvalidRoot { path: PathBuf, reason: String },
}

/// Worker/task errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A supervisory task panicked or was aborted
    #[error("Task '{name}' failed: {message}")]
    TaskFailed { name: &'static str, message: String },

    /// Interrupt handler could not be installed
    #[error("Failed to install interrupt handler: {0}")]
    SignalHandler(String),
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Result type alias for listing operations
pub type ListResult<T> = std::result::Result<T, ListError>;
