//! Configuration types for du-walker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Directory exclusion patterns

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default cap on concurrent directory listings
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Maximum reasonable listing concurrency / runtime thread count
const MAX_CONCURRENCY: usize = 512;

/// Default reporting interval for verbose mode
pub const DEFAULT_INTERVAL_MS: u64 = 500;

/// Shorter intervals just flood the terminal
const MIN_INTERVAL_MS: u64 = 10;

/// Default capacity of the file size channel
pub const DEFAULT_QUEUE_SIZE: usize = 64;

const MIN_QUEUE_SIZE: usize = 1;

/// Concurrent disk usage walker
#[derive(Parser, Debug, Clone)]
#[command(
    name = "du-walker",
    version,
    about = "Concurrent disk usage walker",
    long_about = "Walks one or more directory trees in parallel and reports the total number \
                  of files and their combined size.\n\n\
                  Directory listings run concurrently up to a fixed cap. Press Enter (or send \
                  any byte on stdin), hit Ctrl-C, or pass --timeout to stop early; the totals \
                  counted so far are still reported.",
    after_help = "EXAMPLES:\n    \
        du-walker /usr /var\n    \
        du-walker -v $HOME              # progress line every 500ms\n    \
        du-walker -c 64 --timeout 30 /srv\n    \
        du-walker --exclude '\\.git$' --summary ~/src"
)]
pub struct CliArgs {
    /// Directories to walk (defaults to the current directory)
    #[arg(value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Print a progress line periodically
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Progress reporting interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS, value_name = "MS")]
    pub interval_ms: u64,

    /// Maximum number of concurrent directory listings
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY, value_name = "NUM")]
    pub concurrency: usize,

    /// Async runtime worker threads
    #[arg(long, default_value_t = default_threads(), value_name = "NUM")]
    pub threads: usize,

    /// Capacity of the file size channel between walkers and the aggregator
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE, value_name = "NUM")]
    pub queue_size: usize,

    /// Do not descend into directories matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Cancel the walk after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not cancel on a keypress from stdin
    #[arg(long)]
    pub no_stdin_cancel: bool,

    /// Show a live spinner instead of progress lines
    #[arg(short = 'p', long, conflicts_with = "verbose")]
    pub progress: bool,

    /// Print a detailed summary after the final total
    #[arg(long)]
    pub summary: bool,

    /// Debug logging to stderr
    #[arg(long)]
    pub debug: bool,
}

fn default_threads() -> usize {
    num_cpus::get().clamp(1, MAX_CONCURRENCY)
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Directories to walk
    pub roots: Vec<PathBuf>,

    /// Cap on concurrent directory listings
    pub concurrency: usize,

    /// Async runtime worker threads
    pub threads: usize,

    /// File size channel capacity
    pub queue_size: usize,

    /// Periodic progress interval (verbose or spinner mode only)
    pub report_interval: Option<Duration>,

    /// Cancel after this long
    pub timeout: Option<Duration>,

    /// Cancel on a stdin keypress
    pub stdin_cancel: bool,

    /// Show spinner
    pub show_progress: bool,

    /// Show detailed summary
    pub show_summary: bool,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,
}

impl WalkConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let roots = if args.roots.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            args.roots
        };

        if let Some(empty) = roots.iter().find(|r| r.as_os_str().is_empty()) {
            return Err(ConfigError::InvalidRoot {
                path: empty.clone(),
                reason: "path is empty".to_string(),
            });
        }

        if args.concurrency == 0 || args.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidConcurrency {
                count: args.concurrency,
                max: MAX_CONCURRENCY,
            });
        }

        if args.threads == 0 || args.threads > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidThreadCount {
                count: args.threads,
                max: MAX_CONCURRENCY,
            });
        }

        if args.queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        if args.interval_ms < MIN_INTERVAL_MS {
            return Err(ConfigError::InvalidInterval {
                millis: args.interval_ms,
                min: MIN_INTERVAL_MS,
            });
        }

        if args.timeout == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }

        let exclude_patterns = compile_patterns(&args.exclude_patterns)?;

        Ok(Self {
            roots,
            concurrency: args.concurrency,
            threads: args.threads,
            queue_size: args.queue_size,
            report_interval: (args.verbose || args.progress)
                .then(|| Duration::from_millis(args.interval_ms)),
            timeout: args.timeout.map(Duration::from_secs),
            stdin_cancel: !args.no_stdin_cancel,
            show_progress: args.progress,
            show_summary: args.summary,
            exclude_patterns,
        })
    }

    /// Default configuration for walking `roots` from library code
    pub fn for_roots(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            concurrency: DEFAULT_CONCURRENCY,
            threads: default_threads(),
            queue_size: DEFAULT_QUEUE_SIZE,
            report_interval: None,
            timeout: None,
            stdin_cancel: false,
            show_progress: false,
            show_summary: false,
            exclude_patterns: Vec::new(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size.max(MIN_QUEUE_SIZE);
        self
    }

    pub fn with_report_interval(mut self, interval: Option<Duration>) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        self.exclude_patterns = compile_patterns(patterns)?;
        Ok(self)
    }

    /// Check if a directory should be skipped
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&path))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}
