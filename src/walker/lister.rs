//! Directory listing
//!
//! The walker never touches the filesystem directly; it goes through a
//! [`DirLister`]. [`FsLister`] reads the real filesystem, [`MemoryLister`]
//! serves a synthetic tree and records how many listings ran at once.

use crate::error::{ListError, ListResult};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Kind of a listed entry, as far as disk usage is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Descend into it
    Directory,
    /// Count its size (regular files, symlinks, devices, ...)
    File,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path of the entry
    pub path: PathBuf,

    /// Directory or not
    pub kind: EntryKind,

    /// Size in bytes (lstat size, links are not followed)
    pub size: u64,
}

impl DirEntry {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
        }
    }

    pub fn file(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Source of directory listings.
///
/// Called from tokio's blocking pool, so implementations may block.
pub trait DirLister: Send + Sync + 'static {
    fn list(&self, dir: &Path) -> ListResult<Vec<DirEntry>>;
}

/// Lists the local filesystem with `std::fs::read_dir`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirLister for FsLister {
    fn list(&self, dir: &Path) -> ListResult<Vec<DirEntry>> {
        let read_dir = std::fs::read_dir(dir).map_err(|e| ListError::new(dir, e))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| ListError::new(dir, e))?;

            // DirEntry::metadata does not traverse symlinks
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    debug!(
                        path = %entry.path().display(),
                        error = %e,
                        "Entry vanished during listing"
                    );
                    continue;
                }
            };

            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            entries.push(DirEntry {
                path: entry.path(),
                kind,
                size: metadata.len(),
            });
        }

        Ok(entries)
    }
}

/// In-memory directory tree for tests and benchmarks.
///
/// Tracks the number of concurrent `list` calls so callers can check the
/// concurrency cap, and can inject listing failures and per-listing latency.
#[derive(Debug, Default)]
pub struct MemoryLister {
    dirs: HashMap<PathBuf, Vec<DirEntry>>,
    failing: HashSet<PathBuf>,
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every listing
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Add a directory and any missing ancestors
    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.ensure_dir(path.as_ref());
        self
    }

    /// Add a file (and any missing ancestor directories)
    pub fn add_file(&mut self, path: impl AsRef<Path>, size: u64) -> &mut Self {
        let path = path.as_ref();
        let parent = path.parent().unwrap_or_else(|| Path::new("/"));
        self.ensure_dir(parent);
        if let Some(entries) = self.dirs.get_mut(parent) {
            entries.push(DirEntry::file(path, size));
        }
        self
    }

    /// Make listing this directory fail with "permission denied"
    pub fn fail_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path.as_ref();
        self.ensure_dir(path);
        self.failing.insert(path.to_path_buf());
        self
    }

    /// Number of files and bytes reachable from `root` if every listing succeeded
    pub fn expected_totals(&self, root: impl AsRef<Path>) -> (u64, u64) {
        let mut files = 0;
        let mut bytes = 0;
        let mut stack = vec![root.as_ref().to_path_buf()];

        while let Some(dir) = stack.pop() {
            for entry in self.dirs.get(&dir).into_iter().flatten() {
                if entry.is_dir() {
                    stack.push(entry.path.clone());
                } else {
                    files += 1;
                    bytes += entry.size;
                }
            }
        }

        (files, bytes)
    }

    /// Highest number of listings observed running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Total number of `list` calls made
    pub fn list_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn ensure_dir(&mut self, path: &Path) {
        if self.dirs.contains_key(path) {
            return;
        }
        self.dirs.insert(path.to_path_buf(), Vec::new());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.ensure_dir(parent);
            if let Some(entries) = self.dirs.get_mut(parent) {
                entries.push(DirEntry::directory(path));
            }
        }
    }
}

impl DirLister for MemoryLister {
    fn list(&self, dir: &Path) -> ListResult<Vec<DirEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let result = if self.failing.contains(dir) {
            Err(ListError::new(dir, io::Error::from(io::ErrorKind::PermissionDenied)))
        } else {
            self.dirs
                .get(dir)
                .cloned()
                .ok_or_else(|| ListError::new(dir, io::Error::from(io::ErrorKind::NotFound)))
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
