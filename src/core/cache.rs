//! Scratch cache directory lifecycle.
//!
//! One well-known root holds every materialized file. This manager creates
//! it, lists it, and sweeps the regular files out of it. It never touches
//! anything outside the root and never recurses into subdirectories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Settings;

/// Errors from cache directory operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cache root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to list cache directory {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A regular file currently held in the cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    /// File name within the cache root
    pub name: String,

    /// Full path
    pub path: PathBuf,

    /// Size in bytes
    pub size: u64,

    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// Outcome of a sweep over the cache root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    /// Immediate children found in the root (files and directories)
    pub found: usize,

    /// Regular files deleted
    pub deleted: usize,

    /// Regular files that could not be deleted
    pub failed: usize,
}

impl ClearReport {
    /// Boolean view: true once a non-empty root has been swept,
    /// regardless of individual delete failures
    pub fn cleared(&self) -> bool {
        self.found > 0
    }
}

/// Manages the single scratch cache root
#[derive(Debug, Clone)]
pub struct CacheDirectoryManager {
    root: PathBuf,
    verbose: bool,
}

impl CacheDirectoryManager {
    /// Create a manager for `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            verbose: false,
        }
    }

    /// Create a manager from resolved settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            root: settings.cache_root.clone(),
            verbose: settings.verbose,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make sure the root exists and is a directory
    pub fn ensure(&self) -> Result<&Path, CacheError> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(CacheError::NotADirectory(self.root.clone()));
        }

        fs::create_dir_all(&self.root).map_err(|source| CacheError::Create {
            path: self.root.clone(),
            source,
        })?;

        if self.verbose {
            debug!(root = %self.root.display(), "Cache root ready");
        }

        Ok(&self.root)
    }

    /// List the regular files in the root, oldest first.
    /// A missing root lists as empty.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        if !self.root.is_dir() {
            return Err(CacheError::NotADirectory(self.root.clone()));
        }

        let list_err = |source| CacheError::List {
            path: self.root.clone(),
            source,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };

            if !metadata.is_file() {
                continue;
            }

            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            entries.push(CacheEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                size: metadata.len(),
                modified,
            });
        }

        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Delete every regular file directly inside the root
    pub fn sweep(&self) -> ClearReport {
        self.sweep_with(|path| fs::remove_file(path))
    }

    /// Sweep the root and report whether there was anything to sweep.
    ///
    /// Returns `false` for a missing, non-directory, or empty root. Returns
    /// `true` otherwise, even when some deletions failed (those are logged).
    pub fn clear(&self) -> bool {
        self.sweep().cleared()
    }

    fn sweep_with<F>(&self, mut remove: F) -> ClearReport
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        let mut report = ClearReport::default();

        if !self.root.is_dir() {
            if self.verbose {
                debug!(root = %self.root.display(), "Cache root missing, nothing to clear");
            }
            return report;
        }

        let children: Vec<PathBuf> = match fs::read_dir(&self.root) {
            Ok(iter) => iter.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Failed to list cache root");
                return report;
            }
        };

        report.found = children.len();

        for path in children {
            if !path.is_file() {
                continue;
            }

            match remove(&path) {
                Ok(()) => {
                    report.deleted += 1;
                    if self.verbose {
                        debug!(file = %path.display(), "Deleted cached file");
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(file = %path.display(), error = %e, "Failed to delete cached file");
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sweep_counts_individual_failures() {
        let temp = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(temp.path().join(name), name).unwrap();
        }

        let manager = CacheDirectoryManager::new(temp.path());
        let report = manager.sweep_with(|path| {
            if path.ends_with("b.txt") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            } else {
                fs::remove_file(path)
            }
        });

        assert_eq!(report.found, 3);
        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, 1);
        assert!(report.cleared());
        assert!(temp.path().join("b.txt").exists());
    }

    #[test]
    fn test_ensure_creates_nested_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("ContentFile");
        let manager = CacheDirectoryManager::new(&root);

        manager.ensure().unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_ensure_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("occupied");
        fs::write(&root, b"x").unwrap();

        let manager = CacheDirectoryManager::new(&root);
        assert!(matches!(manager.ensure(), Err(CacheError::NotADirectory(_))));
        assert!(!manager.clear());
    }
}
