//! Deletion reconciliation
//!
//! Applies the server's list of obsolete paths to the game directory.
//! Files are removed, directories are removed recursively, and entries that
//! no longer exist are ignored so applying the same list twice is harmless.
//!
//! The running executable is never removed: a file entry whose name matches
//! it is skipped, and so is a directory entry that contains it.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use shardsync_core::domain::{DeletionList, RelativePath};
use shardsync_core::ports::ISyncObserver;

/// Counters for one deletion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionStats {
    /// Files removed
    pub files_deleted: usize,
    /// Directories removed with their contents
    pub directories_deleted: usize,
    /// Entries that did not exist
    pub absent: usize,
    /// Entries refused or skipped (invalid path, running executable)
    pub skipped: usize,
    /// Entries whose removal failed
    pub errors: Vec<String>,
}

impl DeletionStats {
    /// Total entries actually removed
    pub fn removed(&self) -> usize {
        self.files_deleted + self.directories_deleted
    }
}

/// Removes server-declared obsolete paths under a root directory
#[derive(Debug, Clone)]
pub struct DeletionReconciler {
    root: PathBuf,
    executable: Option<PathBuf>,
}

impl DeletionReconciler {
    /// Create a reconciler for `root`, protecting the current executable
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            executable: std::env::current_exe().ok(),
        }
    }

    /// Override the executable to protect
    #[must_use]
    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    fn executable_name(&self) -> Option<&std::ffi::OsStr> {
        self.executable.as_deref().and_then(Path::file_name)
    }

    /// Whether deleting the directory `dir` would remove the executable
    fn contains_executable(&self, dir: &Path) -> bool {
        let Some(exe) = &self.executable else {
            return false;
        };
        let exe = std::fs::canonicalize(exe).unwrap_or_else(|_| exe.clone());
        let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        exe.starts_with(dir)
    }

    /// Apply every entry of `list`
    ///
    /// Individual failures are logged, reported to `observer` and counted;
    /// they never stop the pass.
    #[instrument(skip(self, list, observer), fields(root = %self.root.display(), entries = list.len()))]
    pub async fn apply(&self, list: &DeletionList, observer: &dyn ISyncObserver) -> DeletionStats {
        let fail = |stats: &mut DeletionStats, message: String| {
            observer.on_status(&message);
            stats.errors.push(message);
        };
        let mut stats = DeletionStats::default();

        for entry in list.entries() {
            let relative = match RelativePath::parse(entry) {
                Ok(p) => p,
                Err(err) => {
                    warn!(entry = %entry, %err, "Refusing deletion entry");
                    observer.on_status(&format!("Refusing to delete '{}': {}", entry, err));
                    stats.skipped += 1;
                    continue;
                }
            };
            let target = relative.to_host_path(&self.root);

            let metadata = match tokio::fs::symlink_metadata(&target).await {
                Ok(m) => m,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %relative, "Already absent");
                    stats.absent += 1;
                    continue;
                }
                Err(err) => {
                    warn!(path = %relative, %err, "Cannot stat deletion entry");
                    fail(&mut stats, format!("Cannot delete {}: {}", relative, err));
                    continue;
                }
            };

            if metadata.is_dir() {
                if self.contains_executable(&target) {
                    warn!(path = %relative, "Directory contains the running executable, skipping");
                    stats.skipped += 1;
                    continue;
                }
                match tokio::fs::remove_dir_all(&target).await {
                    Ok(()) => {
                        info!(path = %relative, "Removed directory");
                        stats.directories_deleted += 1;
                    }
                    Err(err) => {
                        warn!(path = %relative, %err, "Cannot remove directory");
                        fail(&mut stats, format!("Cannot delete {}: {}", relative, err));
                    }
                }
            } else {
                if self.executable_name() == Some(std::ffi::OsStr::new(relative.file_name())) {
                    debug!(path = %relative, "Skipping running executable");
                    stats.skipped += 1;
                    continue;
                }
                match tokio::fs::remove_file(&target).await {
                    Ok(()) => {
                        info!(path = %relative, "Removed file");
                        stats.files_deleted += 1;
                    }
                    Err(err) => {
                        warn!(path = %relative, %err, "Cannot remove file");
                        fail(&mut stats, format!("Cannot delete {}: {}", relative, err));
                    }
                }
            }
        }

        stats
    }
}
