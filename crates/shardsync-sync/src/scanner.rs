//! Local manifest scanner
//!
//! Walks the game directory and maps every regular file's root-relative path
//! to its SHA-256 digest.
//!
//! - An unreadable directory aborts the scan with [`SyncError::ScanDirectory`].
//! - An unreadable file is logged and left out of the manifest. The server
//!   treats a missing entry like a changed one, so the file is re-fetched.
//! - When an exclusion prefix is set, nothing under it is hashed or reported.
//! - Symbolic links to files are hashed through the link; links to
//!   directories are not followed.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use shardsync_core::domain::{Manifest, RelativePath};

use crate::hasher::hash_file;
use crate::SyncError;

/// Result of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Digests of every file that could be read
    pub manifest: Manifest,
    /// Files omitted because they could not be hashed
    pub failed: Vec<PathBuf>,
}

/// Builds a [`Manifest`] for a local directory tree
#[derive(Debug, Clone)]
pub struct ManifestScanner {
    root: PathBuf,
    exclusion: Option<RelativePath>,
}

impl ManifestScanner {
    /// Create a scanner for `root` with no exclusion
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclusion: None,
        }
    }

    /// Skip everything under `prefix`; `None` disables exclusion
    #[must_use]
    pub fn with_exclusion(mut self, prefix: Option<RelativePath>) -> Self {
        self.exclusion = prefix;
        self
    }

    /// Root directory being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree and hash every regular file
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn scan(&self) -> Result<ScanOutcome, SyncError> {
        let mut outcome = ScanOutcome::default();
        self.walk_directory(&self.root, &mut outcome).await?;

        info!(
            files = outcome.manifest.len(),
            failed = outcome.failed.len(),
            "Local scan complete"
        );
        Ok(outcome)
    }

    fn is_excluded(&self, path: &RelativePath) -> bool {
        self.exclusion
            .as_ref()
            .is_some_and(|prefix| path.starts_with(prefix))
    }

    /// Recursively walk `dir`, adding file digests to `outcome`
    fn walk_directory<'a>(
        &'a self,
        dir: &'a Path,
        outcome: &'a mut ScanOutcome,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), SyncError>> + Send + 'a>>
    {
        Box::pin(async move {
            let scan_error = |source: std::io::Error| SyncError::ScanDirectory {
                path: dir.to_path_buf(),
                source,
            };

            let mut entries = tokio::fs::read_dir(dir).await.map_err(scan_error)?;

            while let Some(entry) = entries.next_entry().await.map_err(scan_error)? {
                let entry_path = entry.path();
                let relative = match RelativePath::strip_root(&entry_path, &self.root) {
                    Ok(p) => p,
                    Err(err) => {
                        warn!(path = ?entry_path, %err, "Skipping unrepresentable path");
                        outcome.failed.push(entry_path);
                        continue;
                    }
                };

                if self.is_excluded(&relative) {
                    debug!(path = %relative, "Excluded from scan");
                    continue;
                }

                let file_type = match entry.file_type().await {
                    Ok(t) => t,
                    Err(err) => {
                        warn!(path = %relative, %err, "Cannot stat entry, omitting");
                        outcome.failed.push(entry_path);
                        continue;
                    }
                };

                if file_type.is_dir() {
                    self.walk_directory(&entry_path, outcome).await?;
                    continue;
                }

                let is_file = if file_type.is_symlink() {
                    tokio::fs::metadata(&entry_path)
                        .await
                        .map(|m| m.is_file())
                        .unwrap_or(false)
                } else {
                    file_type.is_file()
                };
                if !is_file {
                    continue;
                }

                match hash_file(&entry_path).await {
                    Ok(digest) => {
                        outcome.manifest.insert(relative, digest);
                    }
                    Err(err) => {
                        warn!(path = %relative, %err, "Cannot hash file, omitting from manifest");
                        outcome.failed.push(entry_path);
                    }
                }
            }

            Ok(())
        })
    }
}
