//! Artifact installer
//!
//! Installs one server artifact into the game directory:
//!
//! 1. Stream the archive into a temporary file.
//! 2. Extract it into a fresh staging directory.
//! 3. Place every staged file according to [`InstallRules`]:
//!    merge target → [`SettingsMerger`], protected and already present → skip,
//!    anything else → copy over the destination.
//!
//! The temporary archive and the staging directory are owned by `tempfile`
//! guards and are removed on every exit path, including errors and
//! cancellation. Both live in the system temp directory, never under the
//! game root, so an interrupted run cannot leave staging files that would be
//! picked up by the next scan.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;

use shardsync_core::domain::{ArtifactKey, InstallDisposition, InstallRules, RelativePath};
use shardsync_core::ports::{FileEvent, FileOutcome, ISyncObserver, IUpdateAuthority};

use crate::merge::SettingsMerger;
use crate::SyncError;

/// Per-artifact install counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallStats {
    /// Existing files replaced
    pub files_installed: usize,
    /// Files that did not exist before
    pub files_created: usize,
    /// Merge target updates, including first-run bootstrap
    pub files_merged: usize,
    /// Protected files left untouched
    pub files_protected: usize,
    /// Non-fatal per-file failures (merge errors)
    pub errors: Vec<String>,
}

/// Downloads, stages and installs artifacts into one root directory
pub struct ArtifactInstaller {
    authority: Arc<dyn IUpdateAuthority>,
    root: PathBuf,
    rules: InstallRules,
    merger: Option<SettingsMerger>,
    temp_dir: Option<PathBuf>,
}

impl ArtifactInstaller {
    /// Create an installer for `root`
    pub fn new(
        authority: Arc<dyn IUpdateAuthority>,
        root: impl Into<PathBuf>,
        rules: InstallRules,
    ) -> Self {
        let merger = rules
            .merge_target
            .as_ref()
            .map(|target| SettingsMerger::new(target.keys.iter().cloned()));
        Self {
            authority,
            root: root.into(),
            rules,
            merger,
            temp_dir: None,
        }
    }

    /// Place temporary archives and staging directories under `dir`
    /// instead of the system temp directory
    #[must_use]
    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    /// Root directory artifacts are installed into
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Install one artifact
    ///
    /// `fraction` is the run's artifact progress (index / total) attached to
    /// every [`FileEvent`] emitted for this artifact.
    ///
    /// # Errors
    /// - [`SyncError::Cancelled`] if `cancel` fires before the download or
    ///   before any file is placed
    /// - [`SyncError::ArtifactInstall`] for download, extraction or copy
    ///   failures
    #[instrument(skip(self, observer, cancel), fields(key = %key))]
    pub async fn install(
        &self,
        key: &ArtifactKey,
        fraction: f64,
        observer: &dyn ISyncObserver,
        cancel: &CancellationToken,
    ) -> Result<InstallStats, SyncError> {
        let install_error = |message: String| SyncError::ArtifactInstall {
            key: key.to_string(),
            message,
        };

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let archive = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("shardsync-").suffix(".zip");
            match &self.temp_dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            }
        };
        let bytes = tokio::select! {
            result = self.authority.download_artifact(key, archive.path()) => {
                result.map_err(|e| install_error(format!("{:#}", e)))?
            }
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
        };
        debug!(bytes, "Artifact archive downloaded");

        let staging = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("shardsync-staging-");
            match &self.temp_dir {
                Some(dir) => builder.tempdir_in(dir)?,
                None => builder.tempdir()?,
            }
        };
        let archive_path = archive.path().to_path_buf();
        let staging_path = staging.path().to_path_buf();
        let staged_files = tokio::task::spawn_blocking(move || {
            extract_archive(&archive_path, &staging_path)
        })
        .await
        .map_err(|e| install_error(format!("extraction task failed: {}", e)))?
        .map_err(|e| install_error(format!("{:#}", e)))?;
        debug!(files = staged_files.len(), "Archive extracted");

        let mut stats = InstallStats::default();
        for relative in &staged_files {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let source = relative.to_host_path(staging.path());
            let outcome = match self.place_file(relative, &source).await {
                Ok(outcome) => outcome,
                Err(err @ SyncError::Merge { .. }) => {
                    warn!(path = %relative, %err, "Settings merge failed");
                    observer.on_status(&err.to_string());
                    stats.errors.push(err.to_string());
                    continue;
                }
                Err(err) => return Err(install_error(format!("{}: {}", relative, err))),
            };

            match outcome {
                FileOutcome::Installed => stats.files_installed += 1,
                FileOutcome::Created => stats.files_created += 1,
                FileOutcome::Merged => stats.files_merged += 1,
                FileOutcome::SkippedProtected => stats.files_protected += 1,
            }
            observer.on_file(&FileEvent {
                artifact: key.clone(),
                path: relative.clone(),
                outcome,
                fraction,
            });
        }

        info!(
            installed = stats.files_installed,
            created = stats.files_created,
            merged = stats.files_merged,
            protected = stats.files_protected,
            "Artifact installed"
        );
        Ok(stats)
    }

    /// Place one staged file at its destination under the install rules
    async fn place_file(
        &self,
        relative: &RelativePath,
        source: &Path,
    ) -> Result<FileOutcome, SyncError> {
        let dest = relative.to_host_path(&self.root);

        match self.rules.classify(relative) {
            InstallDisposition::Merge => {
                if let Some(merger) = &self.merger {
                    merger.merge_file(source, &dest).await?;
                    return Ok(FileOutcome::Merged);
                }
            }
            InstallDisposition::Protected => {
                if tokio::fs::try_exists(&dest).await? {
                    debug!(path = %relative, "Protected file exists, skipping");
                    return Ok(FileOutcome::SkippedProtected);
                }
            }
            InstallDisposition::Overwrite => {}
        }

        let existed = tokio::fs::try_exists(&dest).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source, &dest).await?;

        Ok(if existed {
            FileOutcome::Installed
        } else {
            FileOutcome::Created
        })
    }
}

/// Extract every file entry of a zip archive under `staging`
///
/// Entry names are normalized the same way as server paths; entries that
/// would land outside the staging directory are refused. Returns the
/// relative paths of the extracted files in archive order.
fn extract_archive(archive: &Path, staging: &Path) -> anyhow::Result<Vec<RelativePath>> {
    let reader = BufReader::new(File::open(archive).context("cannot open downloaded archive")?);
    let mut zip = ZipArchive::new(reader).context("invalid zip archive")?;
    let mut files = Vec::with_capacity(zip.len());

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();

        let relative = match RelativePath::parse(&name) {
            Ok(p) => p,
            Err(err) if entry.is_dir() => {
                // The archive root itself ("./" or "/").
                debug!(entry = %name, %err, "Skipping directory entry");
                continue;
            }
            Err(err) => {
                anyhow::bail!("refusing archive entry '{}': {}", name, err);
            }
        };

        let target = relative.to_host_path(staging);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)
            .with_context(|| format!("cannot stage '{}'", relative))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("cannot extract '{}'", relative))?;
        files.push(relative);
    }

    Ok(files)
}
