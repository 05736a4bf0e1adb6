//! Sync orchestrator
//!
//! Drives one synchronization run through the [`SyncRun`] state machine:
//!
//! ```text
//! Scanning → Reconciling → Installing(i/n) → Cleaning → Done
//! ```
//!
//! Scanning and reconciliation are all-or-nothing: a failure there aborts
//! the run. Once the server has produced a plan, per-artifact and deletion
//! failures are logged, counted in the [`SyncReport`] and the run continues.
//! Artifacts are installed one at a time in plan order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use shardsync_core::config::Config;
use shardsync_core::domain::{InstallRules, RelativePath, SyncPlan, SyncRequest, SyncRun};
use shardsync_core::ports::{ISyncObserver, IUpdateAuthority};

use crate::deletion::DeletionReconciler;
use crate::installer::{ArtifactInstaller, InstallStats};
use crate::scanner::ManifestScanner;
use crate::SyncError;

/// Final status line of a successful run
pub const COMPLETED_STATUS: &str = "Update completed successfully";

// ============================================================================
// SyncReport
// ============================================================================

/// Summary of a completed synchronization run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Artifacts listed in the server plan
    pub artifacts_total: usize,
    /// Artifacts installed without error
    pub artifacts_installed: usize,
    /// Artifacts skipped because they fall under the excluded prefix
    pub artifacts_skipped: usize,
    /// Files written (replaced or created)
    pub files_installed: usize,
    /// Merge target updates
    pub files_merged: usize,
    /// Protected files left untouched
    pub files_protected: usize,
    /// Files and directories removed by the deletion list
    pub entries_deleted: usize,
    /// Local files that could not be hashed
    pub scan_failures: usize,
    /// Non-fatal errors encountered during the run
    pub errors: Vec<String>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    /// Number of artifacts that failed to install
    pub fn artifacts_failed(&self) -> usize {
        self.artifacts_total - self.artifacts_installed - self.artifacts_skipped
    }

    /// Whether anything went wrong without aborting the run
    pub fn has_failures(&self) -> bool {
        self.scan_failures > 0 || !self.errors.is_empty()
    }

    fn absorb(&mut self, stats: InstallStats) {
        self.files_installed += stats.files_installed + stats.files_created;
        self.files_merged += stats.files_merged;
        self.files_protected += stats.files_protected;
        self.errors.extend(stats.errors);
    }
}

// ============================================================================
// SyncOrchestrator
// ============================================================================

/// Runs scan → reconcile → install → clean against one update authority
pub struct SyncOrchestrator {
    authority: Arc<dyn IUpdateAuthority>,
    root: PathBuf,
    exclusion: Option<RelativePath>,
    settings_path: Option<RelativePath>,
    scanner: ManifestScanner,
    installer: ArtifactInstaller,
    deletion: DeletionReconciler,
}

impl SyncOrchestrator {
    /// Create an orchestrator for `root` with no exclusion
    pub fn new(
        authority: Arc<dyn IUpdateAuthority>,
        root: impl Into<PathBuf>,
        rules: InstallRules,
    ) -> Self {
        let root = root.into();
        let settings_path = rules.merge_target.as_ref().map(|t| t.path.clone());
        Self {
            scanner: ManifestScanner::new(root.clone()),
            installer: ArtifactInstaller::new(Arc::clone(&authority), root.clone(), rules),
            deletion: DeletionReconciler::new(root.clone()),
            authority,
            root,
            exclusion: None,
            settings_path,
        }
    }

    /// Create an orchestrator from the loaded configuration
    pub fn from_config(config: &Config, authority: Arc<dyn IUpdateAuthority>) -> Self {
        Self::new(authority, config.sync.root.clone(), config.install.rules())
            .with_exclusion(config.sync.exclusion())
    }

    /// Skip the subtree `prefix` when scanning and installing
    #[must_use]
    pub fn with_exclusion(mut self, prefix: Option<RelativePath>) -> Self {
        self.scanner = self.scanner.with_exclusion(prefix.clone());
        self.exclusion = prefix;
        self
    }

    /// Override the executable protected from deletion
    #[must_use]
    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.deletion = self.deletion.with_executable(executable);
        self
    }

    /// Root directory being synchronized
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Execute one full run
    ///
    /// Progress and status lines go to `observer`. The run stops at the next
    /// checkpoint once `cancel` fires.
    ///
    /// # Errors
    /// Only fatal errors are returned (see [`SyncError::is_fatal`]); the
    /// observer has already received the final status line.
    #[instrument(skip(self, observer, cancel), fields(root = %self.root.display()))]
    pub async fn run(
        &self,
        observer: &dyn ISyncObserver,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        let mut run = SyncRun::new();
        let mut report = SyncReport::default();
        observer.on_progress(run.progress());

        // --- Scanning ---
        observer.on_status("Scanning local files...");
        let scan = match self.scanner.scan().await {
            Ok(scan) => scan,
            Err(err) => return Self::abort(&mut run, observer, err),
        };
        report.scan_failures = scan.failed.len();
        if cancel.is_cancelled() {
            return Self::cancelled(&mut run, observer);
        }

        // --- Reconciling ---
        run.begin_reconciling()?;
        let settings = self.read_settings_snapshot().await;
        let request = SyncRequest::new(scan.manifest, settings, self.exclusion.is_some());
        observer.on_status("Synchronizing files...");

        let plan = tokio::select! {
            result = self.authority.reconcile(&request) => match result {
                Ok(plan) => plan,
                Err(err) => {
                    let err = SyncError::SyncUnavailable(format!("{:#}", err));
                    return Self::abort(&mut run, observer, err);
                }
            },
            _ = cancel.cancelled() => return Self::cancelled(&mut run, observer),
        };

        // --- Installing ---
        match self.install_plan(&plan, &mut run, &mut report, observer, cancel).await {
            Ok(()) => {}
            Err(SyncError::Cancelled) => return Self::cancelled(&mut run, observer),
            Err(err) => return Err(err),
        }

        // --- Cleaning ---
        run.begin_cleaning()?;
        if cancel.is_cancelled() {
            return Self::cancelled(&mut run, observer);
        }
        observer.on_status("Removing obsolete files...");
        let deletions = tokio::select! {
            result = self.authority.fetch_delete_list() => result,
            _ = cancel.cancelled() => return Self::cancelled(&mut run, observer),
        };
        match deletions {
            Ok(list) => {
                let stats = self.deletion.apply(&list, observer).await;
                report.entries_deleted = stats.removed();
                report.errors.extend(stats.errors);
            }
            Err(err) => {
                let err = SyncError::DeletionFetch(format!("{:#}", err));
                warn!(%err, "Skipping deletion phase");
                observer.on_status(&err.to_string());
                report.errors.push(err.to_string());
            }
        }

        // --- Done ---
        run.complete()?;
        observer.on_progress(run.progress());
        observer.on_status(COMPLETED_STATUS);

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            installed = report.artifacts_installed,
            skipped = report.artifacts_skipped,
            failed = report.artifacts_failed(),
            deleted = report.entries_deleted,
            duration_ms = report.duration_ms,
            "Sync complete"
        );
        Ok(report)
    }

    /// Install every artifact of `plan`, advancing the run after each one
    async fn install_plan(
        &self,
        plan: &SyncPlan,
        run: &mut SyncRun,
        report: &mut SyncReport,
        observer: &dyn ISyncObserver,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        let total = plan.len();
        run.begin_installing(total)?;
        report.artifacts_total = total;

        for (index, key) in plan.artifacts().iter().enumerate() {
            let position = index + 1;
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let excluded = self
                .exclusion
                .as_ref()
                .is_some_and(|prefix| key.is_under(prefix));

            if excluded {
                debug!(key = %key, "Artifact under excluded prefix, skipping");
                report.artifacts_skipped += 1;
            } else {
                let fraction = position as f64 / total as f64;
                match self.installer.install(key, fraction, observer, cancel).await {
                    Ok(stats) => {
                        report.absorb(stats);
                        report.artifacts_installed += 1;
                        observer.on_status(&format!("Updated {} ({}/{})", key, position, total));
                    }
                    Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
                    Err(err) => {
                        warn!(key = %key, %err, "Artifact failed, continuing");
                        observer.on_status(&err.to_string());
                        report.errors.push(err.to_string());
                    }
                }
            }

            let progress = run.advance_installing()?;
            observer.on_progress(progress);
        }

        Ok(())
    }

    /// Raw text of the merge target, if it exists and is readable
    async fn read_settings_snapshot(&self) -> Option<String> {
        let path = self.settings_path.as_ref()?.to_host_path(&self.root);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Some(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path.display(), %err, "Cannot read settings file, sending empty snapshot");
                None
            }
        }
    }

    fn abort(
        run: &mut SyncRun,
        observer: &dyn ISyncObserver,
        err: SyncError,
    ) -> Result<SyncReport, SyncError> {
        if let Err(state_err) = run.fail(err.to_string()) {
            debug!(%state_err, "Run already past a failable phase");
        }
        warn!(%err, "Sync aborted");
        observer.on_status(&format!("Update failed: {}", err));
        Err(err)
    }

    fn cancelled(
        run: &mut SyncRun,
        observer: &dyn ISyncObserver,
    ) -> Result<SyncReport, SyncError> {
        if let Err(state_err) = run.cancel() {
            debug!(%state_err, "Run already terminal");
        }
        info!("Sync cancelled");
        observer.on_status(&SyncError::Cancelled.to_string());
        Err(SyncError::Cancelled)
    }
}
