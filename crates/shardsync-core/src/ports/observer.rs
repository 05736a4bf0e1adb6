//! Sync observer port
//!
//! The caller of a sync run supplies an [`ISyncObserver`] to receive the
//! progress fraction and human-readable status lines. Presentation (progress
//! bars, log panes, terminal output) lives entirely on the other side of
//! this trait.

use std::fmt;

use serde::Serialize;

use crate::domain::{ArtifactKey, RelativePath};

/// What happened to one staged file during installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// Copied over the destination
    Installed,
    /// Protected or merge-target file that did not exist and was created
    Created,
    /// Allow-listed keys merged into the existing document
    Merged,
    /// Protected file left untouched
    SkippedProtected,
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileOutcome::Installed => "updated",
            FileOutcome::Created => "created",
            FileOutcome::Merged => "merged",
            FileOutcome::SkippedProtected => "skipped (protected)",
        };
        write!(f, "{}", s)
    }
}

/// Event emitted for every file processed from an artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEvent {
    /// Artifact the file came from
    pub artifact: ArtifactKey,
    /// Destination path relative to the sync root
    pub path: RelativePath,
    /// What was done
    pub outcome: FileOutcome,
    /// Progress of the run when the file was processed
    pub fraction: f64,
}

/// Receiver of progress and status information for a sync run
///
/// Implementations must be cheap; the engine calls them inline.
pub trait ISyncObserver: Send + Sync {
    /// Progress fraction in `[0, 1]`, monotonically non-decreasing
    fn on_progress(&self, fraction: f64);

    /// One human-readable status line
    fn on_status(&self, message: &str);

    /// One processed file; forwards a formatted line to `on_status` by default
    fn on_file(&self, event: &FileEvent) {
        self.on_status(&format!(
            "{} {} [{}] ({:.0}%)",
            event.outcome,
            event.path,
            event.artifact,
            event.fraction * 100.0
        ));
    }
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ISyncObserver for NullObserver {
    fn on_progress(&self, _fraction: f64) {}
    fn on_status(&self, _message: &str) {}
}
