//! shardsync sync - Directory synchronization engine
//!
//! Provides:
//! - Local manifest construction (SHA-256 content hashing)
//! - Server reconciliation through the `IUpdateAuthority` port
//! - Per-artifact download, extraction and install with protected-path and
//!   merge-file exceptions
//! - Post-sync deletion reconciliation
//!
//! ## Modules
//!
//! - [`engine`] - Orchestrator driving scan → reconcile → install → clean
//! - [`hasher`] - Streaming SHA-256 content digests
//! - [`scanner`] - Recursive local manifest scanner
//! - [`installer`] - Artifact download, staging and install
//! - [`merge`] - Allow-listed JSON settings merge
//! - [`deletion`] - Deletion list application

pub mod deletion;
pub mod engine;
pub mod hasher;
pub mod installer;
pub mod merge;
pub mod scanner;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a synchronization run
#[derive(Debug, Error)]
pub enum SyncError {
    /// A directory of the local tree could not be listed while scanning
    ///
    /// Unreadable individual files are not errors; the scanner omits them
    /// and reports them in `ScanOutcome::failed`.
    #[error("Cannot read directory {path}: {source}")]
    ScanDirectory {
        /// Directory that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The update server could not produce a plan
    #[error("Update server unavailable: {0}")]
    SyncUnavailable(String),

    /// One artifact could not be downloaded, extracted or installed
    #[error("Artifact '{key}' failed: {message}")]
    ArtifactInstall {
        /// Artifact key from the plan
        key: String,
        /// Failure description
        message: String,
    },

    /// The deletion list could not be fetched
    #[error("Deletion list unavailable: {0}")]
    DeletionFetch(String),

    /// The settings merge failed for one file
    #[error("Cannot merge {path}: {message}")]
    Merge {
        /// Destination file
        path: PathBuf,
        /// Parse or write failure
        message: String,
    },

    /// The run was cancelled by the caller
    #[error("Synchronization cancelled")]
    Cancelled,

    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A domain-level error propagated from shardsync-core
    #[error("Domain error: {0}")]
    Domain(#[from] shardsync_core::domain::DomainError),
}

impl SyncError {
    /// Whether this error aborts the whole run
    ///
    /// Artifact, merge and deletion failures only skip the current step.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::ScanDirectory { .. } | SyncError::SyncUnavailable(_) | SyncError::Cancelled
        )
    }
}
