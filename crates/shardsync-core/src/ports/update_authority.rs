//! Update authority port (driven/secondary port)
//!
//! This module defines the interface to the single trusted server that
//! decides what the local installation must look like.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and the engine maps them onto its own taxonomy by phase.
//! - Uses `#[async_trait]` for async trait methods.
//! - No method retries; a failure is reported once and the caller decides
//!   whether it aborts the run or only the current step.

use std::path::Path;

use crate::domain::{ArtifactKey, DeletionList, SyncPlan, SyncRequest};

// ============================================================================
// IUpdateAuthority trait
// ============================================================================

/// Port trait for the remote update authority
///
/// ## Implementation Notes
///
/// - `download_artifact` must stream the body into `dest` rather than
///   buffering it in memory; archives can be large.
/// - Implementations own their timeouts. Downloads use a longer timeout than
///   the reconciliation and deletion-list calls.
#[async_trait::async_trait]
pub trait IUpdateAuthority: Send + Sync {
    /// Send the local manifest and receive the ordered artifact plan
    ///
    /// # Arguments
    /// * `request` - Manifest, settings snapshot and exclusion flag
    ///
    /// # Returns
    /// The artifacts to install, in the server's order
    async fn reconcile(&self, request: &SyncRequest) -> anyhow::Result<SyncPlan>;

    /// Download one artifact archive into `dest`
    ///
    /// # Arguments
    /// * `key` - Artifact identifier from the plan
    /// * `dest` - File to create or truncate with the archive bytes
    ///
    /// # Returns
    /// The number of bytes written
    async fn download_artifact(&self, key: &ArtifactKey, dest: &Path) -> anyhow::Result<u64>;

    /// Fetch the list of paths the server declares obsolete
    async fn fetch_delete_list(&self) -> anyhow::Result<DeletionList>;
}
