//! Manifest and reconciliation exchange types
//!
//! - [`Manifest`] describes the local tree as path → digest
//! - [`SyncRequest`] is the body posted to `/api/updater`
//! - [`SyncPlan`] is the ordered list of artifacts the server wants installed
//! - [`DeletionList`] is the server's list of obsolete paths

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DomainError;
use super::newtypes::{ArtifactKey, ContentDigest, RelativePath};

/// Settings snapshot sent when the merge target does not exist locally
pub const EMPTY_SETTINGS_SNAPSHOT: &str = "{}";

// ============================================================================
// Manifest
// ============================================================================

/// Mapping from relative path to content digest
///
/// Paths are unique by construction. Iteration order is the lexical order
/// of the normalized paths; the order carries no meaning for the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<RelativePath, ContentDigest>,
}

impl Manifest {
    /// Create an empty manifest
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, returning the previous digest
    pub fn insert(&mut self, path: RelativePath, digest: ContentDigest) -> Option<ContentDigest> {
        self.entries.insert(path, digest)
    }

    /// Look up the digest for a path
    #[must_use]
    pub fn get(&self, path: &RelativePath) -> Option<&ContentDigest> {
        self.entries.get(path)
    }

    /// Whether the manifest has an entry for `path`
    #[must_use]
    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&RelativePath, &ContentDigest)> {
        self.entries.iter()
    }
}

// ============================================================================
// SyncRequest
// ============================================================================

/// Body of the reconciliation request
///
/// Field names are part of the wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Local manifest
    pub files_to_check: Manifest,
    /// Raw text of the shared settings file, or `"{}"` when absent
    pub settings_json: String,
    /// Whether the excluded subtree was omitted from scanning
    pub skip_classicuo: bool,
}

impl SyncRequest {
    /// Build a request; `None` settings become the empty-object sentinel
    pub fn new(files_to_check: Manifest, settings_json: Option<String>, skip_excluded: bool) -> Self {
        Self {
            files_to_check,
            settings_json: settings_json.unwrap_or_else(|| EMPTY_SETTINGS_SNAPSHOT.to_string()),
            skip_classicuo: skip_excluded,
        }
    }
}

// ============================================================================
// SyncPlan
// ============================================================================

/// Ordered list of artifacts to fetch and install
///
/// The server answers with a JSON object whose keys are artifact keys; the
/// values are not used. Key order in the document is the progress order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    artifacts: Vec<ArtifactKey>,
}

impl SyncPlan {
    /// Create a plan from an explicit list of keys
    #[must_use]
    pub fn new(artifacts: Vec<ArtifactKey>) -> Self {
        Self { artifacts }
    }

    /// Build a plan from the reconciliation response object
    ///
    /// # Errors
    /// Returns `DomainError::InvalidArtifactKey` if any key is blank
    pub fn from_response(object: &Map<String, Value>) -> Result<Self, DomainError> {
        let artifacts = object
            .keys()
            .map(|k| ArtifactKey::new(k.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { artifacts })
    }

    /// Artifact keys in server order
    #[must_use]
    pub fn artifacts(&self) -> &[ArtifactKey] {
        &self.artifacts
    }

    /// Number of artifacts
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether there is nothing to install
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

// ============================================================================
// DeletionList
// ============================================================================

/// Ordered list of paths the server declares obsolete
///
/// Entries are kept raw; they are validated one by one when applied so a
/// single malformed entry does not discard the whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeletionList {
    entries: Vec<String>,
}

impl DeletionList {
    /// Create a deletion list
    #[must_use]
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Raw entries in server order
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
