//! Install rules: protected subtrees and the merge target
//!
//! The installer consults [`InstallRules::classify`] for every staged file.
//! The merge target is checked first, then the protected subtrees; anything
//! else is copied over unconditionally.

use serde::{Deserialize, Serialize};

use super::newtypes::RelativePath;

/// The single file synchronized by selective key overwrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTarget {
    /// Location of the file relative to the sync root
    pub path: RelativePath,
    /// Top-level keys the server is allowed to overwrite
    pub keys: Vec<String>,
}

impl MergeTarget {
    /// Create a merge target
    pub fn new(path: RelativePath, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            path,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

/// How a staged file must be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallDisposition {
    /// Field-level merge into the existing document
    Merge,
    /// Only created if absent, never overwritten
    Protected,
    /// Copied over the destination unconditionally
    Overwrite,
}

/// Protection and merge exceptions applied while installing artifacts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRules {
    /// Subtrees whose existing files are never overwritten
    pub protected_paths: Vec<RelativePath>,
    /// File merged instead of replaced
    pub merge_target: Option<MergeTarget>,
}

impl InstallRules {
    /// Rules with no exceptions: every file is overwritten
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a protected subtree
    #[must_use]
    pub fn with_protected(mut self, path: RelativePath) -> Self {
        self.protected_paths.push(path);
        self
    }

    /// Set the merge target
    #[must_use]
    pub fn with_merge_target(mut self, target: MergeTarget) -> Self {
        self.merge_target = Some(target);
        self
    }

    /// Decide how `path` must be installed
    #[must_use]
    pub fn classify(&self, path: &RelativePath) -> InstallDisposition {
        if self.merge_target.as_ref().is_some_and(|t| &t.path == path) {
            return InstallDisposition::Merge;
        }
        if self.is_protected(path) {
            return InstallDisposition::Protected;
        }
        InstallDisposition::Overwrite
    }

    /// Whether `path` falls under any protected subtree
    #[must_use]
    pub fn is_protected(&self, path: &RelativePath) -> bool {
        self.protected_paths.iter().any(|p| path.starts_with(p))
    }
}
