//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for the values exchanged
//! with the update server. Each newtype ensures data validity at
//! construction time.

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RelativePath
// ============================================================================

/// A path relative to the sync root, always stored with forward slashes
///
/// This is the key type of the manifest and the unit the installer and
/// deletion reconciler operate on. Construction rejects anything that could
/// resolve outside of the root: absolute paths, drive prefixes and `..`
/// components. `.` and empty components are dropped, so `a//b/./c` and
/// `a\b\c` both normalize to `a/b/c`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(String);

impl RelativePath {
    /// Parse a server-supplied or configured path string
    ///
    /// Backslashes are treated as separators regardless of host OS.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path is empty, absolute,
    /// or contains a `..` component
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let unified = raw.replace('\\', "/");

        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(DomainError::InvalidPath(format!(
                "Path must be relative: {raw}"
            )));
        }

        let mut parts = Vec::new();
        for part in unified.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    return Err(DomainError::InvalidPath(format!(
                        "Path must not contain '..': {raw}"
                    )));
                }
                other => parts.push(other),
            }
        }

        if parts.is_empty() {
            return Err(DomainError::InvalidPath(format!(
                "Path has no components: '{raw}'"
            )));
        }

        Ok(Self(parts.join("/")))
    }

    /// Build a RelativePath from a host path that is already relative
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` for non-UTF-8 components, `..`,
    /// root or prefix components
    pub fn from_path(path: &Path) -> Result<Self, DomainError> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(os) => {
                    let s = os.to_str().ok_or_else(|| {
                        DomainError::InvalidPath(format!(
                            "Path is not valid UTF-8: {}",
                            path.display()
                        ))
                    })?;
                    parts.push(s.to_string());
                }
                Component::CurDir => continue,
                _ => {
                    return Err(DomainError::InvalidPath(format!(
                        "Path must be relative and must not escape the root: {}",
                        path.display()
                    )));
                }
            }
        }

        if parts.is_empty() {
            return Err(DomainError::InvalidPath(format!(
                "Path has no components: '{}'",
                path.display()
            )));
        }

        Ok(Self(parts.join("/")))
    }

    /// Compute the path of `path` relative to `root`
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if `path` is not under `root`
    pub fn strip_root(path: &Path, root: &Path) -> Result<Self, DomainError> {
        let relative = path.strip_prefix(root).map_err(|_| {
            DomainError::InvalidPath(format!(
                "{} is not within {}",
                path.display(),
                root.display()
            ))
        })?;
        Self::from_path(relative)
    }

    /// Get the normalized string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Component-wise prefix test
    ///
    /// `ClassicUO` matches `ClassicUO/settings.json` and `ClassicUO` itself,
    /// but not `ClassicUOx/file`.
    #[must_use]
    pub fn starts_with(&self, prefix: &RelativePath) -> bool {
        self.0 == prefix.0
            || (self.0.len() > prefix.0.len()
                && self.0.starts_with(&prefix.0)
                && self.0.as_bytes()[prefix.0.len()] == b'/')
    }

    /// The final component
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Resolve against a host root directory
    #[must_use]
    pub fn to_host_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for part in self.0.split('/') {
            path.push(part);
        }
        path
    }
}

/// Detects Windows drive prefixes such as `C:` or `c:/`
fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RelativePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RelativePath> for String {
    fn from(value: RelativePath) -> Self {
        value.0
    }
}

// ============================================================================
// ContentDigest
// ============================================================================

/// SHA-256 content digest as 64 lowercase hexadecimal characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Length of the hex encoding of a SHA-256 digest
    pub const HEX_LEN: usize = 64;

    /// Create a new ContentDigest
    ///
    /// Uppercase input is accepted and folded to lowercase.
    ///
    /// # Errors
    /// Returns error if the string is not 64 hex characters
    pub fn new(hex: impl Into<String>) -> Result<Self, DomainError> {
        let hex = hex.into().to_ascii_lowercase();

        if hex.len() != Self::HEX_LEN {
            return Err(DomainError::InvalidDigest(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                hex.len()
            )));
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidDigest(format!(
                "not a hex string: {hex}"
            )));
        }

        Ok(Self(hex))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentDigest {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentDigest> for String {
    fn from(value: ContentDigest) -> Self {
        value.0
    }
}

// ============================================================================
// ArtifactKey
// ============================================================================

/// Opaque identifier of a server-packaged artifact
///
/// The key is used verbatim both to request the download
/// (`/download/<key>`) and to report progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Create a new ArtifactKey
    ///
    /// # Errors
    /// Returns error if the key is empty or whitespace only
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::InvalidArtifactKey(
                "Artifact key cannot be empty".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key, read as a relative path, lies under `prefix`
    ///
    /// Keys that are not valid relative paths never match.
    #[must_use]
    pub fn is_under(&self, prefix: &RelativePath) -> bool {
        RelativePath::parse(&self.0)
            .map(|p| p.starts_with(prefix))
            .unwrap_or(false)
    }
}

impl Display for ArtifactKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ArtifactKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactKey> for String {
    fn from(value: ArtifactKey) -> Self {
        value.0
    }
}
