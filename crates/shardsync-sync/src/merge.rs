//! Settings merge
//!
//! The shared client settings file is never replaced wholesale. Only an
//! allow-list of top-level keys is copied from the staged document into the
//! local one; every other local key is kept as is. Values are treated as
//! opaque JSON.

use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::SyncError;

/// What [`SettingsMerger::merge_file`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The destination did not exist; the staged file was copied whole
    Bootstrapped,
    /// Allow-listed keys were overwritten; lists the keys that were set
    Merged(Vec<String>),
}

/// Field-level merge of a JSON object document
#[derive(Debug, Clone)]
pub struct SettingsMerger {
    keys: Vec<String>,
}

impl SettingsMerger {
    /// Create a merger for the given allow-list
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Keys the server may overwrite
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Overwrite allow-listed keys of `local` with their values in `staged`
    ///
    /// Keys absent from `staged` are left alone. Returns the keys set.
    pub fn merge_documents(
        &self,
        local: &mut Map<String, Value>,
        staged: &Map<String, Value>,
    ) -> Vec<String> {
        let mut applied = Vec::new();
        for key in &self.keys {
            if let Some(value) = staged.get(key) {
                local.insert(key.clone(), value.clone());
                applied.push(key.clone());
            }
        }
        applied
    }

    /// Merge the staged file into `dest`, writing the result back indented
    ///
    /// If `dest` does not exist yet the staged file is copied as is. The
    /// merged document is written to a temporary file next to `dest` and
    /// moved over it, so a failed write never truncates the local settings.
    ///
    /// # Errors
    /// [`SyncError::Merge`] if `dest` cannot be inspected, either document is
    /// not a JSON object or the result cannot be written. The destination is
    /// left untouched in that case.
    #[instrument(skip(self), fields(dest = %dest.display()))]
    pub async fn merge_file(&self, staged: &Path, dest: &Path) -> Result<MergeOutcome, SyncError> {
        let merge_error = |message: String| SyncError::Merge {
            path: dest.to_path_buf(),
            message,
        };

        let exists = tokio::fs::try_exists(dest)
            .await
            .map_err(|e| merge_error(format!("cannot inspect destination: {}", e)))?;
        if !exists {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(staged, dest).await?;
            info!("Settings file absent, installed staged copy");
            return Ok(MergeOutcome::Bootstrapped);
        }

        let mut local = read_object(dest).await?;
        let staged_doc = read_object(staged).await?;
        let applied = self.merge_documents(&mut local, &staged_doc);

        let text = serde_json::to_string_pretty(&Value::Object(local))
            .map_err(|e| merge_error(e.to_string()))?;
        let target = dest.to_path_buf();
        tokio::task::spawn_blocking(move || replace_file(&target, text.as_bytes()))
            .await
            .map_err(|e| merge_error(format!("write task failed: {}", e)))?
            .map_err(|e| merge_error(e.to_string()))?;

        debug!(keys = ?applied, "Merged settings keys");
        Ok(MergeOutcome::Merged(applied))
    }
}

/// Replace `dest` with `contents` through a sibling temporary file
fn replace_file(dest: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".shardsync-merge-")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Read `path` and parse it as a JSON object
async fn read_object(path: &Path) -> Result<Map<String, Value>, SyncError> {
    let merge_error = |message: String| SyncError::Merge {
        path: path.to_path_buf(),
        message,
    };

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| merge_error(e.to_string()))?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(merge_error("document is not a JSON object".to_string())),
        Err(e) => Err(merge_error(e.to_string())),
    }
}
