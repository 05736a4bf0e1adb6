//! HttpUpdateAuthority - IUpdateAuthority implementation over HTTP
//!
//! Wraps the [`UpdateClient`] and adds request context to its errors so the
//! engine can log them without knowing about HTTP.

use std::path::Path;

use anyhow::{Context, Result};

use shardsync_core::domain::{ArtifactKey, DeletionList, SyncPlan, SyncRequest};
use shardsync_core::ports::IUpdateAuthority;

use crate::client::UpdateClient;

/// Update authority backed by the HTTP update server
#[derive(Debug, Clone)]
pub struct HttpUpdateAuthority {
    client: UpdateClient,
}

impl HttpUpdateAuthority {
    /// Creates a new authority from an existing client
    pub fn new(client: UpdateClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &UpdateClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IUpdateAuthority for HttpUpdateAuthority {
    async fn reconcile(&self, request: &SyncRequest) -> Result<SyncPlan> {
        self.client
            .reconcile(request)
            .await
            .with_context(|| format!("reconciliation with {} failed", self.client.base_url()))
    }

    async fn download_artifact(&self, key: &ArtifactKey, dest: &Path) -> Result<u64> {
        self.client
            .download_artifact(key, dest)
            .await
            .with_context(|| format!("download of artifact '{}' failed", key))
    }

    async fn fetch_delete_list(&self) -> Result<DeletionList> {
        self.client
            .fetch_delete_list()
            .await
            .context("fetching the deletion list failed")
    }
}
