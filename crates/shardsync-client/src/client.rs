//! Update server HTTP client
//!
//! Provides a typed HTTP client for the three endpoints of the update
//! server. Handles timeouts, status checking, JSON decoding, and streaming
//! artifact bodies to disk.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shardsync_client::client::UpdateClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = UpdateClient::with_base_url("http://localhost:3300")?;
//! let deletions = client.fetch_delete_list().await?;
//! println!("{} obsolete paths", deletions.len());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use shardsync_core::config::ServerConfig;
use shardsync_core::domain::{ArtifactKey, DeletionList, SyncPlan, SyncRequest};

use crate::ClientError;

/// Reconciliation endpoint
const RECONCILE_PATH: &str = "/api/updater";

/// Deletion list endpoint
const DELETE_LIST_PATH: &str = "/api/delete-list";

/// Artifact download prefix; the key is appended verbatim
const DOWNLOAD_PREFIX: &str = "/download/";

// ============================================================================
// UpdateClient
// ============================================================================

/// HTTP client for the update server
///
/// Wraps `reqwest::Client` with base URL construction and the two timeout
/// classes used by the server: a short one for JSON calls and a long one
/// for artifact downloads.
#[derive(Debug, Clone)]
pub struct UpdateClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
    /// Timeout for reconciliation and delete-list calls
    request_timeout: Duration,
    /// Timeout for a single artifact download
    download_timeout: Duration,
}

impl UpdateClient {
    /// Creates a client from the server section of the configuration
    pub fn new(config: &ServerConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            download_timeout: config.download_timeout(),
        })
    }

    /// Creates a client with default timeouts and a custom base URL (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let config = ServerConfig {
            base_url: base_url.into(),
            ..ServerConfig::default()
        };
        Self::new(&config)
    }

    /// Returns the base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a server path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Creates a request builder for the given method and path
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Turns a non-success status into [`ClientError::Status`]
    fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }

    /// Posts the local manifest and returns the server's install plan
    ///
    /// The response must be a JSON object; its keys, in document order, are
    /// the artifacts to install.
    #[instrument(skip(self, request), fields(files = request.files_to_check.len()))]
    pub async fn reconcile(&self, request: &SyncRequest) -> Result<SyncPlan, ClientError> {
        debug!("Posting manifest to {}", RECONCILE_PATH);

        let response = self
            .request(Method::POST, RECONCILE_PATH)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;
        let body: Value = Self::check_status(response)?.json().await?;

        let Value::Object(object) = body else {
            return Err(ClientError::InvalidResponse(format!(
                "expected a JSON object from {}, got {}",
                RECONCILE_PATH,
                json_kind(&body)
            )));
        };

        let plan = SyncPlan::from_response(&object)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        info!(artifacts = plan.len(), "Received sync plan");
        Ok(plan)
    }

    /// Streams the artifact archive for `key` into `dest`
    ///
    /// The destination is created or truncated. Returns the number of bytes
    /// written.
    #[instrument(skip(self, dest), fields(key = %key))]
    pub async fn download_artifact(
        &self,
        key: &ArtifactKey,
        dest: &Path,
    ) -> Result<u64, ClientError> {
        let path = format!("{}{}", DOWNLOAD_PREFIX, key.as_str());
        debug!("Downloading artifact from {}", path);

        let response = self
            .request(Method::GET, &path)
            .timeout(self.download_timeout)
            .send()
            .await?;
        let response = Self::check_status(response)?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(bytes = written, "Artifact downloaded");
        Ok(written)
    }

    /// Fetches the list of paths the server declares obsolete
    #[instrument(skip(self))]
    pub async fn fetch_delete_list(&self) -> Result<DeletionList, ClientError> {
        let response = self
            .request(Method::GET, DELETE_LIST_PATH)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let body: Value = Self::check_status(response)?.json().await?;

        let list: DeletionList = serde_json::from_value(body).map_err(|e| {
            ClientError::InvalidResponse(format!(
                "expected a JSON array of strings from {}: {}",
                DELETE_LIST_PATH, e
            ))
        })?;
        debug!(entries = list.len(), "Received deletion list");
        Ok(list)
    }
}

/// Short name of a JSON value's type, for error messages
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
