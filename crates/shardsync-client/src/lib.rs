//! shardsync client - HTTP adapter for the update server
//!
//! Provides:
//! - Manifest reconciliation (`POST /api/updater`)
//! - Streamed artifact downloads (`GET /download/<key>`)
//! - Deletion list retrieval (`GET /api/delete-list`)
//!
//! ## Modules
//!
//! - [`client`] - Update server HTTP client
//! - [`provider`] - [`IUpdateAuthority`](shardsync_core::ports::IUpdateAuthority) implementation

pub mod client;
pub mod provider;

use thiserror::Error;

/// Errors that can occur when talking to the update server
#[derive(Debug, Error)]
pub enum ClientError {
    /// A network-level error occurred (connect, timeout, TLS, body read)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Server returned {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request URL
        url: String,
    },

    /// The response body could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Writing a downloaded artifact to disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
