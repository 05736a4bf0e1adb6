//! Domain error types
//!
//! Validation failures for paths, digests and keys, and illegal
//! transitions of the sync run state machine.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid relative path (absolute, escaping the root, or empty)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid content digest (expected 64 lowercase hex characters)
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// Invalid artifact key
    #[error("Invalid artifact key: {0}")]
    InvalidArtifactKey(String),

    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },
}
