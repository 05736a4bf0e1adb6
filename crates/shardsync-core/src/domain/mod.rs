//! Domain entities and business logic
//!
//! This module contains the core domain types for shardsync:
//! - Newtypes for validated paths, digests and artifact keys
//! - Manifest and reconciliation exchange types
//! - Install rules (protected subtrees, merge target)
//! - The sync run state machine
//! - Domain-specific error types

pub mod errors;
pub mod manifest;
pub mod newtypes;
pub mod rules;
pub mod session;

// Re-export commonly used types
pub use errors::DomainError;
pub use manifest::{DeletionList, Manifest, SyncPlan, SyncRequest, EMPTY_SETTINGS_SNAPSHOT};
pub use newtypes::*;
pub use rules::{InstallDisposition, InstallRules, MergeTarget};
pub use session::{install_progress, SyncPhase, SyncRun, INSTALL_PROGRESS_SHARE};
