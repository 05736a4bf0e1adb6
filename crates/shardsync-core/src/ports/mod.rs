//! Port definitions (hexagonal architecture interfaces)
//!
//! ## Ports Overview
//!
//! - [`IUpdateAuthority`] - The remote authority: reconciliation, artifact
//!   download, deletion list
//! - [`ISyncObserver`] - Progress and status sink supplied by the caller

pub mod observer;
pub mod update_authority;

pub use observer::{FileEvent, FileOutcome, ISyncObserver, NullObserver};
pub use update_authority::IUpdateAuthority;
