//! SyncRun domain entity
//!
//! This module defines the state machine of a single synchronization run
//! and the progress bookkeeping attached to it.
//!
//! ```text
//! Scanning → Reconciling → Installing(i/n) → Cleaning → Done
//!     │           │              │               │
//!     └──► Failed ◄┘             └──► Cancelled ◄─┘
//! ```
//!
//! `Failed` is reachable only from `Scanning` and `Reconciling`. Once a plan
//! has been obtained every per-artifact failure is absorbed and the run
//! always reaches `Done`, unless it is cancelled.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Share of the progress bar covered by the installation phase
///
/// The remainder is filled when deletion reconciliation finishes, so the
/// value 1.0 is only ever reported for a completed run.
pub const INSTALL_PROGRESS_SHARE: f64 = 0.95;

/// Phase of a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Building the local manifest
    Scanning,
    /// Waiting for the server plan
    Reconciling,
    /// Installing artifact `current` of `total` (`current` already done)
    Installing {
        /// Number of artifacts processed so far
        current: usize,
        /// Number of artifacts in the plan
        total: usize,
    },
    /// Applying the server deletion list
    Cleaning,
    /// Run finished
    Done,
    /// Run aborted before a plan was obtained
    Failed(String),
    /// Run cancelled by the caller
    Cancelled,
}

impl SyncPhase {
    /// Returns true for `Done`, `Failed` and `Cancelled`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncPhase::Done | SyncPhase::Failed(_) | SyncPhase::Cancelled
        )
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: &SyncPhase) -> bool {
        use SyncPhase::*;
        match (self, next) {
            (Scanning, Reconciling) => true,
            (Scanning | Reconciling, Failed(_)) => true,
            (Reconciling, Installing { current: 0, .. }) => true,
            (
                Installing { current, total },
                Installing {
                    current: next_current,
                    total: next_total,
                },
            ) => total == next_total && next_current > current && next_current <= total,
            (Installing { .. }, Cleaning) => true,
            (Cleaning, Done) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::Scanning => write!(f, "scanning"),
            SyncPhase::Reconciling => write!(f, "reconciling"),
            SyncPhase::Installing { current, total } => {
                write!(f, "installing ({}/{})", current, total)
            }
            SyncPhase::Cleaning => write!(f, "cleaning"),
            SyncPhase::Done => write!(f, "done"),
            SyncPhase::Failed(reason) => write!(f, "failed: {}", reason),
            SyncPhase::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Fraction of the progress bar after `current` of `total` artifacts
pub fn install_progress(current: usize, total: usize) -> f64 {
    if total == 0 {
        return INSTALL_PROGRESS_SHARE;
    }
    INSTALL_PROGRESS_SHARE * (current.min(total) as f64 / total as f64)
}

/// State of one synchronization run
///
/// Created fresh for every run; nothing is carried over between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRun {
    phase: SyncPhase,
    progress: f64,
}

impl SyncRun {
    /// Start a new run in the `Scanning` phase
    pub fn new() -> Self {
        Self {
            phase: SyncPhase::Scanning,
            progress: 0.0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> &SyncPhase {
        &self.phase
    }

    /// Last accepted progress value
    pub fn progress(&self) -> f64 {
        self.progress
    }

    fn transition(&mut self, next: SyncPhase) -> Result<(), DomainError> {
        if !self.phase.can_transition_to(&next) {
            return Err(DomainError::InvalidState {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Scanning → Reconciling
    pub fn begin_reconciling(&mut self) -> Result<(), DomainError> {
        self.transition(SyncPhase::Reconciling)
    }

    /// Reconciling → Installing(0/total)
    pub fn begin_installing(&mut self, total: usize) -> Result<(), DomainError> {
        self.transition(SyncPhase::Installing { current: 0, total })
    }

    /// Installing(i/n) → Installing(i+1/n), returning the new progress
    pub fn advance_installing(&mut self) -> Result<f64, DomainError> {
        let SyncPhase::Installing { current, total } = self.phase else {
            return Err(DomainError::InvalidState {
                from: self.phase.to_string(),
                to: "installing".to_string(),
            });
        };
        self.transition(SyncPhase::Installing {
            current: current + 1,
            total,
        })?;
        Ok(self.report_progress(install_progress(current + 1, total)))
    }

    /// Installing → Cleaning
    pub fn begin_cleaning(&mut self) -> Result<(), DomainError> {
        self.transition(SyncPhase::Cleaning)
    }

    /// Cleaning → Done; progress becomes exactly 1.0
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.transition(SyncPhase::Done)?;
        self.progress = 1.0;
        Ok(())
    }

    /// Scanning/Reconciling → Failed
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(SyncPhase::Failed(reason.into()))
    }

    /// Any non-terminal phase → Cancelled
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition(SyncPhase::Cancelled)
    }

    /// Record a progress value, keeping the sequence monotonic
    ///
    /// Values below the last accepted one are raised to it, and values are
    /// capped at [`INSTALL_PROGRESS_SHARE`] until the run completes. The
    /// accepted value is returned.
    pub fn report_progress(&mut self, fraction: f64) -> f64 {
        let capped = if fraction.is_nan() {
            self.progress
        } else {
            fraction.clamp(0.0, INSTALL_PROGRESS_SHARE)
        };
        self.progress = self.progress.max(capped);
        self.progress
    }
}

impl Default for SyncRun {
    fn default() -> Self {
        Self::new()
    }
}
