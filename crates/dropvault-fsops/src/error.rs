//! # Design
//!
//! - Provide structured, constant-message errors for the per-file pipeline.
//! - Capture the path, phase, and attempt count so failures are reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::error::Error as _;
use std::io;
use std::path::PathBuf;

use dropvault_events::TaskPhase;
use dropvault_telemetry::TaskOutcomeLabel;
use thiserror::Error;

/// Result type for file processing operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced while processing one dropped file.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// The shared lock or the read failed on every attempt of the read budget.
    #[error("source file could not be read")]
    ReadFailure {
        /// Source file that was being read.
        path: PathBuf,
        /// Attempts consumed before giving up.
        attempts: u32,
        /// Error from the final attempt.
        source: io::Error,
    },
    /// The copy failed on every attempt of the copy budget.
    #[error("backup copy could not be written")]
    BackupFailure {
        /// Source file that was being copied.
        path: PathBuf,
        /// Destination path including the backup name.
        destination: PathBuf,
        /// Attempts consumed before giving up.
        attempts: u32,
        /// Error from the final attempt.
        source: io::Error,
    },
    /// The source could not be removed after a successful backup.
    #[error("source file could not be deleted")]
    DeleteFailure {
        /// Source file that remains in the drop directory.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A back-off wait ended early because the process is shutting down.
    #[error("back-off wait interrupted")]
    Interrupted {
        /// Phase whose back-off was interrupted.
        phase: TaskPhase,
        /// Source file the task was bound to.
        path: PathBuf,
        /// Attempt that failed just before the interrupted wait.
        attempt: u32,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl FsOpsError {
    /// Pipeline phase the error belongs to.
    ///
    /// Delete failures do not fail the task and therefore carry no phase.
    #[must_use]
    pub const fn phase(&self) -> Option<TaskPhase> {
        match self {
            Self::ReadFailure { .. } => Some(TaskPhase::Read),
            Self::BackupFailure { .. } => Some(TaskPhase::Copy),
            Self::Interrupted { phase, .. } => Some(*phase),
            Self::InvalidInput { .. } => Some(TaskPhase::Prepare),
            Self::DeleteFailure { .. } => None,
        }
    }

    /// Metric label describing how the task ended when this error stopped it.
    #[must_use]
    pub const fn outcome_label(&self) -> TaskOutcomeLabel {
        match self {
            Self::ReadFailure { .. } => TaskOutcomeLabel::ReadFailed,
            Self::BackupFailure { .. } => TaskOutcomeLabel::BackupFailed,
            Self::Interrupted { .. } => TaskOutcomeLabel::Interrupted,
            Self::InvalidInput { .. } => TaskOutcomeLabel::Rejected,
            Self::DeleteFailure { .. } => TaskOutcomeLabel::BackedUp,
        }
    }

    /// Message followed by every source in the chain, joined with `": "`.
    #[must_use]
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}
