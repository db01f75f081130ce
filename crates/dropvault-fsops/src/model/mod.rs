//! Domain models for per-file processing.
//!
//! # Design
//! - Reports are plain values handed back to the caller once a task ends.
//! - Avoid embedding IO handles; the processor owns every file it opens.

use std::path::PathBuf;

/// Result of a successful locked read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadReport {
    /// Lines forwarded to the content sink.
    pub lines: usize,
    /// Bytes read from the source.
    pub bytes: u64,
    /// Attempts it took, including the successful one.
    pub attempts: u32,
}

/// Result of a successful backup copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Attempts it took, including the successful one.
    pub attempts: u32,
}

/// What happened to the source after its backup was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deletion is disabled; the source stays in the drop directory.
    Skipped,
    /// The source was removed.
    Deleted,
    /// Removal failed; the backup is still valid.
    Failed {
        /// Human-readable error detail.
        message: String,
    },
}

/// Summary of one task that produced a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    /// File picked up from the drop directory.
    pub source: PathBuf,
    /// Timestamped copy in the backup directory.
    pub backup: PathBuf,
    /// Attempts consumed by the read phase.
    pub read_attempts: u32,
    /// Attempts consumed by the copy phase.
    pub copy_attempts: u32,
    /// Post-backup handling of the source.
    pub delete: DeleteOutcome,
}
