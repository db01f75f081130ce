//! Event payload types carried between the watcher, the workers, and observers.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to each published event.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Pipeline phase a task was in when it stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    /// Validating the request before touching the filesystem.
    Prepare,
    /// Reading the source under a shared lock.
    Read,
    /// Copying the source into the backup directory.
    Copy,
}

impl TaskPhase {
    /// Lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Read => "read",
            Self::Copy => "copy",
        }
    }
}

/// Progress notifications emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The drop directory subscription is active.
    WatchStarted {
        /// Watched directory.
        dir: PathBuf,
    },
    /// A creation event was turned into a processing task.
    FileDetected {
        /// Absolute path of the dropped file.
        path: PathBuf,
    },
    /// The backup copy is in place.
    BackupCompleted {
        /// Source file in the drop directory.
        source: PathBuf,
        /// Timestamped copy in the backup directory.
        backup: PathBuf,
    },
    /// The source was removed after its backup succeeded.
    SourceDeleted {
        /// Removed source file.
        path: PathBuf,
    },
    /// The source could not be removed; the backup stays valid.
    DeleteFailed {
        /// Source file that remains in the drop directory.
        path: PathBuf,
        /// Human-readable error detail.
        message: String,
    },
    /// The task ended without producing a backup.
    TaskFailed {
        /// Source file the task was bound to.
        path: PathBuf,
        /// Phase that failed.
        phase: TaskPhase,
        /// Human-readable error detail.
        message: String,
    },
    /// The drop directory can no longer be watched; the dispatch loop stops.
    WatchInvalidated {
        /// Directory that was being watched.
        dir: PathBuf,
    },
}

impl Event {
    /// Machine-friendly discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WatchStarted { .. } => "watch_started",
            Self::FileDetected { .. } => "file_detected",
            Self::BackupCompleted { .. } => "backup_completed",
            Self::SourceDeleted { .. } => "source_deleted",
            Self::DeleteFailed { .. } => "delete_failed",
            Self::TaskFailed { .. } => "task_failed",
            Self::WatchInvalidated { .. } => "watch_invalidated",
        }
    }

    /// Whether this event ends the task bound to its path.
    ///
    /// A successful backup is terminal only when no delete follows, so callers
    /// that know the delete mode should prefer matching on the variant.
    #[must_use]
    pub const fn is_task_failure(&self) -> bool {
        matches!(self, Self::TaskFailed { .. })
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Monotonic identifier assigned to the wrapped event.
    pub id: EventId,
    /// Timestamp recording when the envelope was produced.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event payload.
    pub event: Event,
}
