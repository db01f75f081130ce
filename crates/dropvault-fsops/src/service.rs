//! File Processor: read, back up, and optionally delete one dropped file.
//!
//! # Design
//! - Steps run in a fixed order and each one is recorded in `fsops_steps_total`.
//! - A failed read or copy ends the task; the delete step never runs after one.
//! - A failed delete is reported but leaves the task successful.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dropvault_config::{DeleteMode, WatchSettings};
use dropvault_events::{Event, EventBus};
use dropvault_telemetry::{Metrics, TaskOutcomeLabel};
use tracing::{debug, error, info};

use crate::copier::RetryingCopier;
use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{DeleteOutcome, TaskReport};
use crate::naming::{Clock, SystemClock, backup_file_name};
use crate::reader::{ContentSink, LockedReader};
use crate::retry::Sleeper;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepKind {
    Read,
    Copy,
    Delete,
}

impl StepKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Copy => "copy",
            Self::Delete => "delete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepStatus {
    Started,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Processes dropped files one at a time; cheap to clone into workers.
#[derive(Clone)]
pub struct FileProcessor {
    backup_dir: PathBuf,
    delete_mode: DeleteMode,
    reader: LockedReader,
    copier: RetryingCopier,
    clock: Arc<dyn Clock>,
    remove: fn(&Path) -> io::Result<()>,
    events: EventBus,
    metrics: Metrics,
}

impl FileProcessor {
    /// Construct a processor for the given settings.
    ///
    /// `sleeper` performs every back-off wait of both retried phases.
    #[must_use]
    pub fn new(
        settings: &WatchSettings,
        sleeper: Arc<dyn Sleeper>,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        Self {
            backup_dir: settings.backup_dir.clone(),
            delete_mode: settings.delete_mode,
            reader: LockedReader::new(settings.read_retry, sleeper.clone(), metrics.clone()),
            copier: RetryingCopier::new(settings.copy_retry, sleeper, metrics.clone()),
            clock: Arc::new(SystemClock),
            remove: remove_file,
            events,
            metrics,
        }
    }

    /// Replace the clock used for backup timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the sink receiving file content lines.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ContentSink>) -> Self {
        self.reader = self.reader.with_sink(sink);
        self
    }

    /// Run the full pipeline for `source` and publish its outcome.
    ///
    /// # Errors
    ///
    /// Returns the read, copy, interruption, or input error that ended the
    /// task. Delete failures are reported in [`TaskReport::delete`] instead.
    pub fn process(&self, source: &Path) -> FsOpsResult<TaskReport> {
        info!(path = %source.display(), "processing file");

        let result = self.execute_pipeline(source);
        match &result {
            Ok(_) => self.metrics.inc_task_outcome(TaskOutcomeLabel::BackedUp),
            Err(err) => {
                self.metrics.inc_task_outcome(err.outcome_label());
                if let Some(phase) = err.phase() {
                    let _ = self.events.publish(Event::TaskFailed {
                        path: source.to_path_buf(),
                        phase,
                        message: err.detail(),
                    });
                }
            }
        }
        result
    }

    fn execute_pipeline(&self, source: &Path) -> FsOpsResult<TaskReport> {
        let file_name = source
            .file_name()
            .ok_or_else(|| FsOpsError::InvalidInput {
                field: "source",
                reason: "missing_file_name",
                value: Some(source.display().to_string()),
            })?;

        let read = self.execute_step(StepKind::Read, || self.reader.read(source))?;

        let backup_name = backup_file_name(&file_name.to_string_lossy(), &self.clock.timestamp());
        let backup = self.backup_dir.join(backup_name);
        let copy = self.execute_step(StepKind::Copy, || self.copier.copy(source, &backup))?;

        info!(
            source = %source.display(),
            backup = %backup.display(),
            bytes = copy.bytes,
            "backup written"
        );
        let _ = self.events.publish(Event::BackupCompleted {
            source: source.to_path_buf(),
            backup: backup.clone(),
        });

        let delete = self.delete_source(source);
        Ok(TaskReport {
            source: source.to_path_buf(),
            backup,
            read_attempts: read.attempts,
            copy_attempts: copy.attempts,
            delete,
        })
    }

    fn delete_source(&self, source: &Path) -> DeleteOutcome {
        if !self.delete_mode.deletes_source() {
            self.record_step(StepKind::Delete, StepStatus::Skipped);
            return DeleteOutcome::Skipped;
        }

        let removed = self.execute_step(StepKind::Delete, || {
            (self.remove)(source).map_err(|source_err| FsOpsError::DeleteFailure {
                path: source.to_path_buf(),
                source: source_err,
            })
        });

        match removed {
            Ok(()) => {
                info!(path = %source.display(), "source deleted");
                let _ = self.events.publish(Event::SourceDeleted {
                    path: source.to_path_buf(),
                });
                DeleteOutcome::Deleted
            }
            Err(err) => {
                let message = err.detail();
                error!(path = %source.display(), error = %message, "failed to delete source");
                let _ = self.events.publish(Event::DeleteFailed {
                    path: source.to_path_buf(),
                    message: message.clone(),
                });
                DeleteOutcome::Failed { message }
            }
        }
    }

    fn execute_step<T, F>(&self, step: StepKind, op: F) -> FsOpsResult<T>
    where
        F: FnOnce() -> FsOpsResult<T>,
    {
        self.record_step(step, StepStatus::Started);
        let result = op();
        let status = if result.is_ok() {
            StepStatus::Completed
        } else {
            StepStatus::Failed
        };
        self.record_step(step, status);
        result
    }

    fn record_step(&self, step: StepKind, status: StepStatus) {
        debug!(step = step.as_str(), status = status.as_str(), "fsops step");
        self.metrics.inc_fsops_step(step.as_str(), status.as_str());
    }
}

fn remove_file(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}
