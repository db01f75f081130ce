//! Retrying Copier: place a backup copy at its final name.
//!
//! Each attempt copies into its own hidden staging file next to the
//! destination and renames it into place, so the destination path never holds
//! a partial copy. Staging names carry the process id and a sequence number;
//! concurrent copies to the same backup name never share one. An existing
//! file at the destination is replaced.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dropvault_config::RetryBudget;
use dropvault_events::TaskPhase;
use dropvault_telemetry::Metrics;
use tracing::{error, warn};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::CopyReport;
use crate::retry::{RetryError, Sleeper, retry_with_budget};

const STAGING_SUFFIX: &str = ".partial";

static STAGING_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Copies files into the backup directory within a fixed retry budget.
#[derive(Clone)]
pub struct RetryingCopier {
    budget: RetryBudget,
    sleeper: Arc<dyn Sleeper>,
    metrics: Metrics,
}

impl RetryingCopier {
    /// Build a copier with the given budget and back-off sleeper.
    #[must_use]
    pub fn new(budget: RetryBudget, sleeper: Arc<dyn Sleeper>, metrics: Metrics) -> Self {
        Self {
            budget,
            sleeper,
            metrics,
        }
    }

    /// Copy `source` to `destination`, replacing any existing file.
    ///
    /// Only the first failed attempt is logged; later ones are silent until
    /// the budget is exhausted.
    ///
    /// # Errors
    ///
    /// [`FsOpsError::InvalidInput`] when `destination` has no file name,
    /// [`FsOpsError::BackupFailure`] once every attempt failed, or
    /// [`FsOpsError::Interrupted`] if a back-off wait was cut short.
    pub fn copy(&self, source: &Path, destination: &Path) -> FsOpsResult<CopyReport> {
        let name = destination
            .file_name()
            .ok_or_else(|| FsOpsError::InvalidInput {
                field: "destination",
                reason: "missing_file_name",
                value: Some(destination.display().to_string()),
            })?;

        let outcome = retry_with_budget(
            self.budget,
            self.sleeper.as_ref(),
            |_| copy_via_staging(source, &staging_path(destination, name), destination),
            |attempt, err| {
                self.metrics.inc_retry_failure(TaskPhase::Copy.as_str());
                if attempt == 1 {
                    warn!(
                        source = %source.display(),
                        destination = %destination.display(),
                        error = %err,
                        "backup copy failed; retrying"
                    );
                }
            },
        );

        match outcome {
            Ok((bytes, attempts)) => Ok(CopyReport { bytes, attempts }),
            Err(RetryError::Exhausted { attempts, last }) => {
                error!(
                    source = %source.display(),
                    destination = %destination.display(),
                    attempts,
                    error = %last,
                    "giving up on backup copy"
                );
                Err(FsOpsError::BackupFailure {
                    path: source.to_path_buf(),
                    destination: destination.to_path_buf(),
                    attempts,
                    source: last,
                })
            }
            Err(RetryError::Interrupted { attempt }) => {
                warn!(source = %source.display(), attempt, "copy back-off interrupted");
                Err(FsOpsError::Interrupted {
                    phase: TaskPhase::Copy,
                    path: source.to_path_buf(),
                    attempt,
                })
            }
        }
    }
}

fn staging_path(destination: &Path, name: &OsStr) -> PathBuf {
    let sequence = STAGING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut staged = OsString::from(".");
    staged.push(name);
    staged.push(format!(".{}.{sequence}{STAGING_SUFFIX}", process::id()));
    destination.with_file_name(staged)
}

fn copy_via_staging(source: &Path, staging: &Path, destination: &Path) -> io::Result<u64> {
    let result = fs::copy(source, staging).and_then(|bytes| {
        fs::rename(staging, destination)?;
        Ok(bytes)
    });
    if result.is_err() {
        let _ = fs::remove_file(staging);
    }
    result
}
