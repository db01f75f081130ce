//! Locked Reader: stream a dropped file to the log under a shared lock.
//!
//! # Design
//! - The lock is advisory, shared, and spans the whole file; other readers are
//!   never excluded and writers holding no lock are not detected.
//! - One retry budget covers the full open, lock, read, unlock cycle.
//! - Individual failed attempts stay silent; only exhaustion is logged.
//! - Lines are buffered per attempt and reach the sink only once an attempt
//!   succeeds, so a retried read never repeats content.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use dropvault_config::RetryBudget;
use dropvault_events::TaskPhase;
use dropvault_telemetry::Metrics;
use tracing::{error, info, warn};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::ReadReport;
use crate::retry::{RetryError, Sleeper, retry_with_budget};

/// Destination for the content lines of a file being read.
pub trait ContentSink: Send + Sync {
    /// Receive one line of `source` without its line terminator.
    fn line(&self, source: &Path, line: &str);
}

/// Logs each content line at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ContentSink for TracingSink {
    fn line(&self, source: &Path, line: &str) {
        info!(file = %source.display(), "{line}");
    }
}

/// Reads files under a shared lock, retrying within a fixed budget.
#[derive(Clone)]
pub struct LockedReader {
    budget: RetryBudget,
    sleeper: Arc<dyn Sleeper>,
    sink: Arc<dyn ContentSink>,
    metrics: Metrics,
}

impl LockedReader {
    /// Build a reader that forwards content to [`TracingSink`].
    #[must_use]
    pub fn new(budget: RetryBudget, sleeper: Arc<dyn Sleeper>, metrics: Metrics) -> Self {
        Self {
            budget,
            sleeper,
            sink: Arc::new(TracingSink),
            metrics,
        }
    }

    /// Replace the content sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ContentSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Read `path` line by line while holding a shared lock.
    ///
    /// # Errors
    ///
    /// [`FsOpsError::ReadFailure`] once every attempt failed, or
    /// [`FsOpsError::Interrupted`] if a back-off wait was cut short.
    pub fn read(&self, path: &Path) -> FsOpsResult<ReadReport> {
        let outcome = retry_with_budget(
            self.budget,
            self.sleeper.as_ref(),
            |_| read_locked(path),
            |_, _| self.metrics.inc_retry_failure(TaskPhase::Read.as_str()),
        );

        match outcome {
            Ok(((lines, bytes), attempts)) => {
                for line in &lines {
                    self.sink.line(path, line);
                }
                Ok(ReadReport {
                    lines: lines.len(),
                    bytes,
                    attempts,
                })
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                error!(
                    path = %path.display(),
                    attempts,
                    error = %last,
                    "giving up reading file"
                );
                Err(FsOpsError::ReadFailure {
                    path: path.to_path_buf(),
                    attempts,
                    source: last,
                })
            }
            Err(RetryError::Interrupted { attempt }) => {
                warn!(path = %path.display(), attempt, "read back-off interrupted");
                Err(FsOpsError::Interrupted {
                    phase: TaskPhase::Read,
                    path: path.to_path_buf(),
                    attempt,
                })
            }
        }
    }
}

fn read_locked(path: &Path) -> io::Result<(Vec<String>, u64)> {
    let file = File::open(path)?;
    let locked = lock_shared(file)?;
    let held: &File = &locked;
    let content = collect_lines(BufReader::new(held));
    drop(locked);
    content
}

#[cfg(unix)]
fn lock_shared(file: File) -> io::Result<nix::fcntl::Flock<File>> {
    use nix::fcntl::{Flock, FlockArg};

    Flock::lock(file, FlockArg::LockShared).map_err(|(_, errno)| io::Error::from(errno))
}

#[cfg(not(unix))]
fn lock_shared(file: File) -> io::Result<File> {
    file.lock_shared()?;
    Ok(file)
}

/// Split `reader` into lossily decoded lines without terminators.
fn collect_lines(mut reader: impl BufRead) -> io::Result<(Vec<String>, u64)> {
    let mut buffer = Vec::new();
    let mut lines = Vec::new();
    let mut bytes = 0_u64;
    loop {
        buffer.clear();
        let read = reader.read_until(b'\n', &mut buffer)?;
        if read == 0 {
            return Ok((lines, bytes));
        }
        bytes += read as u64;
        let line = buffer
            .strip_suffix(b"\n")
            .map_or(buffer.as_slice(), |rest| rest.strip_suffix(b"\r").unwrap_or(rest));
        lines.push(String::from_utf8_lossy(line).into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{RecordingSink, RecordingSleeper};
    use std::error::Error;
    use std::fs;
    use std::num::NonZeroU32;
    use std::time::Duration;
    use tempfile::TempDir;

    fn budget(attempts: u32) -> RetryBudget {
        RetryBudget::new(
            NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN),
            Duration::from_millis(1_000),
        )
    }

    #[test]
    fn streams_lines_without_terminators() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let path = temp.path().join("data.txt");
        fs::write(&path, b"hello\r\nworld\nlast")?;

        let sink = Arc::new(RecordingSink::default());
        let sleeper = Arc::new(RecordingSleeper::new());
        let reader = LockedReader::new(budget(3), sleeper.clone(), Metrics::new()?)
            .with_sink(sink.clone());

        let report = reader.read(&path)?;
        assert_eq!(report.attempts, 1);
        assert_eq!(report.lines, 3);
        assert_eq!(report.bytes, 17);
        assert_eq!(sink.lines(), vec!["hello", "world", "last"]);
        assert!(sleeper.delays().is_empty());
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let path = temp.path().join("blob.bin");
        fs::write(&path, [0x66, 0x6f, 0xff, 0x6f])?;

        let sink = Arc::new(RecordingSink::default());
        let reader = LockedReader::new(budget(1), Arc::new(RecordingSleeper::new()), Metrics::new()?)
            .with_sink(sink.clone());

        assert_eq!(reader.read(&path)?.lines, 1);
        assert_eq!(sink.lines(), vec!["fo\u{fffd}o"]);
        Ok(())
    }

    #[test]
    fn recovers_when_file_appears_before_budget_ends() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let path = temp.path().join("late.txt");
        let sleeper = {
            let path = path.clone();
            Arc::new(RecordingSleeper::with_hook(move |count| {
                if count == 2 {
                    let _ = fs::write(&path, b"arrived\n");
                }
            }))
        };
        let metrics = Metrics::new()?;
        let sink = Arc::new(RecordingSink::default());
        let reader =
            LockedReader::new(budget(3), sleeper.clone(), metrics.clone()).with_sink(sink.clone());

        let report = reader.read(&path)?;
        assert_eq!(report.attempts, 3);
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(1_000); 2]);
        assert_eq!(sink.lines(), vec!["arrived"]);
        assert_eq!(metrics.snapshot().read_attempt_failures, 2);
        Ok(())
    }

    #[test]
    fn exhausted_budget_reports_read_failure() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let path = temp.path().join("missing.txt");
        let sleeper = Arc::new(RecordingSleeper::new());
        let reader = LockedReader::new(budget(3), sleeper.clone(), Metrics::new()?);

        match reader.read(&path) {
            Err(FsOpsError::ReadFailure {
                path: failed,
                attempts,
                source,
            }) => {
                assert_eq!(failed, path);
                assert_eq!(attempts, 3);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(sleeper.delays().len(), 2);
        Ok(())
    }

    struct BrokenPipe;

    impl io::Read for BrokenPipe {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "source went away"))
        }
    }

    #[test]
    fn failure_mid_file_discards_partial_lines() {
        let reader = BufReader::new(io::Read::chain(&b"first\nsecond\n"[..], BrokenPipe));
        assert!(matches!(
            collect_lines(reader),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe
        ));
    }

    #[test]
    fn retried_read_forwards_content_once() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let path = temp.path().join("flaky.txt");
        fs::create_dir(&path)?;
        let sleeper = {
            let path = path.clone();
            Arc::new(RecordingSleeper::with_hook(move |_| {
                let _ = fs::remove_dir(&path);
                let _ = fs::write(&path, b"one\ntwo\n");
            }))
        };
        let sink = Arc::new(RecordingSink::default());
        let reader = LockedReader::new(budget(3), sleeper.clone(), Metrics::new()?)
            .with_sink(sink.clone());

        let report = reader.read(&path)?;
        assert_eq!(report.attempts, 2);
        assert_eq!(sink.lines(), vec!["one", "two"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn shared_lock_coexists_with_other_readers() -> Result<(), Box<dyn Error>> {
        use nix::fcntl::{Flock, FlockArg};

        let temp = TempDir::new()?;
        let path = temp.path().join("shared.txt");
        fs::write(&path, b"payload\n")?;
        let held = Flock::lock(File::open(&path)?, FlockArg::LockSharedNonblock)
            .map_err(|(_, errno)| errno)?;

        let sink = Arc::new(RecordingSink::default());
        let reader = LockedReader::new(budget(1), Arc::new(RecordingSleeper::new()), Metrics::new()?)
            .with_sink(sink.clone());
        assert_eq!(reader.read(&path)?.attempts, 1);
        assert_eq!(sink.lines(), vec!["payload"]);
        drop(held);
        Ok(())
    }
}
