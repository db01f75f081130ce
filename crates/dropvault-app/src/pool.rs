//! Background worker pool for processing tasks.
//!
//! # Design
//! - `submit` only spawns; it never waits, so the dispatch loop stays free.
//! - A semaphore caps how many files are processed at once.
//! - Processing is synchronous IO and runs on tokio's blocking thread pool.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use dropvault_fsops::FileProcessor;
use dropvault_telemetry::{Metrics, task_span};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

/// Runs [`FileProcessor`] tasks in the background with bounded concurrency.
pub struct WorkerPool {
    processor: FileProcessor,
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
    metrics: Metrics,
}

impl WorkerPool {
    /// Create a pool running at most `workers` tasks at a time.
    #[must_use]
    pub fn new(processor: FileProcessor, workers: NonZeroUsize, metrics: Metrics) -> Self {
        Self {
            processor,
            permits: Arc::new(Semaphore::new(workers.get())),
            tasks: JoinSet::new(),
            metrics,
        }
    }

    /// Queue `source` for processing. Must be called inside a tokio runtime.
    pub fn submit(&mut self, source: PathBuf) {
        self.metrics.task_started();
        let permits = Arc::clone(&self.permits);
        let processor = self.processor.clone();
        let metrics = self.metrics.clone();

        self.tasks.spawn(async move {
            if let Ok(_permit) = permits.acquire_owned().await {
                let span = task_span(&source);
                let outcome =
                    tokio::task::spawn_blocking(move || span.in_scope(|| processor.process(&source)))
                        .await;
                match outcome {
                    Ok(Ok(report)) => debug!(backup = %report.backup.display(), "task finished"),
                    Ok(Err(err)) => debug!(error = %err.detail(), "task failed"),
                    Err(err) => error!(error = %err, "processing task panicked"),
                }
            }
            metrics.task_finished();
        });
    }

    /// Collect tasks that already finished without waiting for the others.
    pub fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            log_join(joined);
        }
    }

    /// Tasks submitted but not yet reaped.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every submitted task to finish.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            log_join(joined);
        }
    }
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "worker task join failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropvault_config::{DeleteMode, RetryBudget, WatchSettings};
    use dropvault_events::EventBus;
    use dropvault_fsops::ThreadSleeper;
    use dropvault_test_support::DropWorkspace;
    use std::error::Error;
    use std::num::NonZeroU32;
    use std::time::Duration;

    fn pool(workspace: &DropWorkspace, workers: usize, metrics: &Metrics) -> WorkerPool {
        let budget = RetryBudget::new(NonZeroU32::MIN, Duration::ZERO);
        let workers = NonZeroUsize::new(workers).unwrap_or(NonZeroUsize::MIN);
        let settings = WatchSettings {
            drop_dir: workspace.drop_dir().to_path_buf(),
            backup_dir: workspace.backup_dir().to_path_buf(),
            delete_mode: DeleteMode::DeleteAfterBackup,
            read_retry: budget,
            copy_retry: budget,
            workers,
        };
        let processor = FileProcessor::new(
            &settings,
            Arc::new(ThreadSleeper),
            EventBus::new(),
            metrics.clone(),
        );
        WorkerPool::new(processor, workers, metrics.clone())
    }

    #[tokio::test]
    async fn drain_waits_for_every_submitted_file() -> Result<(), Box<dyn Error>> {
        let workspace = DropWorkspace::new()?;
        let metrics = Metrics::new()?;
        let mut pool = pool(&workspace, 2, &metrics);

        for index in 0..4 {
            pool.submit(workspace.drop_file(&format!("file-{index}.log"), b"line\n")?);
        }
        assert_eq!(pool.pending(), 4);
        pool.drain().await;

        assert_eq!(pool.pending(), 0);
        assert!(workspace.drop_files()?.is_empty());
        assert_eq!(workspace.backup_files()?.len(), 4);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_in_flight, 0);
        assert_eq!(snapshot.tasks_backed_up, 4);
        Ok(())
    }

    #[tokio::test]
    async fn failed_tasks_do_not_affect_others() -> Result<(), Box<dyn Error>> {
        let workspace = DropWorkspace::new()?;
        let metrics = Metrics::new()?;
        let mut pool = pool(&workspace, 1, &metrics);

        pool.submit(workspace.drop_dir().join("missing.txt"));
        pool.submit(workspace.drop_file("present.txt", b"ok")?);
        pool.drain().await;
        pool.reap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_read_failed, 1);
        assert_eq!(snapshot.tasks_backed_up, 1);
        assert_eq!(workspace.backup_files()?.len(), 1);
        Ok(())
    }
}
