//! Dispatch Loop: wait for events, hand creations to the pool, re-arm.

use std::future::Future;

use dropvault_events::{Event, EventBus};
use dropvault_fsops::ShutdownSignal;
use dropvault_telemetry::Metrics;
use tracing::{debug, error, info, warn};

use crate::error::AppResult;
use crate::pool::WorkerPool;
use crate::watcher::{DirectoryWatcher, FileEvent, FileEventKind};

/// Why the dispatch loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchExit {
    /// The shutdown future resolved while waiting for events.
    Interrupted,
}

/// Owns the watch subscription and feeds the worker pool.
pub struct DispatchLoop {
    watcher: DirectoryWatcher,
    pool: WorkerPool,
    backoff: ShutdownSignal,
    events: EventBus,
    metrics: Metrics,
}

impl DispatchLoop {
    /// `backoff` is the signal every worker sleeps on; it is triggered when
    /// the loop exits so pending retries stop early.
    #[must_use]
    pub const fn new(
        watcher: DirectoryWatcher,
        pool: WorkerPool,
        backoff: ShutdownSignal,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        Self {
            watcher,
            pool,
            backoff,
            events,
            metrics,
        }
    }

    /// Run until the watch is invalidated or `shutdown` resolves.
    ///
    /// In-flight tasks are awaited before returning.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::WatchInvalidated`] when the drop directory
    /// can no longer be watched.
    pub async fn run<F>(mut self, shutdown: F) -> AppResult<DispatchExit>
    where
        F: Future<Output = ()>,
    {
        let dir = self.watcher.dir().to_path_buf();
        info!(dir = %dir.display(), "watching drop directory");
        let _ = self.events.publish(Event::WatchStarted { dir: dir.clone() });

        tokio::pin!(shutdown);
        let result = loop {
            let batch = tokio::select! {
                () = &mut shutdown => {
                    info!("interrupted while waiting for events");
                    break Ok(DispatchExit::Interrupted);
                }
                batch = self.watcher.next_batch() => batch,
            };

            self.dispatch(batch);
            self.pool.reap();

            if let Err(err) = self.watcher.rearm() {
                error!(dir = %dir.display(), "drop directory watch invalidated; stopping");
                let _ = self.events.publish(Event::WatchInvalidated { dir: dir.clone() });
                break Err(err);
            }
        };

        self.backoff.trigger();
        self.pool.drain().await;
        info!(snapshot = ?self.metrics.snapshot(), "dispatch loop stopped");
        match self.metrics.render() {
            Ok(exposition) => debug!(metrics = %exposition, "final metrics exposition"),
            Err(err) => warn!(error = %err, "failed to render metrics"),
        }
        result
    }

    fn dispatch(&mut self, batch: Vec<FileEvent>) {
        for event in batch {
            if event.kind != FileEventKind::Created {
                self.metrics.inc_event_ignored();
                continue;
            }
            let path = self.watcher.dir().join(&event.name);
            self.metrics.inc_file_detected();
            let _ = self.events.publish(Event::FileDetected { path: path.clone() });
            self.pool.submit(path);
        }
    }
}
