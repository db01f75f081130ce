//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counts what the pipeline does per file; nothing here is exported over the network.

use std::sync::Arc;

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
    core::Collector,
};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Terminal classification of a processing task, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcomeLabel {
    /// Backup written (the delete step may still have failed).
    BackedUp,
    /// The source could not be read within the read budget.
    ReadFailed,
    /// The copy could not be written within the copy budget.
    BackupFailed,
    /// A back-off wait was interrupted by shutdown.
    Interrupted,
    /// The task was rejected before any IO (e.g. no file name).
    Rejected,
}

impl TaskOutcomeLabel {
    /// Label value recorded in `tasks_total`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BackedUp => "backed_up",
            Self::ReadFailed => "read_failed",
            Self::BackupFailed => "backup_failed",
            Self::Interrupted => "interrupted",
            Self::Rejected => "rejected",
        }
    }
}

/// Prometheus-backed metrics registry shared across the watcher and workers.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    files_detected_total: IntCounter,
    events_ignored_total: IntCounter,
    fsops_steps_total: IntCounterVec,
    tasks_total: IntCounterVec,
    retry_failures_total: IntCounterVec,
    tasks_in_flight: IntGauge,
}

/// Snapshot of selected gauges and counters, logged at shutdown.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Creation events that produced a processing task.
    pub files_detected_total: u64,
    /// Watch events discarded without dispatch.
    pub events_ignored_total: u64,
    /// Tasks currently running or waiting for a worker.
    pub tasks_in_flight: i64,
    /// Tasks that produced a backup.
    pub tasks_backed_up: u64,
    /// Tasks that ended in a read failure.
    pub tasks_read_failed: u64,
    /// Tasks that ended in a backup failure.
    pub tasks_backup_failed: u64,
    /// Tasks cut short by an interrupted back-off.
    pub tasks_interrupted: u64,
    /// Failed read attempts, including the ones later recovered by retry.
    pub read_attempt_failures: u64,
    /// Failed copy attempts, including the ones later recovered by retry.
    pub copy_attempt_failures: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let files_detected_total = IntCounter::with_opts(Opts::new(
            "files_detected_total",
            "Creation events dispatched to a worker",
        ))
        .map_err(|source| collector_error("files_detected_total", source))?;
        let events_ignored_total = IntCounter::with_opts(Opts::new(
            "events_ignored_total",
            "Watch events discarded without dispatch",
        ))
        .map_err(|source| collector_error("events_ignored_total", source))?;
        let fsops_steps_total = IntCounterVec::new(
            Opts::new(
                "fsops_steps_total",
                "File processing steps executed by status",
            ),
            &["step", "status"],
        )
        .map_err(|source| collector_error("fsops_steps_total", source))?;
        let tasks_total = IntCounterVec::new(
            Opts::new("tasks_total", "Processing tasks by terminal outcome"),
            &["outcome"],
        )
        .map_err(|source| collector_error("tasks_total", source))?;
        let retry_failures_total = IntCounterVec::new(
            Opts::new("retry_failures_total", "Failed attempts by phase"),
            &["phase"],
        )
        .map_err(|source| collector_error("retry_failures_total", source))?;
        let tasks_in_flight = IntGauge::with_opts(Opts::new(
            "tasks_in_flight",
            "Processing tasks dispatched but not finished",
        ))
        .map_err(|source| collector_error("tasks_in_flight", source))?;

        register(&registry, "files_detected_total", &files_detected_total)?;
        register(&registry, "events_ignored_total", &events_ignored_total)?;
        register(&registry, "fsops_steps_total", &fsops_steps_total)?;
        register(&registry, "tasks_total", &tasks_total)?;
        register(&registry, "retry_failures_total", &retry_failures_total)?;
        register(&registry, "tasks_in_flight", &tasks_in_flight)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                files_detected_total,
                events_ignored_total,
                fsops_steps_total,
                tasks_total,
                retry_failures_total,
                tasks_in_flight,
            }),
        })
    }

    /// Count a creation event that was dispatched.
    pub fn inc_file_detected(&self) {
        self.inner.files_detected_total.inc();
    }

    /// Count a watch event that was discarded.
    pub fn inc_event_ignored(&self) {
        self.inner.events_ignored_total.inc();
    }

    /// Increment the file processing step counter.
    pub fn inc_fsops_step(&self, step: &str, status: &str) {
        self.inner
            .fsops_steps_total
            .with_label_values(&[step, status])
            .inc();
    }

    /// Record the terminal outcome of one task.
    pub fn inc_task_outcome(&self, outcome: TaskOutcomeLabel) {
        self.inner
            .tasks_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Count one failed attempt of a retried phase (`read` or `copy`).
    pub fn inc_retry_failure(&self, phase: &str) {
        self.inner
            .retry_failures_total
            .with_label_values(&[phase])
            .inc();
    }

    /// Mark a task as dispatched.
    pub fn task_started(&self) {
        self.inner.tasks_in_flight.inc();
    }

    /// Mark a task as finished, whatever its outcome.
    pub fn task_finished(&self) {
        self.inner.tasks_in_flight.dec();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the task counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let outcome = |label: TaskOutcomeLabel| {
            self.inner
                .tasks_total
                .with_label_values(&[label.as_str()])
                .get()
        };
        let failures = |phase: &str| {
            self.inner
                .retry_failures_total
                .with_label_values(&[phase])
                .get()
        };
        MetricsSnapshot {
            files_detected_total: self.inner.files_detected_total.get(),
            events_ignored_total: self.inner.events_ignored_total.get(),
            tasks_in_flight: self.inner.tasks_in_flight.get(),
            tasks_backed_up: outcome(TaskOutcomeLabel::BackedUp),
            tasks_read_failed: outcome(TaskOutcomeLabel::ReadFailed),
            tasks_backup_failed: outcome(TaskOutcomeLabel::BackupFailed),
            tasks_interrupted: outcome(TaskOutcomeLabel::Interrupted),
            read_attempt_failures: failures("read"),
            copy_attempt_failures: failures("copy"),
        }
    }
}

fn collector_error(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsCollector { name, source }
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_file_detected();
        metrics.inc_file_detected();
        metrics.inc_event_ignored();
        metrics.inc_fsops_step("copy", "completed");
        metrics.inc_task_outcome(TaskOutcomeLabel::BackedUp);
        metrics.inc_task_outcome(TaskOutcomeLabel::ReadFailed);
        metrics.inc_retry_failure("read");
        metrics.inc_retry_failure("read");
        metrics.inc_retry_failure("copy");
        metrics.task_started();
        metrics.task_started();
        metrics.task_finished();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.files_detected_total, 2);
        assert_eq!(snapshot.events_ignored_total, 1);
        assert_eq!(snapshot.tasks_in_flight, 1);
        assert_eq!(snapshot.tasks_backed_up, 1);
        assert_eq!(snapshot.tasks_read_failed, 1);
        assert_eq!(snapshot.tasks_backup_failed, 0);
        assert_eq!(snapshot.read_attempt_failures, 2);
        assert_eq!(snapshot.copy_attempt_failures, 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("files_detected_total"));
        assert!(rendered.contains("fsops_steps_total"));
        assert!(rendered.contains("tasks_total"));
        Ok(())
    }

    #[test]
    fn outcome_labels_are_distinct() {
        let labels = [
            TaskOutcomeLabel::BackedUp,
            TaskOutcomeLabel::ReadFailed,
            TaskOutcomeLabel::BackupFailed,
            TaskOutcomeLabel::Interrupted,
            TaskOutcomeLabel::Rejected,
        ]
        .map(TaskOutcomeLabel::as_str);
        for (index, label) in labels.iter().enumerate() {
            assert!(!labels[index + 1..].contains(label));
        }
    }
}
