use std::future::Future;
use std::sync::Arc;

use crate::cli::Cli;
use crate::dispatch::{DispatchExit, DispatchLoop};
use crate::error::{AppError, AppResult};
use crate::pool::WorkerPool;
use crate::watcher::DirectoryWatcher;
use dropvault_config::WatchSettings;
use dropvault_events::EventBus;
use dropvault_fsops::{FileProcessor, ShutdownSignal};
use dropvault_telemetry::{GlobalContextGuard, Metrics, record_app_mode};
use tracing::{info, warn};

/// Dependencies required to start the watcher.
pub struct BootstrapDependencies {
    /// Validated settings.
    pub settings: WatchSettings,
    /// Progress notification bus shared with the workers.
    pub events: EventBus,
    /// Metrics registry shared with the workers.
    pub metrics: Metrics,
}

impl BootstrapDependencies {
    /// Build production dependencies from parsed command-line flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or metrics cannot be registered.
    pub fn from_cli(cli: &Cli) -> AppResult<Self> {
        let settings = cli.settings()?;
        let metrics =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            settings,
            events: EventBus::new(),
            metrics,
        })
    }
}

/// Entry point for the dropvault boot sequence: logging, settings, watch, loop.
///
/// Runs until the watch is invalidated or Ctrl-C is received.
///
/// # Errors
///
/// Returns an error if logging, configuration, or the initial watch cannot be
/// set up, or when the watch is invalidated later on.
pub async fn run_app(cli: Cli) -> AppResult<DispatchExit> {
    dropvault_telemetry::init_logging(&cli.logging())
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("bootstrap");

    info!("dropvault bootstrap starting");
    let dependencies = BootstrapDependencies::from_cli(&cli)?;
    run_app_with(dependencies, ctrl_c()).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify testing.
///
/// # Errors
///
/// Returns [`AppError::Watch`] if the drop directory cannot be watched and
/// [`AppError::WatchInvalidated`] when the watch is lost later on.
pub async fn run_app_with<F>(dependencies: BootstrapDependencies, shutdown: F) -> AppResult<DispatchExit>
where
    F: Future<Output = ()>,
{
    let BootstrapDependencies {
        settings,
        events,
        metrics,
    } = dependencies;

    info!(
        drop_dir = %settings.drop_dir.display(),
        backup_dir = %settings.backup_dir.display(),
        delete_file = settings.delete_mode.as_flag(),
        read_attempts = settings.read_retry.attempts(),
        copy_attempts = settings.copy_retry.attempts(),
        workers = settings.workers.get(),
        "settings loaded"
    );

    let watcher = DirectoryWatcher::subscribe(&settings.drop_dir)?;
    let backoff = ShutdownSignal::new();
    let processor = FileProcessor::new(
        &settings,
        Arc::new(backoff.clone()),
        events.clone(),
        metrics.clone(),
    );
    let pool = WorkerPool::new(processor, settings.workers, metrics.clone());

    record_app_mode("watching");
    DispatchLoop::new(watcher, pool, backoff, events, metrics)
        .run(shutdown)
        .await
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C; running until the watch ends");
        std::future::pending::<()>().await;
    }
}
