//! Command-line and environment configuration for the `dropvault` binary.

use std::path::PathBuf;

use clap::Parser;
use dropvault_config::{SettingsDocument, WatchSettings};
use dropvault_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig};

use crate::error::{AppError, AppResult};

/// Watch a drop directory and back up every file that appears in it.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "dropvault", version, about = "Back up files dropped into a watched directory")]
pub struct Cli {
    /// JSON settings file; flags and environment variables override its fields.
    #[arg(long, env = "DROPVAULT_CONFIG")]
    pub config: Option<PathBuf>,
    /// Directory producers drop files into.
    #[arg(long, env = "DROPVAULT_DROP_DIR")]
    pub drop_dir: Option<PathBuf>,
    /// Directory receiving timestamped copies.
    #[arg(long, env = "DROPVAULT_BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,
    /// `Y` deletes the source after a successful backup; anything else keeps it.
    #[arg(long, env = "DROPVAULT_DELETE_FILE")]
    pub delete_file: Option<String>,
    /// Copy attempts per file, including the first.
    #[arg(long, env = "DROPVAULT_COPY_ATTEMPTS")]
    pub copy_attempts: Option<u32>,
    /// Delay between failed copy attempts, in milliseconds.
    #[arg(long, env = "DROPVAULT_COPY_DELAY_MS")]
    pub copy_delay_ms: Option<u64>,
    /// Read attempts per file, including the first.
    #[arg(long, env = "DROPVAULT_READ_ATTEMPTS")]
    pub read_attempts: Option<u32>,
    /// Delay between failed read attempts, in milliseconds.
    #[arg(long, env = "DROPVAULT_READ_DELAY_MS")]
    pub read_delay_ms: Option<u64>,
    /// Files processed concurrently.
    #[arg(long, env = "DROPVAULT_WORKERS")]
    pub workers: Option<usize>,
    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, env = "DROPVAULT_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
    /// `pretty` or `json`; defaults to `pretty` in debug builds.
    #[arg(long, env = "DROPVAULT_LOG_FORMAT", value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Fields set on the command line or in the environment.
    #[must_use]
    pub fn overrides(&self) -> SettingsDocument {
        SettingsDocument {
            drop_dir: self.drop_dir.clone(),
            backup_dir: self.backup_dir.clone(),
            delete_file: self.delete_file.clone(),
            copy_attempts: self.copy_attempts,
            copy_delay_ms: self.copy_delay_ms,
            read_attempts: self.read_attempts,
            read_delay_ms: self.read_delay_ms,
            workers: self.workers,
        }
    }

    /// Merge the settings file (if any) with the overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the file cannot be loaded or the merged
    /// settings are invalid.
    pub fn settings(&self) -> AppResult<WatchSettings> {
        let base = match &self.config {
            Some(path) => SettingsDocument::from_json_file(path)
                .map_err(|err| AppError::config("settings.load", err))?,
            None => SettingsDocument::default(),
        };
        base.overlay(self.overrides())
            .into_settings()
            .map_err(|err| AppError::config("settings.validate", err))
    }

    /// Logging configuration derived from the flags.
    #[must_use]
    pub fn logging(&self) -> LoggingConfig<'_> {
        let defaults = LoggingConfig::default();
        LoggingConfig {
            level: &self.log_level,
            format: self.log_format.unwrap_or(defaults.format),
            build_sha: defaults.build_sha,
        }
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value
        .parse()
        .map_err(|_| format!("unsupported log format `{value}` (expected `pretty` or `json`)"))
}
