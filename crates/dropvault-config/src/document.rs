//! Layered raw settings.
//!
//! # Design
//! - Every field is optional so a document can describe one layer only
//!   (settings file, then command-line/environment overrides).
//! - Validation happens once, when the merged document becomes [`WatchSettings`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{DeleteMode, WatchSettings};
use crate::validate;

/// Unvalidated settings as read from one configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsDocument {
    /// Directory producers drop files into.
    pub drop_dir: Option<PathBuf>,
    /// Directory receiving timestamped copies.
    pub backup_dir: Option<PathBuf>,
    /// `Y` to delete sources after backup; anything else keeps them.
    pub delete_file: Option<String>,
    /// Copy attempts per file.
    pub copy_attempts: Option<u32>,
    /// Delay between copy attempts, in milliseconds.
    pub copy_delay_ms: Option<u64>,
    /// Read attempts per file.
    pub read_attempts: Option<u32>,
    /// Delay between read attempts, in milliseconds.
    pub read_delay_ms: Option<u64>,
    /// Background workers.
    pub workers: Option<usize>,
}

impl SettingsDocument {
    /// Load a JSON settings document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid document.
    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            operation: "settings.read",
            path: path.to_path_buf(),
            source,
        })?;
        let document = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded settings document");
        Ok(document)
    }

    /// Layer `overrides` on top of `self`; any field set in `overrides` wins.
    #[must_use]
    pub fn overlay(self, overrides: Self) -> Self {
        Self {
            drop_dir: overrides.drop_dir.or(self.drop_dir),
            backup_dir: overrides.backup_dir.or(self.backup_dir),
            delete_file: overrides.delete_file.or(self.delete_file),
            copy_attempts: overrides.copy_attempts.or(self.copy_attempts),
            copy_delay_ms: overrides.copy_delay_ms.or(self.copy_delay_ms),
            read_attempts: overrides.read_attempts.or(self.read_attempts),
            read_delay_ms: overrides.read_delay_ms.or(self.read_delay_ms),
            workers: overrides.workers.or(self.workers),
        }
    }

    /// Apply defaults and validate the document into immutable settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory is missing, both directories coincide,
    /// or a count is zero.
    pub fn into_settings(self) -> ConfigResult<WatchSettings> {
        let drop_dir = validate::existing_directory(
            "drop_dir",
            validate::required("drop_dir", self.drop_dir)?,
        )?;
        let backup_dir = validate::existing_directory(
            "backup_dir",
            validate::required("backup_dir", self.backup_dir)?,
        )?;
        validate::distinct_directories(&drop_dir, &backup_dir)?;

        let delete_mode =
            DeleteMode::from_flag(self.delete_file.as_deref().unwrap_or(defaults::DELETE_FLAG));
        let read_retry = validate::retry_budget(
            "read_attempts",
            self.read_attempts.unwrap_or(defaults::READ_ATTEMPTS),
            self.read_delay_ms.unwrap_or(defaults::READ_DELAY_MS),
        )?;
        let copy_retry = validate::retry_budget(
            "copy_attempts",
            self.copy_attempts.unwrap_or(defaults::COPY_ATTEMPTS),
            self.copy_delay_ms.unwrap_or(defaults::COPY_DELAY_MS),
        )?;
        let workers = validate::workers("workers", self.workers.unwrap_or(defaults::WORKERS))?;

        Ok(WatchSettings {
            drop_dir,
            backup_dir,
            delete_mode,
            read_retry,
            copy_retry,
            workers,
        })
    }
}
