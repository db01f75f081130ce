//! # Design
//!
//! - Centralize application-level errors for bootstrap and the dispatch loop.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: dropvault_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: dropvault_telemetry::TelemetryError,
    },
    /// The drop directory subscription could not be established.
    #[error("directory watch could not be established")]
    Watch {
        /// Directory that was to be watched.
        dir: PathBuf,
        /// Source watcher error.
        source: notify::Error,
    },
    /// The drop directory subscription can no longer be re-armed.
    #[error("directory watch invalidated")]
    WatchInvalidated {
        /// Directory that was being watched.
        dir: PathBuf,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: dropvault_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: dropvault_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn app_error_helpers_build_variants() {
        let config = AppError::config(
            "settings.validate",
            dropvault_config::ConfigError::MissingField { field: "drop_dir" },
        );
        assert!(matches!(
            config,
            AppError::Config {
                operation: "settings.validate",
                ..
            }
        ));
        assert!(config.source().is_some());

        let telemetry = AppError::telemetry(
            "telemetry.log_format",
            dropvault_telemetry::TelemetryError::UnknownLogFormat {
                value: "xml".into(),
            },
        );
        assert_eq!(telemetry.to_string(), "telemetry operation failed");
    }

    #[test]
    fn watch_invalidated_has_no_source() {
        let err = AppError::WatchInvalidated {
            dir: PathBuf::from("/drop"),
        };
        assert_eq!(err.to_string(), "directory watch invalidated");
        assert!(err.source().is_none());
    }
}
