//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was not supplied by any source.
    #[error("missing configuration field")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// A configured directory is missing or is not a directory.
    #[error("configured path is not a directory")]
    NotADirectory {
        /// Field holding the path.
        field: &'static str,
        /// Path that failed the check.
        path: PathBuf,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Settings document could not be parsed.
    #[error("invalid settings document")]
    Json {
        /// Path of the document.
        path: PathBuf,
        /// Source parse error.
        source: serde_json::Error,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_messages_are_constant() {
        let missing = ConfigError::MissingField { field: "drop_dir" };
        assert_eq!(missing.to_string(), "missing configuration field");
        assert!(missing.source().is_none());

        let io_err = ConfigError::Io {
            operation: "settings.read",
            path: PathBuf::from("settings.json"),
            source: io::Error::other("io"),
        };
        assert_eq!(io_err.to_string(), "filesystem operation failed");
        assert!(io_err.source().is_some());
    }
}
