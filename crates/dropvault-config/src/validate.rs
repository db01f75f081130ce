//! Validation helpers and parsing utilities for settings documents.

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::model::RetryBudget;

/// Require a value that has no default.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when `value` is `None`.
pub fn required<T>(field: &'static str, value: Option<T>) -> ConfigResult<T> {
    value.ok_or(ConfigError::MissingField { field })
}

/// Ensure `path` already exists and is a directory, returning its canonical
/// absolute form. Directories are never created on the caller's behalf.
///
/// # Errors
///
/// Returns [`ConfigError::NotADirectory`] when the path is missing, cannot be
/// resolved, or points at something other than a directory.
pub fn existing_directory(field: &'static str, path: PathBuf) -> ConfigResult<PathBuf> {
    match path.canonicalize() {
        Ok(resolved) if resolved.is_dir() => Ok(resolved),
        _ => Err(ConfigError::NotADirectory { field, path }),
    }
}

/// Parse an attempt count, rejecting zero.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when `attempts` is zero.
pub fn attempts(field: &'static str, attempts: u32) -> ConfigResult<NonZeroU32> {
    NonZeroU32::new(attempts).ok_or_else(|| ConfigError::InvalidField {
        field,
        reason: "must_be_positive",
        value: Some(attempts.to_string()),
    })
}

/// Parse a worker count, rejecting zero.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when `workers` is zero.
pub fn workers(field: &'static str, workers: usize) -> ConfigResult<NonZeroUsize> {
    NonZeroUsize::new(workers).ok_or_else(|| ConfigError::InvalidField {
        field,
        reason: "must_be_positive",
        value: Some(workers.to_string()),
    })
}

/// Combine an attempt count and a millisecond delay into a [`RetryBudget`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the attempt count is zero.
pub fn retry_budget(
    attempts_field: &'static str,
    attempt_count: u32,
    delay_ms: u64,
) -> ConfigResult<RetryBudget> {
    Ok(RetryBudget::new(
        attempts(attempts_field, attempt_count)?,
        Duration::from_millis(delay_ms),
    ))
}

/// Reject configurations where the drop and backup directories coincide;
/// every backup would otherwise be picked up again as a new drop.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when both paths resolve to the same directory.
pub fn distinct_directories(drop_dir: &Path, backup_dir: &Path) -> ConfigResult<()> {
    let same = match (drop_dir.canonicalize(), backup_dir.canonicalize()) {
        (Ok(left), Ok(right)) => left == right,
        _ => drop_dir == backup_dir,
    };
    if same {
        return Err(ConfigError::InvalidField {
            field: "backup_dir",
            reason: "same_as_drop_dir",
            value: Some(backup_dir.display().to_string()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn attempts_reject_zero() {
        assert!(matches!(
            attempts("copy_attempts", 0),
            Err(ConfigError::InvalidField {
                field: "copy_attempts",
                reason: "must_be_positive",
                ..
            })
        ));
        assert_eq!(attempts("copy_attempts", 5).map(NonZeroU32::get).ok(), Some(5));
    }

    #[test]
    fn retry_budget_converts_milliseconds() -> Result<(), Box<dyn Error>> {
        let budget = retry_budget("read_attempts", 4, 250)?;
        assert_eq!(budget.attempts(), 4);
        assert_eq!(budget.delay, Duration::from_millis(250));
        Ok(())
    }

    #[test]
    fn existing_directory_rejects_files_and_missing_paths() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("file.txt");
        std::fs::write(&file, b"x")?;

        assert!(existing_directory("drop_dir", temp.path().to_path_buf()).is_ok());
        assert!(matches!(
            existing_directory("drop_dir", file),
            Err(ConfigError::NotADirectory { field: "drop_dir", .. })
        ));
        assert!(matches!(
            existing_directory("backup_dir", temp.path().join("missing")),
            Err(ConfigError::NotADirectory { field: "backup_dir", .. })
        ));
        Ok(())
    }

    #[test]
    fn existing_directory_resolves_relative_paths() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::Builder::new().prefix(".settings").tempdir_in(".")?;
        let relative = temp.path().join("drop");
        std::fs::create_dir(&relative)?;
        assert!(relative.is_relative());

        let resolved = existing_directory("drop_dir", relative.clone())?;
        assert!(resolved.is_absolute());
        assert_eq!(resolved, relative.canonicalize()?);
        Ok(())
    }

    #[test]
    fn distinct_directories_detects_aliases() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let other = tempfile::tempdir()?;
        let alias = temp.path().join(".");

        assert!(distinct_directories(temp.path(), other.path()).is_ok());
        assert!(distinct_directories(temp.path(), &alias).is_err());
        Ok(())
    }
}
