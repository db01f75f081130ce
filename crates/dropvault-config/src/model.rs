//! Typed configuration models.
//!
//! # Design
//! - Settings are built once at startup and never mutated afterwards.
//! - Callers receive them by reference or clone; nothing is stored globally.

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

/// Attempt count and fixed inter-attempt delay for one retried phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Total attempts, including the first one.
    pub attempts: NonZeroU32,
    /// Pause between two consecutive failed attempts.
    pub delay: Duration,
}

impl RetryBudget {
    /// Build a budget from an attempt count and a delay.
    #[must_use]
    pub const fn new(attempts: NonZeroU32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Budget that tries exactly once and never sleeps.
    #[must_use]
    pub const fn single_attempt() -> Self {
        Self {
            attempts: NonZeroU32::MIN,
            delay: Duration::ZERO,
        }
    }

    /// Attempt count as a plain integer.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts.get()
    }
}

/// What happens to a source file after its backup succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Leave the original in the drop directory.
    #[default]
    Keep,
    /// Remove the original once the backup is in place.
    DeleteAfterBackup,
}

impl DeleteMode {
    /// Interpret the `Y`/`N` delete flag. Only `Y` (any case) enables deletion;
    /// every other value keeps the source.
    #[must_use]
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("y") {
            Self::DeleteAfterBackup
        } else {
            Self::Keep
        }
    }

    /// Render the mode as its flag value.
    #[must_use]
    pub const fn as_flag(self) -> &'static str {
        match self {
            Self::Keep => "N",
            Self::DeleteAfterBackup => "Y",
        }
    }

    /// Whether sources are deleted after a successful backup.
    #[must_use]
    pub const fn deletes_source(self) -> bool {
        matches!(self, Self::DeleteAfterBackup)
    }
}

/// Validated, immutable settings for one watcher process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    /// Directory producers drop files into.
    pub drop_dir: PathBuf,
    /// Directory receiving timestamped copies.
    pub backup_dir: PathBuf,
    /// Post-backup handling of the source file.
    pub delete_mode: DeleteMode,
    /// Budget for acquiring the shared lock and reading the source.
    pub read_retry: RetryBudget,
    /// Budget for copying the source into the backup directory.
    pub copy_retry: RetryBudget,
    /// Number of files processed concurrently in the background.
    pub workers: NonZeroUsize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_flag_accepts_only_y() {
        assert_eq!(DeleteMode::from_flag("Y"), DeleteMode::DeleteAfterBackup);
        assert_eq!(DeleteMode::from_flag("y"), DeleteMode::DeleteAfterBackup);
        assert_eq!(DeleteMode::from_flag(" y "), DeleteMode::DeleteAfterBackup);
        for other in ["N", "n", "", "yes", "true", "1", "YY"] {
            assert_eq!(DeleteMode::from_flag(other), DeleteMode::Keep, "{other}");
        }
    }

    #[test]
    fn delete_mode_round_trips_through_flag() {
        for mode in [DeleteMode::Keep, DeleteMode::DeleteAfterBackup] {
            assert_eq!(DeleteMode::from_flag(mode.as_flag()), mode);
        }
        assert!(DeleteMode::DeleteAfterBackup.deletes_source());
        assert!(!DeleteMode::Keep.deletes_source());
    }

    #[test]
    fn single_attempt_budget_never_waits() {
        let budget = RetryBudget::single_attempt();
        assert_eq!(budget.attempts(), 1);
        assert_eq!(budget.delay, Duration::ZERO);
    }
}
