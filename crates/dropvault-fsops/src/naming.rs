//! Backup name derivation.

use chrono::Local;

/// `strftime` pattern for backup timestamps (`yyyyMMddHHmmss`, local time).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Insert `_<timestamp>` between the stem and the extension of `original`.
///
/// The extension starts at the last `.`; a name without a `.`, or whose only
/// `.` is the leading one, is all stem.
///
/// ```
/// use dropvault_fsops::backup_file_name;
///
/// assert_eq!(backup_file_name("report.csv", "20240101120000"), "report_20240101120000.csv");
/// assert_eq!(backup_file_name("README", "20240101120000"), "README_20240101120000");
/// assert_eq!(backup_file_name(".hidden", "20240101120000"), ".hidden_20240101120000");
/// ```
#[must_use]
pub fn backup_file_name(original: &str, timestamp: &str) -> String {
    match original.rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, extension) = original.split_at(dot);
            format!("{stem}_{timestamp}{extension}")
        }
        _ => format!("{original}_{timestamp}"),
    }
}

/// Source of the timestamp embedded in backup names.
pub trait Clock: Send + Sync {
    /// Current timestamp, already formatted for a backup name.
    fn timestamp(&self) -> String;
}

/// Wall clock in the local time zone, second resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "20240101120000";

    #[test]
    fn extension_is_preserved() {
        assert_eq!(backup_file_name("report.csv", TS), "report_20240101120000.csv");
        assert_eq!(
            backup_file_name("archive.tar.gz", TS),
            "archive.tar_20240101120000.gz"
        );
    }

    #[test]
    fn names_without_extension_are_all_stem() {
        assert_eq!(backup_file_name("README", TS), "README_20240101120000");
        assert_eq!(backup_file_name(".hidden", TS), ".hidden_20240101120000");
        assert_eq!(backup_file_name("", TS), "_20240101120000");
    }

    #[test]
    fn trailing_dot_keeps_empty_extension() {
        assert_eq!(backup_file_name("notes.", TS), "notes_20240101120000.");
    }

    #[test]
    fn stem_is_prefix_before_last_dot() {
        for name in ["a.b", "data.txt", ".env.local", "x.y.z", "v1.2.3-final.log"] {
            let dot = name.rfind('.').unwrap_or_default();
            let output = backup_file_name(name, TS);
            assert!(output.starts_with(&name[..dot]), "{name} -> {output}");
            assert!(output.ends_with(&name[dot..]), "{name} -> {output}");
            assert_eq!(output, backup_file_name(name, TS));
        }
    }

    #[test]
    fn system_clock_uses_second_resolution() {
        let stamp = SystemClock.timestamp();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|ch| ch.is_ascii_digit()));
    }
}
