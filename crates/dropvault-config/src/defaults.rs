//! Fallback values applied when a setting is absent from every source.
//!
//! # Design
//! - Three attempts, one second apart, for both retried phases.
//! - Keep the original files unless deletion is requested explicitly.

/// Copy attempts before a backup is declared failed.
pub(crate) const COPY_ATTEMPTS: u32 = 3;
/// Delay between copy attempts, in milliseconds.
pub(crate) const COPY_DELAY_MS: u64 = 1_000;
/// Read attempts before a source file is declared unreadable.
pub(crate) const READ_ATTEMPTS: u32 = 3;
/// Delay between read attempts, in milliseconds.
pub(crate) const READ_DELAY_MS: u64 = 1_000;
/// Delete flag used when none is configured.
pub(crate) const DELETE_FLAG: &str = "N";
/// Background workers processing files.
pub(crate) const WORKERS: usize = 1;
