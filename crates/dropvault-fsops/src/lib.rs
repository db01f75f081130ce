//! Per-file processing for the drop-folder archiver.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Layout: `naming.rs` (backup names and clocks), `retry.rs` (budgets and
//! back-off), `reader.rs` (Locked Reader), `copier.rs` (Retrying Copier),
//! `service.rs` (File Processor), `model/` (reports), `error.rs`.

pub mod copier;
pub mod error;
pub mod model;
pub mod naming;
pub mod reader;
pub mod retry;
pub mod service;

#[cfg(test)]
mod test_util;

pub use copier::RetryingCopier;
pub use error::{FsOpsError, FsOpsResult};
pub use model::{CopyReport, DeleteOutcome, ReadReport, TaskReport};
pub use naming::{BACKUP_TIMESTAMP_FORMAT, Clock, SystemClock, backup_file_name};
pub use reader::{ContentSink, LockedReader, TracingSink};
pub use retry::{Interrupted, RetryError, ShutdownSignal, Sleeper, ThreadSleeper, retry_with_budget};
pub use service::FileProcessor;
