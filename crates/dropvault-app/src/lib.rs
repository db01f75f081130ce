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

//! dropvault application wiring.
//!
//! Layout: `bootstrap.rs` (service wiring), `cli.rs` (flags), `watcher.rs`
//! (directory subscription), `pool.rs` (background workers), `dispatch.rs`
//! (control loop).

/// Application bootstrap.
pub mod bootstrap;
/// Command-line flags and settings assembly.
pub mod cli;
/// Dispatch loop driving the watcher and the pool.
pub mod dispatch;
/// Application errors.
pub mod error;
/// Bounded background worker pool.
pub mod pool;
/// Drop directory subscription.
pub mod watcher;

pub use bootstrap::{BootstrapDependencies, run_app, run_app_with};
pub use cli::Cli;
pub use dispatch::{DispatchExit, DispatchLoop};
pub use error::{AppError, AppResult};
pub use pool::WorkerPool;
pub use watcher::{DirectoryWatcher, FileEvent, FileEventKind};
