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

//! Startup configuration for the drop-folder archiver.
//!
//! Layout: `model.rs` (immutable settings and retry budgets), `document.rs`
//! (layered, serde-backed raw settings), `validate.rs` (parsing/validation
//! helpers), `defaults.rs` (fallback values).

mod defaults;
pub mod document;
pub mod error;
pub mod model;
pub mod validate;

pub use document::SettingsDocument;
pub use error::{ConfigError, ConfigResult};
pub use model::{DeleteMode, RetryBudget, WatchSettings};
