//! Span helpers for the process and for individual file tasks.
//!
//! # Design
//! - Keeps one process span entered so every log line carries mode and build info.
//! - Each background task runs inside its own span named after the source file,
//!   so interleaved output from concurrent workers stays attributable.

use std::path::Path;

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    #[must_use]
    /// Enter the application-level tracing span for the lifetime of the guard.
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", mode = %mode, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Record the current application mode on the active span.
pub fn record_app_mode(mode: &str) {
    Span::current().record("mode", tracing::field::display(mode));
}

/// Span wrapping the processing of one dropped file.
#[must_use]
pub fn task_span(source: &Path) -> Span {
    let file = source
        .file_name()
        .map_or_else(|| source.display().to_string(), |name| name.to_string_lossy().into_owned());
    tracing::info_span!("task", file = %file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_context_guard_sets_app_mode_field() {
        let guard = GlobalContextGuard::new("startup");
        record_app_mode("watching");
        drop(guard);
    }

    #[test]
    fn task_span_accepts_paths_without_file_name() {
        let named = task_span(Path::new("/drop/data.txt"));
        let bare = task_span(Path::new("/"));
        drop((named, bare));
    }
}
