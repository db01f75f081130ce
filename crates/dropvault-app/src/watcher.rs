//! Directory Watcher: turns `notify` callbacks into batches of file events.
//!
//! # Design
//! - The `notify` callback runs on the backend thread and only forwards raw
//!   results into an unbounded channel; translation happens on the loop side.
//! - The watch is non-recursive and bound to one directory for its lifetime.
//! - Removal of the watched directory or a backend error marks the
//!   subscription invalid; [`DirectoryWatcher::rearm`] reports it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

type RawEvent = notify::Result<notify::Event>;

/// Kind of a translated file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// A file appeared in the directory (created or moved in).
    Created,
    /// Anything else; observed and discarded.
    Other,
}

/// One event for one entry of the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// What happened.
    pub kind: FileEventKind,
    /// Entry name relative to the watched directory.
    pub name: OsString,
}

/// Live, non-recursive subscription to one directory.
pub struct DirectoryWatcher {
    dir: PathBuf,
    receiver: UnboundedReceiver<RawEvent>,
    invalid: bool,
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Subscribe to events of `dir`, resolved to its canonical absolute form.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Watch`] if `dir` cannot be resolved, the backend
    /// cannot be created, or the directory cannot be watched.
    pub fn subscribe(dir: &Path) -> AppResult<Self> {
        // Backends report absolute paths; entry matching needs the same form.
        let dir = dir.canonicalize().map_err(|err| AppError::Watch {
            dir: dir.to_path_buf(),
            source: notify::Error::io(err).add_path(dir.to_path_buf()),
        })?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |result: RawEvent| {
            let _ = sender.send(result);
        })
        .map_err(|source| AppError::Watch {
            dir: dir.clone(),
            source,
        })?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| AppError::Watch {
                dir: dir.clone(),
                source,
            })?;

        Ok(Self {
            dir,
            receiver,
            invalid: false,
            _watcher: watcher,
        })
    }

    /// Watched directory, always absolute.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait for at least one event, then drain everything already queued.
    ///
    /// Returns an empty batch when the backend has gone away; the next
    /// [`DirectoryWatcher::rearm`] then fails. Cancel-safe.
    pub async fn next_batch(&mut self) -> Vec<FileEvent> {
        let mut batch = Vec::new();
        let Some(first) = self.receiver.recv().await else {
            self.invalid = true;
            return batch;
        };
        self.translate(first, &mut batch);
        loop {
            match self.receiver.try_recv() {
                Ok(raw) => self.translate(raw, &mut batch),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.invalid = true;
                    break;
                }
            }
        }
        batch
    }

    /// Confirm the subscription can keep delivering events.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::WatchInvalidated`] once the directory was removed or
    /// the backend reported an error or went away.
    pub fn rearm(&self) -> AppResult<()> {
        if self.invalid || !self.dir.is_dir() {
            return Err(AppError::WatchInvalidated {
                dir: self.dir.clone(),
            });
        }
        Ok(())
    }

    fn translate(&mut self, raw: RawEvent, batch: &mut Vec<FileEvent>) {
        let event = match raw {
            Ok(event) => event,
            Err(err) => {
                warn!(dir = %self.dir.display(), error = %err, "watch backend error");
                self.invalid = true;
                return;
            }
        };
        debug!(kind = ?event.kind, paths = ?event.paths, "watch event");

        if self.touches_watched_dir(&event) {
            self.invalid = true;
            return;
        }

        let kind = classify(event.kind);
        for path in event.paths {
            if let Some(name) = self.entry_name(&path) {
                batch.push(FileEvent { kind, name });
            }
        }
    }

    fn touches_watched_dir(&self, event: &notify::Event) -> bool {
        matches!(
            event.kind,
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
        ) && event.paths.iter().any(|path| path == &self.dir)
    }

    fn entry_name(&self, path: &Path) -> Option<OsString> {
        if path.parent().is_some_and(|parent| parent != self.dir) {
            return None;
        }
        path.file_name().map(ToOwned::to_owned)
    }
}

/// Map a backend event kind onto the two kinds the dispatch loop cares about.
///
/// A rename into the directory counts as a creation.
#[must_use]
pub const fn classify(kind: EventKind) -> FileEventKind {
    match kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            FileEventKind::Created
        }
        _ => FileEventKind::Other,
    }
}
