//! Fakes shared by the unit tests of this crate.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::naming::Clock;
use crate::reader::ContentSink;
use crate::retry::{Interrupted, Sleeper};

type SleepHook = Box<dyn Fn(usize) + Send + Sync>;

/// Records every requested delay without waiting; optionally runs a hook
/// with the 1-based sleep count so a test can fix the fault mid-retry.
pub(crate) struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
    hook: Option<SleepHook>,
}

impl RecordingSleeper {
    pub(crate) const fn new() -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
            hook: None,
        }
    }

    pub(crate) fn with_hook(hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
            hook: Some(Box::new(hook)),
        }
    }

    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        let count = {
            let mut delays = self.delays.lock().unwrap_or_else(PoisonError::into_inner);
            delays.push(delay);
            delays.len()
        };
        if let Some(hook) = &self.hook {
            hook(count);
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    lines: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingSink {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl ContentSink for RecordingSink {
    fn line(&self, source: &Path, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((source.to_path_buf(), line.to_string()));
    }
}

pub(crate) struct FixedClock(pub(crate) &'static str);

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.0.to_string()
    }
}
