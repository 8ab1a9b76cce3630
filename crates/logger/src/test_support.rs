//! In-memory logger for tests, enabled by the `test-support` feature

use crate::{Level, Location, Logger, Record};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One captured entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    /// Severity
    pub level: Level,
    /// Target the entry was logged under
    pub target: String,
    /// Call site
    pub location: Location,
    /// Message text
    pub message: String,
}

/// A logger that keeps every accepted record in memory.
///
/// Clones share the same buffer, so a test can hand one clone to the code
/// under test and inspect another.
#[derive(Debug, Clone)]
pub struct CaptureLogger {
    records: Arc<Mutex<Vec<CapturedRecord>>>,
    min_level: Level,
}

impl CaptureLogger {
    /// Capture everything from `Debug` up
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::default(),
            min_level: Level::Debug,
        }
    }

    /// Only capture records at or above `level`
    #[must_use]
    pub const fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Snapshot of the captured records
    #[must_use]
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.lock().clone()
    }

    /// Captured records rendered one per line as
    /// `LEVEL [target] file:line message`
    #[must_use]
    pub fn logs(&self) -> String {
        let mut out = String::new();
        for record in self.lock().iter() {
            let _ = writeln!(
                out,
                "{} [{}] {}:{} {}",
                record.level,
                record.target,
                record.location.file_name(),
                record.location.line,
                record.message
            );
        }
        out
    }

    /// Whether any captured message contains `text`
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.lock().iter().any(|record| record.message.contains(text))
    }

    /// Number of captured records at exactly `level`
    #[must_use]
    pub fn count(&self, level: Level) -> usize {
        self.lock().iter().filter(|record| record.level == level).count()
    }

    /// Forget everything captured so far
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CapturedRecord>> {
        // a panicking test thread must not hide what was captured
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CaptureLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, record: Record<'_>) {
        if !self.is_enabled(record.level) {
            return;
        }
        self.lock().push(CapturedRecord {
            level: record.level,
            target: record.target.to_string(),
            location: record.location,
            message: record.message.into_owned(),
        });
    }

    fn flush(&self) {}

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }
}
