//! Synchronous console logger with no background writer

use crate::{AtomicLevel, Level, Logger, Record};
use chrono::Local;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Simple logger that writes each record to stdout under a lock.
///
/// There is no queue or worker thread: every call formats and writes inline,
/// which keeps it usable before (or without) a file pipeline. A fatal record
/// is flushed and then terminates the process with exit status 1.
#[derive(Clone)]
pub struct StdoutLogger {
    /// Optional module prefix rendered as the first segment
    module: Option<Arc<str>>,
    /// Minimum log level
    min_level: Arc<AtomicLevel>,
    /// Lock for the output (to prevent interleaving)
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl StdoutLogger {
    /// Create a new stdout logger
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }

    /// Create a logger that writes to `writer` instead of stdout
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            module: None,
            min_level: Arc::new(AtomicLevel::new(Level::Debug)),
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Set the minimum level
    #[must_use]
    pub fn with_level(self, level: Level) -> Self {
        self.min_level.store(level);
        self
    }

    /// Set the module prefix
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        let module = module.into();
        self.module = (!module.is_empty()).then(|| Arc::from(module));
        self
    }

    /// Change the minimum level at runtime
    pub fn set_level(&self, level: Level) {
        self.min_level.store(level);
    }

    /// Current minimum level
    pub fn level(&self) -> Level {
        self.min_level.load()
    }

    fn render(&self, record: &Record<'_>) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let location = record.location;
        match &self.module {
            Some(module) => format!(
                "[{module}][{now}][{}][{}:{}]: {}\n",
                record.level,
                location.file_name(),
                location.line,
                record.message
            ),
            None => format!(
                "[{now}][{}][{}:{}]: {}\n",
                record.level,
                location.file_name(),
                location.line,
                record.message
            ),
        }
    }
}

impl Default for StdoutLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StdoutLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutLogger")
            .field("module", &self.module)
            .field("min_level", &self.min_level.load())
            .finish_non_exhaustive()
    }
}

impl Logger for StdoutLogger {
    fn log(&self, record: Record<'_>) {
        if !self.is_enabled(record.level) {
            return;
        }

        let line = self.render(&record);

        // Write with lock
        if let Ok(mut out) = self.out.lock() {
            let _ = out.write_all(line.as_bytes());
            let _ = out.flush();
        }

        if record.level == Level::Fatal {
            std::process::exit(1);
        }
    }

    fn flush(&self) {
        if let Ok(mut out) = self.out.lock() {
            let _ = out.flush();
        }
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        self.min_level.allows(level)
    }
}
