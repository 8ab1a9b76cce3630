//! Bridge from the `log` crate to a sluice [`Logger`]

use crate::{Level, Location, Logger, Record, is_internal_target};
use log::{Log, Metadata, Record as LogRecord};
use std::sync::Arc;

/// Wrapper to implement the log crate's Log trait
pub struct LogBridge {
    logger: Arc<dyn Logger>,
}

impl LogBridge {
    /// Create a new log bridge
    #[must_use]
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        !is_internal_target(metadata.target())
            && self.logger.is_enabled(map_level(metadata.level()))
    }

    fn log(&self, record: &LogRecord) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let location = Location::new(
            record.file_static().unwrap_or("???"),
            record.line().unwrap_or(0),
            record.module_path_static(),
        );

        self.logger.log(
            Record::new(map_level(record.level()), record.args().to_string())
                .with_target(record.target())
                .with_location(location),
        );
    }

    fn flush(&self) {
        self.logger.flush();
    }
}

/// Map log levels to our levels; `Trace` folds into `Debug`.
const fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug | log::Level::Trace => Level::Debug,
    }
}

/// Initialize the log crate to forward into `logger`
///
/// This will capture all logs from crates using the `log` crate macros.
///
/// # Errors
///
/// Returns an error if a global `log` logger is already installed.
///
/// # Example
/// ```no_run
/// use sluice_logger::{StdoutLogger, compat::log_bridge::init_log_bridge};
/// use std::sync::Arc;
///
/// let logger = Arc::new(StdoutLogger::new());
/// init_log_bridge(logger).expect("Failed to set log bridge");
/// ```
pub fn init_log_bridge(logger: Arc<dyn Logger>) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
