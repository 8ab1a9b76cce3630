//! Core logger trait

use crate::{Level, Record};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Core logger trait - implemented by every backend
pub trait Logger: Send + Sync + 'static {
    /// Log a record.
    ///
    /// Backends that honour [`Level::Fatal`] terminate the process once the
    /// record is durable, so this call may not return for fatal records.
    fn log(&self, record: Record<'_>);

    /// Flush any buffered logs
    fn flush(&self);

    /// Check if a level is enabled (for fast filtering)
    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }
}

impl<T: Logger + ?Sized> Logger for Arc<T> {
    #[inline]
    fn log(&self, record: Record<'_>) {
        (**self).log(record);
    }

    fn flush(&self) {
        (**self).flush();
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        (**self).is_enabled(level)
    }
}

/// Extension trait for convenient logging methods
///
/// Every method records the location of its caller.
pub trait LoggerExt: Logger {
    /// Log at `level` if the logger accepts it.
    #[inline]
    #[track_caller]
    fn emit(&self, level: Level, msg: impl Into<Cow<'static, str>>) {
        if self.is_enabled(level) {
            self.log(Record::new(level, msg));
        }
    }

    /// Log pre-formatted arguments at `level`, allocating only when the
    /// message has runtime parts.
    #[inline]
    #[track_caller]
    fn emit_fmt(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.is_enabled(level) {
            let message = args
                .as_str()
                .map_or_else(|| Cow::Owned(args.to_string()), Cow::Borrowed);
            self.log(Record::new(level, message));
        }
    }

    /// Log debug
    #[inline]
    #[track_caller]
    fn debug(&self, msg: impl Into<Cow<'static, str>>) {
        self.emit(Level::Debug, msg);
    }

    /// Log formatted debug
    #[inline]
    #[track_caller]
    fn debugf(&self, args: fmt::Arguments<'_>) {
        self.emit_fmt(Level::Debug, args);
    }

    /// Log info
    #[inline]
    #[track_caller]
    fn info(&self, msg: impl Into<Cow<'static, str>>) {
        self.emit(Level::Info, msg);
    }

    /// Log formatted info
    #[inline]
    #[track_caller]
    fn infof(&self, args: fmt::Arguments<'_>) {
        self.emit_fmt(Level::Info, args);
    }

    /// Log a warning
    #[inline]
    #[track_caller]
    fn warn(&self, msg: impl Into<Cow<'static, str>>) {
        self.emit(Level::Warn, msg);
    }

    /// Log a formatted warning
    #[inline]
    #[track_caller]
    fn warnf(&self, args: fmt::Arguments<'_>) {
        self.emit_fmt(Level::Warn, args);
    }

    /// Log an error
    #[inline]
    #[track_caller]
    fn error(&self, msg: impl Into<Cow<'static, str>>) {
        self.emit(Level::Error, msg);
    }

    /// Log a formatted error
    #[inline]
    #[track_caller]
    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.emit_fmt(Level::Error, args);
    }

    /// Log a fatal entry. See [`Logger::log`] for the termination contract.
    #[inline]
    #[track_caller]
    fn fatal(&self, msg: impl Into<Cow<'static, str>>) {
        self.emit(Level::Fatal, msg);
    }

    /// Log a formatted fatal entry.
    #[inline]
    #[track_caller]
    fn fatalf(&self, args: fmt::Arguments<'_>) {
        self.emit_fmt(Level::Fatal, args);
    }
}

// Implement for all loggers
impl<T: Logger + ?Sized> LoggerExt for T {}
