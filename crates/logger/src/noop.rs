use crate::{Level, Logger, Record};

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _record: Record<'_>) {}

    #[inline]
    fn flush(&self) {}

    #[inline]
    fn is_enabled(&self, _level: Level) -> bool {
        false
    }
}
