//! File-based logger with rotation and a dedicated writer thread
//!
//! This crate provides the full pipeline behind a [`FileLogger`]:
//! - Pooled log events handed to a single writer thread, either through a
//!   bounded queue or synchronously with a durability acknowledgement
//! - Console, primary file and error mirror sinks
//! - Rotation by size, at local midnight, or every N hours
//! - Plain text or JSON line formatting
//! - An idempotent stop that drains and syncs, and a fatal path that exits
//!   the process only after the fatal entry is on disk
//! - A [`LoggerRegistry`] keyed by module in place of a global logger

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod clock;
mod config;
mod dispatcher;
mod error;
mod event;
mod formatter;
mod logger;
mod pool;
mod registry;
mod rotation;
mod shutdown;
mod sink;
mod writer;

pub use clock::{Clock, OffsetClock, SystemClock};
pub use config::{
    ConsoleTarget, DEFAULT_FLUSH_INTERVAL, FailurePolicy, FileLoggerConfig,
    FileLoggerConfigBuilder, MAX_HOURLY_INTERVAL,
};
pub use error::{Error, Result};
pub use event::LogEvent;
pub use formatter::{JsonFormatter, LogFormatter, PlainTextFormatter, TIME_FORMAT};
pub use logger::{FATAL_EXIT_CODE, FatalHandler, FileLogger, FileLoggerBuilder};
pub use pool::{EventPool, MAX_POOLED_MESSAGE_CAPACITY, PoolMetrics};
pub use registry::LoggerRegistry;
pub use rotation::{Boundary, FileNamer, RotationPolicy};
pub use shutdown::PipelineState;
