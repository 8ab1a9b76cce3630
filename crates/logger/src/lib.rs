//! Core logging types shared by every sluice logger.
//!
//! This crate defines the vocabulary the rest of the family speaks:
//! - [`Level`], the totally ordered severity of an entry, and [`AtomicLevel`]
//!   for thresholds that change at runtime
//! - [`Location`], the call-site provider used by every emit path
//! - [`Record`], a single entry on its way into a logger
//! - [`Logger`] and [`LoggerExt`], the trait every backend implements
//!
//! Two small backends live here as well: [`StdoutLogger`], a synchronous
//! console logger without a background thread, and [`NoOpLogger`]. The
//! queued, rotating file pipeline lives in `sluice-logger-file`.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod level;
mod location;
mod logger;
mod macros;
mod noop;
mod record;
mod stdout;

#[cfg(any(feature = "log-compat", feature = "tracing-compat"))]
pub mod compat;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use level::{AtomicLevel, Level, ParseLevelError};
pub use location::Location;
pub use logger::{Logger, LoggerExt};
pub use noop::NoOpLogger;
pub use record::Record;
pub use stdout::StdoutLogger;

/// Module path prefix shared by every crate of the sluice family.
///
/// Bridges drop events whose target starts with this prefix so that a
/// pipeline's own diagnostics are never fed back into its queue.
pub const INTERNAL_TARGET_PREFIX: &str = "sluice_logger";

/// Returns true if `target` belongs to one of the sluice crates.
#[must_use]
pub fn is_internal_target(target: &str) -> bool {
    target.starts_with(INTERNAL_TARGET_PREFIX)
}
