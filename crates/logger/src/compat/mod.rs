//! Compatibility bridges for other logging crates
//!
//! Both bridges drop events whose target belongs to the sluice crates
//! themselves (see [`crate::is_internal_target`]), so a file pipeline can be
//! installed behind a bridge without feeding its own diagnostics back into
//! its queue.

#[cfg(feature = "log-compat")]
pub mod log_bridge;

#[cfg(feature = "tracing-compat")]
pub mod tracing_bridge;
