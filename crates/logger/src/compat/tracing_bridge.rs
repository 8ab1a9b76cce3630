//! Bridge from tracing to a sluice [`Logger`]

use crate::{Level, Location, Logger, Record, is_internal_target};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{Event, Subscriber, field::Visit};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// A tracing layer that forwards events into a [`Logger`]
pub struct TracingBridge {
    logger: Arc<dyn Logger>,
}

impl TracingBridge {
    /// Create a new tracing bridge
    #[must_use]
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for TracingBridge
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal_target(metadata.target()) {
            return;
        }

        // Map tracing levels to our levels
        let level = match *metadata.level() {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => Level::Debug,
        };

        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let spans: Vec<&str> = ctx
            .event_scope(event)
            .map(|scope| scope.from_root().map(|span| span.name()).collect())
            .unwrap_or_default();

        let message = if spans.is_empty() {
            visitor.message
        } else {
            format!("{}: {}", spans.join("::"), visitor.message)
        };

        let location = Location::new(
            metadata.file().unwrap_or("???"),
            metadata.line().unwrap_or(0),
            metadata.module_path(),
        );

        self.logger.log(
            Record::new(level, message)
                .with_target(metadata.target())
                .with_location(location),
        );
    }
}

/// Visitor to extract the message from tracing fields
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: impl std::fmt::Display) {
        if !self.message.is_empty() {
            self.message.push(' ');
        }
        let _ = write!(self.message, "{name}={value}");
    }

    fn set_message(&mut self, value: &str) {
        if self.message.is_empty() {
            self.message.push_str(value);
        } else {
            self.message.insert_str(0, &format!("{value} "));
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.set_message(value);
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.set_message(&format!("{value:?}"));
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push_field(field.name(), value);
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push_field(field.name(), value);
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push_field(field.name(), value);
    }
}

/// Install a global tracing subscriber that forwards into `logger`
///
/// # Errors
///
/// Returns an error if a global default subscriber is already set.
///
/// # Example
/// ```no_run
/// use sluice_logger::{StdoutLogger, compat::tracing_bridge::init_tracing_bridge};
/// use std::sync::Arc;
///
/// let logger = Arc::new(StdoutLogger::new());
/// init_tracing_bridge(logger).expect("Failed to set tracing bridge");
/// ```
pub fn init_tracing_bridge(
    logger: Arc<dyn Logger>,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(TracingBridge::new(logger))
        .try_init()
}
