//! Log line formatters

use crate::error::{Error, Result};
use crate::event::LogEvent;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::io::Write;
use std::sync::Arc;

/// Timestamp layout shared by every output format
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Renders a [`LogEvent`] into bytes
pub trait LogFormatter: Send + Sync + 'static {
    /// Append one complete line, including the trailing newline, to `out`
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded.
    fn format(&self, event: &LogEvent, out: &mut Vec<u8>) -> Result<()>;
}

/// `[module][time][LEVEL][file:line]: message`
///
/// The module segment is omitted when no module is configured.
#[derive(Debug, Clone, Default)]
pub struct PlainTextFormatter {
    module: Option<Arc<str>>,
}

impl PlainTextFormatter {
    /// Create a formatter without a module segment
    #[must_use]
    pub const fn new() -> Self {
        Self { module: None }
    }

    /// Create a formatter that prefixes every line with `[module]`
    #[must_use]
    pub fn with_module(module: Option<Arc<str>>) -> Self {
        Self { module }
    }
}

impl LogFormatter for PlainTextFormatter {
    fn format(&self, event: &LogEvent, out: &mut Vec<u8>) -> Result<()> {
        if let Some(module) = &self.module {
            write!(out, "[{module}]").map_err(|e| Error::Io("failed to format log line", e))?;
        }
        writeln!(
            out,
            "[{}][{}][{}:{}]: {}",
            event.timestamp.format(TIME_FORMAT),
            event.level.as_str(),
            event.location.file_name(),
            event.location.line,
            event.message
        )
        .map_err(|e| Error::Io("failed to format log line", e))
    }
}

/// One JSON object per line with `module`, `level`, `time`, `file`, `line`,
/// `func` and `content` fields
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    module: Option<Arc<str>>,
}

impl JsonFormatter {
    /// Create a formatter without a module field
    #[must_use]
    pub const fn new() -> Self {
        Self { module: None }
    }

    /// Create a formatter that includes the `module` field
    #[must_use]
    pub fn with_module(module: Option<Arc<str>>) -> Self {
        Self { module }
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<&'a str>,
    level: &'static str,
    #[serde(serialize_with = "serialize_time")]
    time: &'a DateTime<Local>,
    file: &'static str,
    line: u32,
    func: &'static str,
    content: &'a str,
}

fn serialize_time<S: Serializer>(
    time: &&DateTime<Local>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(&time.format(TIME_FORMAT))
}

impl LogFormatter for JsonFormatter {
    fn format(&self, event: &LogEvent, out: &mut Vec<u8>) -> Result<()> {
        let line = JsonLine {
            module: self.module.as_deref(),
            level: event.level.as_str(),
            time: &event.timestamp,
            file: event.location.file_name(),
            line: event.location.line,
            func: event.location.function_name(),
            content: &event.message,
        };
        serde_json::to_writer(&mut *out, &line)?;
        out.push(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sluice_logger::{Level, Location};

    fn event(level: Level, message: &str) -> LogEvent {
        LogEvent {
            level,
            timestamp: Local
                .with_ymd_and_hms(2024, 5, 1, 13, 4, 5)
                .unwrap()
                .checked_add_signed(chrono::TimeDelta::milliseconds(42))
                .unwrap(),
            location: Location::new("src/server/handler.rs", 88, Some("server::handler")),
            message: message.to_string(),
        }
    }

    fn render(formatter: &dyn LogFormatter, event: &LogEvent) -> String {
        let mut out = Vec::new();
        formatter.format(event, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_text_with_module() {
        let formatter = PlainTextFormatter::with_module(Some(Arc::from("gateway")));
        let line = render(&formatter, &event(Level::Warn, "slow upstream"));

        assert_eq!(
            line,
            "[gateway][2024-05-01 13:04:05.042][WARN][handler.rs:88]: slow upstream\n"
        );
    }

    #[test]
    fn plain_text_without_module() {
        let line = render(&PlainTextFormatter::new(), &event(Level::Info, "ready"));

        assert_eq!(line, "[2024-05-01 13:04:05.042][INFO][handler.rs:88]: ready\n");
    }

    #[test]
    fn json_fields() {
        let formatter = JsonFormatter::with_module(Some(Arc::from("gateway")));
        let line = render(&formatter, &event(Level::Error, "said \"no\""));
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["module"], "gateway");
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["time"], "2024-05-01 13:04:05.042");
        assert_eq!(value["file"], "handler.rs");
        assert_eq!(value["line"], 88);
        assert_eq!(value["func"], "server::handler");
        assert_eq!(value["content"], "said \"no\"");
    }

    #[test]
    fn json_without_module_omits_field() {
        let line = render(&JsonFormatter::new(), &event(Level::Debug, "multi\nline"));
        assert_eq!(line.matches('\n').count(), 1, "embedded newlines are escaped");

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(value.get("module").is_none());
        assert_eq!(value["content"], "multi\nline");
    }
}
