//! The unit of work passed from producers to the writer

use chrono::{DateTime, Local};
use crossbeam::channel::Sender;
use sluice_logger::{Level, Location, Record};
use std::time::SystemTime;

/// A single log entry.
///
/// Events are recycled through an [`EventPool`](crate::EventPool): a producer
/// fills one in, the writer renders it and hands it back. The message
/// buffer keeps its allocation across reuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Severity
    pub level: Level,
    /// Time the entry was produced
    pub timestamp: DateTime<Local>,
    /// Call site
    pub location: Location,
    /// Fully formatted message text
    pub message: String,
}

impl LogEvent {
    /// Copy `record` into this event, reusing the message allocation
    pub fn fill(&mut self, record: &Record<'_>, timestamp: DateTime<Local>) {
        self.level = record.level;
        self.timestamp = timestamp;
        self.location = record.location;
        self.message.clear();
        self.message.push_str(&record.message);
    }

    /// Reset every field to its empty value, keeping the message capacity
    pub fn reset(&mut self) {
        self.level = Level::Debug;
        self.timestamp = DateTime::<Local>::from(SystemTime::UNIX_EPOCH);
        self.location = Location::new("", 0, None);
        self.message.clear();
    }
}

impl Default for LogEvent {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            timestamp: DateTime::<Local>::from(SystemTime::UNIX_EPOCH),
            location: Location::new("", 0, None),
            message: String::new(),
        }
    }
}

/// What travels through the queue
#[derive(Debug)]
pub(crate) enum Message {
    /// A log entry, with an acknowledgement channel when the producer waits
    /// for it to be durable
    Event {
        event: LogEvent,
        ack: Option<Sender<()>>,
    },
    /// Sync all sinks and acknowledge
    Flush(Sender<()>),
}
