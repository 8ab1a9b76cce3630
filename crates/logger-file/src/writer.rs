//! The single thread that owns every sink
//!
//! One `select!` loop multiplexes the event queue, the periodic flush tick and
//! the daily and hourly rotation timers. Disabled timers are `never()`
//! channels, so the loop shape does not depend on configuration.

use crate::clock::Clock;
use crate::config::FailurePolicy;
use crate::error::{Error, Result};
use crate::event::{LogEvent, Message};
use crate::formatter::{LogFormatter, PlainTextFormatter};
use crate::pool::EventPool;
use crate::rotation::{Boundary, RotationPolicy};
use crate::shutdown::StateCell;
use crate::sink::SinkSet;
use crossbeam::channel::{Receiver, select, tick};
use sluice_logger::Level;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

/// Why the writer loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriterExit {
    /// The queue was closed and fully drained
    Drained,
    /// A fatal entry was written; anything still queued was discarded
    Fatal,
}

enum Signal {
    Message(Message),
    Closed,
    Flush,
    Boundary(Boundary),
}

enum Step {
    Continue,
    Terminate,
}

pub(crate) struct Writer {
    pub(crate) name: String,
    pub(crate) receiver: Receiver<Message>,
    pub(crate) sinks: SinkSet,
    pub(crate) pool: Arc<EventPool>,
    pub(crate) console_format: PlainTextFormatter,
    pub(crate) file_format: Box<dyn LogFormatter>,
    pub(crate) policy: RotationPolicy,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) state: Arc<StateCell>,
    pub(crate) flush_interval: Duration,
    pub(crate) synchronous: bool,
    pub(crate) failure_policy: FailurePolicy,
}

impl Writer {
    /// Start the writer on its own thread
    pub(crate) fn spawn(self) -> Result<JoinHandle<Result<WriterExit>>> {
        thread::Builder::new()
            .name(format!("sluice-writer-{}", self.name))
            .spawn(move || self.run())
            .map_err(Error::Spawn)
    }

    fn run(mut self) -> Result<WriterExit> {
        debug!(logger = %self.name, synchronous = self.synchronous, "log writer started");

        let result = self.run_loop();
        if let Err(e) = &result {
            self.state.begin_stop();
            apply_failure_policy(self.failure_policy, &self.name, e);
        }
        result
    }

    fn run_loop(&mut self) -> Result<WriterExit> {
        let flush = tick(self.flush_interval);
        let now = self.clock.now();
        let mut daily = self.policy.timer(Boundary::Daily, now);
        let mut hourly = self.policy.timer(Boundary::Hourly, now);

        // reused for every entry so rendering does not allocate
        let mut console_line = Vec::with_capacity(256);
        let mut file_line = Vec::with_capacity(256);

        loop {
            let signal = select! {
                recv(self.receiver) -> message => message.map_or(Signal::Closed, Signal::Message),
                recv(flush) -> _ => Signal::Flush,
                recv(daily) -> _ => Signal::Boundary(Boundary::Daily),
                recv(hourly) -> _ => Signal::Boundary(Boundary::Hourly),
            };

            match signal {
                Signal::Message(message) => {
                    let step = self.handle(message, &mut console_line, &mut file_line)?;
                    if let Step::Terminate = step {
                        self.sinks.close()?;
                        return Ok(WriterExit::Fatal);
                    }
                }
                Signal::Closed => {
                    self.sinks.close()?;
                    return Ok(WriterExit::Drained);
                }
                Signal::Flush => self.sinks.sync()?,
                Signal::Boundary(boundary) => {
                    let now = self.clock.now();
                    if self.sinks.roll_over(now)? {
                        debug!(logger = %self.name, ?boundary, "rotated log files");
                    }
                    match boundary {
                        Boundary::Daily => daily = self.policy.timer(Boundary::Daily, now),
                        Boundary::Hourly => hourly = self.policy.timer(Boundary::Hourly, now),
                    }
                }
            }
        }
    }

    fn handle(
        &mut self,
        message: Message,
        console_line: &mut Vec<u8>,
        file_line: &mut Vec<u8>,
    ) -> Result<Step> {
        let (event, ack) = match message {
            Message::Event { event, ack } => (event, ack),
            Message::Flush(ack) => {
                let synced = self.sinks.sync();
                self.check(synced)?;
                let _ = ack.send(());
                return Ok(Step::Continue);
            }
        };

        let level = event.level;
        let fatal = level == Level::Fatal;
        let written = self.write_entry(event, console_line, file_line);
        self.check(written)?;

        if let Some(ack) = ack {
            let _ = ack.send(());
        }

        if fatal {
            self.state.begin_stop();
            Ok(Step::Terminate)
        } else {
            Ok(Step::Continue)
        }
    }

    /// Leave `Running` before a failure propagates, so producers woken by
    /// the dropped ack already see the pipeline stopping
    fn check(&self, result: Result<()>) -> Result<()> {
        if result.is_err() {
            self.state.begin_stop();
        }
        result
    }

    fn write_entry(
        &mut self,
        event: LogEvent,
        console_line: &mut Vec<u8>,
        file_line: &mut Vec<u8>,
    ) -> Result<()> {
        let level = event.level;
        self.render(&event, console_line, file_line)?;
        // the rendered lines no longer borrow from the event
        self.pool.release(event);

        self.sinks.write(level, console_line, file_line, self.clock.now())?;
        if self.synchronous || level == Level::Fatal {
            self.sinks.sync()?;
        }
        Ok(())
    }

    fn render(
        &self,
        event: &LogEvent,
        console_line: &mut Vec<u8>,
        file_line: &mut Vec<u8>,
    ) -> Result<()> {
        console_line.clear();
        file_line.clear();
        self.console_format.format(event, console_line)?;
        if self.sinks.has_files() {
            self.file_format.format(event, file_line)?;
        }
        Ok(())
    }
}

/// Report a writer failure and apply the configured policy
fn apply_failure_policy(policy: FailurePolicy, name: &str, error: &Error) {
    error!(logger = %name, %error, ?policy, "log writer failed, output stopped");
    // the logger cannot report its own failure through itself
    eprintln!("sluice: log writer {name:?} failed: {error}");
    if policy == FailurePolicy::Abort {
        std::process::abort();
    }
}
