//! The logger handle producers talk to

use crate::clock::{Clock, SystemClock};
use crate::config::FileLoggerConfig;
use crate::dispatcher::{Delivery, Dispatcher};
use crate::error::Result;
use crate::formatter::{JsonFormatter, LogFormatter, PlainTextFormatter};
use crate::pool::{EventPool, PoolMetrics};
use crate::rotation::RotationPolicy;
use crate::shutdown::{PipelineState, ShutdownCoordinator, StateCell};
use crate::sink::{Console, SinkSet};
use crate::writer::Writer;
use sluice_logger::{AtomicLevel, Level, Logger, Record};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Exit status used after a fatal entry
pub const FATAL_EXIT_CODE: i32 = 1;

/// Smallest number of idle events the pool retains
const MIN_POOL_CAPACITY: usize = 64;

/// Called with [`FATAL_EXIT_CODE`] once a fatal entry is durable and the
/// logger has stopped. The default exits the process.
pub type FatalHandler = Arc<dyn Fn(i32) + Send + Sync>;

/// A logging pipeline with a dedicated writer thread.
///
/// Producers format and enqueue; the writer renders, writes and rotates.
/// Share it with `Arc<FileLogger>`. Dropping the last handle stops the
/// pipeline, which flushes everything that was accepted.
///
/// # Example
/// ```no_run
/// use sluice_logger::{LoggerExt, info};
/// use sluice_logger_file::{FileLogger, FileLoggerConfig};
///
/// let config = FileLoggerConfig::builder()
///     .log_path("/var/log/api")
///     .module("api")
///     .queue_capacity(1024)
///     .build()?;
/// let logger = FileLogger::new(config)?;
///
/// logger.info("starting");
/// info!(logger, "listening on {}", 8080);
/// logger.stop();
/// # Ok::<(), sluice_logger_file::Error>(())
/// ```
pub struct FileLogger {
    name: String,
    module: Option<Arc<str>>,
    threshold: AtomicLevel,
    clock: Arc<dyn Clock>,
    pool: Arc<EventPool>,
    dispatcher: Dispatcher,
    state: Arc<StateCell>,
    shutdown: ShutdownCoordinator,
    on_fatal: FatalHandler,
}

impl FileLogger {
    /// Build a logger with the system clock, the configured console and
    /// process exit on fatal
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a log directory or
    /// file cannot be created, or the writer thread cannot be spawned.
    pub fn new(config: FileLoggerConfig) -> Result<Self> {
        FileLoggerBuilder::new(config).build()
    }

    /// Start a builder for runtime collaborators
    #[must_use]
    pub fn builder(config: FileLoggerConfig) -> FileLoggerBuilder {
        FileLoggerBuilder::new(config)
    }

    /// Module name, if configured
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Change the level threshold. Takes effect for subsequent emits.
    pub fn set_level(&self, level: Level) {
        self.threshold.store(level);
    }

    /// Current level threshold
    #[must_use]
    pub fn level(&self) -> Level {
        self.threshold.load()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state.load()
    }

    /// Whether every emit waits for its entry to reach disk
    #[must_use]
    pub const fn is_synchronous(&self) -> bool {
        self.dispatcher.is_synchronous()
    }

    /// Event pool counters
    #[must_use]
    pub fn pool_metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    /// Stop accepting entries, write and sync everything already accepted,
    /// and close all files.
    ///
    /// Safe to call any number of times from any thread; only the first call
    /// does work and every call returns once the pipeline is stopped.
    pub fn stop(&self) {
        self.shutdown.stop(&self.state, &self.dispatcher);
    }

    fn terminate(&self) {
        self.stop();
        (self.on_fatal)(FATAL_EXIT_CODE);
    }
}

impl Logger for FileLogger {
    fn log(&self, record: Record<'_>) {
        let fatal = record.level == Level::Fatal;
        if !self.threshold.allows(record.level) && !fatal {
            return;
        }
        if self.state.load() != PipelineState::Running {
            if fatal {
                self.terminate();
            }
            return;
        }

        let mut event = self.pool.acquire();
        event.fill(&record, self.clock.now());

        match self.dispatcher.dispatch(event, fatal) {
            Delivery::Rejected(event) => self.pool.release(event),
            Delivery::Queued | Delivery::Durable | Delivery::Lost => {}
        }

        if fatal {
            self.terminate();
        }
    }

    /// Wait until everything emitted so far is written and synced
    fn flush(&self) {
        if self.state.load() == PipelineState::Running {
            self.dispatcher.flush();
        }
    }

    /// Fatal is always enabled so that it terminates even after the
    /// pipeline has stopped
    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        level == Level::Fatal
            || (self.threshold.allows(level) && self.state.load() == PipelineState::Running)
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLogger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("state", &self.state())
            .field("synchronous", &self.is_synchronous())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`FileLogger`] with non-default collaborators
pub struct FileLoggerBuilder {
    config: FileLoggerConfig,
    console: Option<Option<Console>>,
    clock: Arc<dyn Clock>,
    on_fatal: FatalHandler,
}

impl FileLoggerBuilder {
    /// Create a builder for `config`
    #[must_use]
    pub fn new(config: FileLoggerConfig) -> Self {
        Self {
            config,
            console: None,
            clock: Arc::new(SystemClock),
            on_fatal: Arc::new(exit_process),
        }
    }

    /// Module name the logger will be registered under
    pub(crate) fn module(&self) -> &str {
        &self.config.module
    }

    /// Send console output to `writer` instead of the configured target
    #[must_use]
    pub fn console_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console = Some(Some(Box::new(writer)));
        self
    }

    /// Use `clock` for timestamps and rotation boundaries
    #[must_use]
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the process exit performed after a fatal entry
    #[must_use]
    pub fn on_fatal(mut self, handler: impl Fn(i32) + Send + Sync + 'static) -> Self {
        self.on_fatal = Arc::new(handler);
        self
    }

    /// Open the sinks and start the writer thread
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a log directory or
    /// file cannot be created, or the writer thread cannot be spawned.
    pub fn build(self) -> Result<FileLogger> {
        let config = self.config.validate()?;
        let now = self.clock.now();
        let module: Option<Arc<str>> = config.module_name().map(Arc::from);
        let name = config.module_name().unwrap_or("default").to_string();

        let policy = RotationPolicy {
            max_size: config.rotation_size_bytes,
            daily: config.rotation_daily,
            hourly_interval: config.rotation_hourly_interval,
        };
        let console = self.console.unwrap_or_else(|| config.console.open());
        let sinks = SinkSet::open(&config, policy, console, now)?;

        let file_format: Box<dyn LogFormatter> = if config.json_output {
            Box::new(JsonFormatter::with_module(module.clone()))
        } else {
            Box::new(PlainTextFormatter::with_module(module.clone()))
        };

        let (dispatcher, receiver) = Dispatcher::new(config.queue_capacity);
        let pool = Arc::new(EventPool::new(config.queue_capacity.max(MIN_POOL_CAPACITY)));
        let state = Arc::new(StateCell::new());

        let writer = Writer {
            name: name.clone(),
            receiver,
            sinks,
            pool: Arc::clone(&pool),
            console_format: PlainTextFormatter::with_module(module.clone()),
            file_format,
            policy,
            clock: Arc::clone(&self.clock),
            state: Arc::clone(&state),
            flush_interval: config.flush_interval,
            synchronous: config.is_synchronous(),
            failure_policy: config.failure_policy,
        }
        .spawn()?;

        info!(
            logger = %name,
            log_path = %config.log_path.display(),
            queue_capacity = config.queue_capacity,
            json = config.json_output,
            "file logger started"
        );

        Ok(FileLogger {
            shutdown: ShutdownCoordinator::new(name.clone(), writer),
            name,
            module,
            threshold: AtomicLevel::new(config.level),
            clock: self.clock,
            pool,
            dispatcher,
            state,
            on_fatal: self.on_fatal,
        })
    }
}

fn exit_process(code: i32) {
    std::process::exit(code);
}

impl std::fmt::Debug for FileLoggerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLoggerBuilder")
            .field("config", &self.config)
            .field("custom_console", &self.console.is_some())
            .finish_non_exhaustive()
    }
}
