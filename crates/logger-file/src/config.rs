//! Configuration for the file logger

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sluice_logger::Level;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Flush interval used when none (or zero) is configured
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Largest accepted `rotation_hourly_interval`
pub const MAX_HOURLY_INTERVAL: u32 = 24;

/// Where console output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    /// Standard output
    #[default]
    Stdout,
    /// Standard error
    Stderr,
    /// No console output
    Disabled,
}

impl ConsoleTarget {
    pub(crate) fn open(self) -> Option<Box<dyn Write + Send>> {
        match self {
            Self::Stdout => Some(Box::new(std::io::stdout())),
            Self::Stderr => Some(Box::new(std::io::stderr())),
            Self::Disabled => None,
        }
    }
}

/// What to do when the writer hits an unrecoverable I/O error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop this logger; the rest of the process carries on
    #[default]
    Stop,
    /// Abort the whole process
    Abort,
}

/// Configuration for a [`FileLogger`](crate::FileLogger)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileLoggerConfig {
    /// Directory for the primary log files. Empty means console only.
    pub log_path: PathBuf,

    /// Directory for the error mirror. Empty means `log_path`.
    pub error_log_path: PathBuf,

    /// Text placed before the date stamp in every file name
    pub file_prefix: String,

    /// Rotate once a file would exceed this many bytes (0 = unbounded)
    pub rotation_size_bytes: u64,

    /// Rotate at local midnight
    pub rotation_daily: bool,

    /// Rotate every N hours at local hour multiples of N (0 = off, at most 24)
    pub rotation_hourly_interval: u32,

    /// How often buffered file output is flushed and synced
    #[serde(rename = "flush_interval_ms", with = "duration_ms")]
    pub flush_interval: Duration,

    /// Queue size between producers and the writer. 0 makes every emit wait
    /// until its entry is on disk.
    pub queue_capacity: usize,

    /// Write files as JSON lines instead of text
    pub json_output: bool,

    /// Module name rendered in every line and used as the registry key
    pub module: String,

    /// Initial level threshold
    pub level: Level,

    /// Console destination
    pub console: ConsoleTarget,

    /// Behavior on writer failure
    pub failure_policy: FailurePolicy,
}

impl Default for FileLoggerConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::new(),
            error_log_path: PathBuf::new(),
            file_prefix: String::new(),
            rotation_size_bytes: 0,
            rotation_daily: true,
            rotation_hourly_interval: 0,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            queue_capacity: 0,
            json_output: false,
            module: String::new(),
            level: Level::Debug,
            console: ConsoleTarget::Stdout,
            failure_policy: FailurePolicy::Stop,
        }
    }
}

impl FileLoggerConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> FileLoggerConfigBuilder {
        FileLoggerConfigBuilder::new()
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()
    }

    /// Fill in defaults and reject inconsistent settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an hourly interval above 24, an
    /// error log path without a log path, or a file prefix containing a
    /// path separator.
    pub fn validate(mut self) -> Result<Self> {
        if self.rotation_hourly_interval > MAX_HOURLY_INTERVAL {
            return Err(Error::Configuration(format!(
                "rotation_hourly_interval must be at most {MAX_HOURLY_INTERVAL}, got {}",
                self.rotation_hourly_interval
            )));
        }

        if self.log_path.as_os_str().is_empty() && !self.error_log_path.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "error_log_path requires log_path to be set".to_string(),
            ));
        }

        if self.file_prefix.contains(['/', '\\']) {
            return Err(Error::Configuration(format!(
                "file_prefix must not contain path separators: {:?}",
                self.file_prefix
            )));
        }

        if self.error_log_path.as_os_str().is_empty() {
            self.error_log_path.clone_from(&self.log_path);
        }

        if self.flush_interval.is_zero() {
            self.flush_interval = DEFAULT_FLUSH_INTERVAL;
        }

        Ok(self)
    }

    /// Whether file sinks are configured
    #[must_use]
    pub fn has_files(&self) -> bool {
        !self.log_path.as_os_str().is_empty()
    }

    /// Directory of the error mirror after defaulting
    #[must_use]
    pub fn error_log_dir(&self) -> &Path {
        if self.error_log_path.as_os_str().is_empty() {
            &self.log_path
        } else {
            &self.error_log_path
        }
    }

    /// Module name, or `None` when unset
    #[must_use]
    pub fn module_name(&self) -> Option<&str> {
        (!self.module.is_empty()).then_some(self.module.as_str())
    }

    /// Whether emits wait for durability instead of queueing
    #[must_use]
    pub const fn is_synchronous(&self) -> bool {
        self.queue_capacity == 0
    }
}

/// Builder for [`FileLoggerConfig`]
#[derive(Debug, Clone, Default)]
pub struct FileLoggerConfigBuilder {
    config: FileLoggerConfig,
}

impl FileLoggerConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: FileLoggerConfig::default(),
        }
    }

    /// Set the primary log directory
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Set the error mirror directory
    #[must_use]
    pub fn error_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.error_log_path = path.into();
        self
    }

    /// Set the file name prefix
    #[must_use]
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    /// Set the size rotation threshold in bytes
    #[must_use]
    pub const fn rotation_size_bytes(mut self, bytes: u64) -> Self {
        self.config.rotation_size_bytes = bytes;
        self
    }

    /// Enable or disable rotation at midnight
    #[must_use]
    pub const fn rotation_daily(mut self, enabled: bool) -> Self {
        self.config.rotation_daily = enabled;
        self
    }

    /// Set the hourly rotation interval
    #[must_use]
    pub const fn rotation_hourly_interval(mut self, hours: u32) -> Self {
        self.config.rotation_hourly_interval = hours;
        self
    }

    /// Set the flush interval
    #[must_use]
    pub const fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Set the queue capacity (0 = synchronous)
    #[must_use]
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Write JSON lines instead of text
    #[must_use]
    pub const fn json_output(mut self, enabled: bool) -> Self {
        self.config.json_output = enabled;
        self
    }

    /// Set the module name
    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.config.module = module.into();
        self
    }

    /// Set the initial level threshold
    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Set the console destination
    #[must_use]
    pub const fn console(mut self, console: ConsoleTarget) -> Self {
        self.config.console = console;
        self
    }

    /// Set the failure policy
    #[must_use]
    pub const fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Validate and return the configuration
    ///
    /// # Errors
    ///
    /// See [`FileLoggerConfig::validate`].
    pub fn build(self) -> Result<FileLoggerConfig> {
        self.config.validate()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
