//! Per-module logger registry
//!
//! There is no process-wide default logger. Components that want to share a
//! pipeline look it up here by module name; the first lookup builds it.

use crate::config::FileLoggerConfig;
use crate::error::{Error, Result};
use crate::logger::{FileLogger, FileLoggerBuilder};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// Loggers keyed by module name (the empty name is the unnamed logger)
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    loggers: RwLock<HashMap<String, Arc<FileLogger>>>,
}

impl LoggerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The logger registered for `module`
    #[must_use]
    pub fn get(&self, module: &str) -> Option<Arc<FileLogger>> {
        self.loggers.read().get(module).cloned()
    }

    /// The logger for `config.module`, building it on first use.
    ///
    /// The pipeline for a module is built at most once; later calls return
    /// the existing logger and ignore `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the logger has to be built and building fails.
    pub fn get_or_init(&self, config: FileLoggerConfig) -> Result<Arc<FileLogger>> {
        self.get_or_build(FileLoggerBuilder::new(config))
    }

    /// Like [`get_or_init`](Self::get_or_init) with a customized builder
    ///
    /// # Errors
    ///
    /// Returns an error if the logger has to be built and building fails.
    pub fn get_or_build(&self, builder: FileLoggerBuilder) -> Result<Arc<FileLogger>> {
        let module = builder.module().to_string();
        if let Some(logger) = self.get(&module) {
            return Ok(logger);
        }

        match self.loggers.write().entry(module) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let logger = Arc::new(builder.build()?);
                Ok(Arc::clone(entry.insert(logger)))
            }
        }
    }

    /// Build and register a logger, failing if the module already has one
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] for a duplicate module, or the
    /// build error.
    pub fn register(&self, builder: FileLoggerBuilder) -> Result<Arc<FileLogger>> {
        match self.loggers.write().entry(builder.module().to_string()) {
            Entry::Occupied(entry) => Err(Error::AlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                let logger = Arc::new(builder.build()?);
                Ok(Arc::clone(entry.insert(logger)))
            }
        }
    }

    /// Stop and forget the logger for `module`
    pub fn remove(&self, module: &str) -> Option<Arc<FileLogger>> {
        let logger = self.loggers.write().remove(module)?;
        logger.stop();
        Some(logger)
    }

    /// Registered module names, sorted
    #[must_use]
    pub fn modules(&self) -> Vec<String> {
        let mut modules: Vec<_> = self.loggers.read().keys().cloned().collect();
        modules.sort();
        modules
    }

    /// Stop every registered logger. They stay registered, in the stopped
    /// state.
    pub fn stop_all(&self) {
        let loggers: Vec<_> = self.loggers.read().values().cloned().collect();
        for logger in loggers {
            logger.stop();
        }
    }
}
