//! Error types for file-based logging

use std::io;
use std::path::PathBuf;

/// Result type for file logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during file logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error occurred
    #[error("{0}: {1}")]
    Io(&'static str, #[source] io::Error),

    /// Failed to create log directory
    #[error("Failed to create log directory at {}: {source}", path.display())]
    CreateDirectory {
        /// The path that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to open a log file
    #[error("Failed to open log file {}: {source}", path.display())]
    OpenFile {
        /// The file that could not be opened
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to rotate log file
    #[error("Failed to rotate log file: {0}")]
    Rotation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Failed to serialize log: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A logger for this module already exists in the registry
    #[error("a logger for module {0:?} is already registered")]
    AlreadyRegistered(String),

    /// The writer thread could not be started
    #[error("Failed to spawn log writer thread: {0}")]
    Spawn(#[source] io::Error),
}
