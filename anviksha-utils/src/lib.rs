//! Anviksha Utilities
//!
//! Layered configuration loading (defaults, file, environment) and
//! `tracing` subscriber setup shared by the library and the binary.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod config;
pub mod logging;

pub use config::{load_layered_with_env, string_or_list};
pub use logging::{init_logging, LogLevel, LoggerConfig};

/// Result type used throughout Anviksha utilities
pub type Result<T> = std::result::Result<T, UtilError>;

/// Error types for utility operations
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}
