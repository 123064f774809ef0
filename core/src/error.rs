//! Error types for the rfwd-core library.

use thiserror::Error;

/// Result type alias for rfwd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while publishing ports or configuring the shim.
#[derive(Error, Debug)]
pub enum Error {
    /// The environment rejected a write.
    #[error("Failed to set environment variable {key}: {source}")]
    Env {
        key: String,
        source: std::io::Error,
    },

    /// A key or value that can never be stored in the environment.
    #[error("Invalid environment entry: {0}")]
    InvalidEnv(String),

    /// The original implementation of an intercepted symbol could not be found.
    #[error("Failed to resolve original symbol: {0}")]
    Resolve(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
