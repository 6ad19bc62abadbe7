//! Error types for warmstart.

use thiserror::Error;

/// Result type alias for warmstart operations.
pub type Result<T> = std::result::Result<T, WarmstartError>;

/// Errors that can occur in warmstart operations.
#[derive(Error, Debug)]
pub enum WarmstartError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Key not found
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
