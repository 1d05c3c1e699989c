//! Error types for QuickShare.

use thiserror::Error;

/// Common error type for QuickShare.
#[derive(Error, Debug)]
pub enum QuickShareError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sidecar (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Upload exceeds the configured size limit.
    #[error("file too large (max {max_bytes} bytes)")]
    TooLarge {
        /// Maximum allowed size in bytes.
        max_bytes: u64,
    },

    /// Storage backend failure that is not a plain I/O error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for QuickShare operations.
pub type Result<T> = std::result::Result<T, QuickShareError>;
