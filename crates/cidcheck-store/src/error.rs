//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur while persisting a checkpoint.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error reading or writing a checkpoint document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A partition could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
