//! Error types for cidcheck.

use cidcheck_core::{CoreError, ValidationError};
use cidcheck_probe::ProbeError;
use cidcheck_store::StoreError;
use thiserror::Error;

/// Errors that can occur while checking a CID or running the engine.
///
/// Per-(cid, source) failures are recorded in the run state using this
/// type's display string, so content errors are shown unprefixed.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Identifier or container decoding error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Content verification error.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Gateway request or body error.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Checkpoint could not be persisted.
    #[error("checkpoint error: {0}")]
    Store(#[from] StoreError),

    /// Invalid engine configuration.
    #[error("invalid config: {0}")]
    Config(String),
}

/// Result type for cidcheck operations.
pub type Result<T> = std::result::Result<T, CheckError>;
