//! Error types for the probe module.

use thiserror::Error;

/// Errors that can occur while probing a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body failed part-way through.
    #[error("body error: {0}")]
    Body(String),

    /// The probe could not be constructed.
    #[error("invalid probe config: {0}")]
    InvalidConfig(String),
}

/// Result type for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
