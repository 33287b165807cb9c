//! Error types for cidcheck core.

use thiserror::Error;

/// Errors raised while decoding identifiers or container bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("malformed CID `{input}`: {reason}")]
    MalformedCid { input: String, reason: String },

    #[error("CAR parse error: {0}")]
    ContainerParse(String),
}

impl CoreError {
    pub(crate) fn malformed(input: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::MalformedCid {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn container(reason: impl Into<String>) -> Self {
        CoreError::ContainerParse(reason.into())
    }
}

/// Validation errors for gateway-returned content.
///
/// The display strings are what ends up in the persisted `errors` document,
/// so they name the offending codes and digests in hex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unexpected codec: 0x{0:x}")]
    UnsupportedCodec(u64),

    #[error("Unexpected multihash code: 0x{0:x}")]
    UnsupportedMultihash(u64),

    #[error("Mismatch: digest of bytes ({actual}) does not match digest in CID ({expected})")]
    DigestMismatch { expected: String, actual: String },

    #[error("block cid ({block}) does not match root cid ({root})")]
    RootMismatch { root: String, block: String },

    #[error("cannot verify path-qualified CID {0} against raw bytes")]
    PathNotVerifiable(String),

    #[error("invalid validator state: {0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Container(#[from] CoreError),
}

impl ValidationError {
    /// Whether this failure came from the container framing rather than
    /// from the content itself.
    pub fn is_container_error(&self) -> bool {
        matches!(self, ValidationError::Container(CoreError::ContainerParse(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_codes_in_hex() {
        assert_eq!(
            ValidationError::UnsupportedCodec(0x0129).to_string(),
            "Unexpected codec: 0x129"
        );
        assert_eq!(
            ValidationError::UnsupportedMultihash(0xb220).to_string(),
            "Unexpected multihash code: 0xb220"
        );
    }

    #[test]
    fn test_container_error_passthrough() {
        let err: ValidationError = CoreError::container("truncated frame").into();
        assert!(err.is_container_error());
        assert_eq!(err.to_string(), "CAR parse error: truncated frame");
    }
}
