//! Blocks: an identifier paired with the bytes a gateway returned for it.

use bytes::Bytes;

use crate::identifier::ContentIdentifier;

/// A (cid, bytes) pair as it came off the wire. Nothing about a `Block`
/// is trusted until it has passed [`crate::Verifier::validate_block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub cid: ContentIdentifier,
    pub data: Bytes,
}

impl Block {
    pub fn new(cid: ContentIdentifier, data: impl Into<Bytes>) -> Self {
        Self {
            cid,
            data: data.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
