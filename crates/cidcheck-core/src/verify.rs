//! Block and container verification.
//!
//! Gateways are untrusted. The only proof that returned bytes belong to the
//! requested identifier is re-hashing them with the identifier's declared
//! multihash function and comparing digests byte for byte.

use std::collections::BTreeMap;

use crate::block::Block;
use crate::car::{CarBlocks, CarHeader};
use crate::error::{CoreError, ValidationError};
use crate::identifier::ContentIdentifier;
use crate::registry::Registry;

/// Max bytes of a path-qualified root block echoed to the log.
const LOGGED_CONTENT_LEN: usize = 512;

/// Validates blocks against a [`Registry`].
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    registry: Registry,
}

impl Verifier {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Check that `bytes` hash to the digest `cid` declares.
    ///
    /// This performs:
    /// - Codec lookup
    /// - Multihash function lookup
    /// - Digest comparison
    pub fn validate_block(
        &self,
        cid: &ContentIdentifier,
        bytes: &[u8],
    ) -> Result<(), ValidationError> {
        // 1. Codec must be registered
        if !self.registry.supports(cid.codec()) {
            return Err(ValidationError::UnsupportedCodec(cid.codec()));
        }

        // 2. Hash function must be registered
        let hasher = self.registry.hasher(cid.multihash_code())?;

        // 3. Digest must match exactly
        let digest = hasher.digest(bytes);
        if digest.as_slice() != cid.digest() {
            return Err(ValidationError::DigestMismatch {
                expected: hex::encode(cid.digest()),
                actual: hex::encode(&digest),
            });
        }

        Ok(())
    }

    /// Validate a raw (single block) response body. Returns the body size.
    pub fn validate_raw(
        &self,
        cid: &ContentIdentifier,
        bytes: &[u8],
    ) -> Result<u64, ValidationError> {
        if cid.has_path() {
            return Err(ValidationError::PathNotVerifiable(cid.to_string()));
        }
        self.validate_block(cid, bytes)?;
        Ok(bytes.len() as u64)
    }

    /// Start validating a CAR response for `root`.
    pub fn car_validator(&self, root: &ContentIdentifier) -> CarValidator<'_> {
        CarValidator::new(self, root.clone())
    }

    /// Validate a stream of already-framed blocks.
    ///
    /// Stops at the first failure; the remaining blocks are never pulled.
    pub fn validate_car<I>(
        &self,
        root: &ContentIdentifier,
        blocks: I,
    ) -> Result<CarSummary, ValidationError>
    where
        I: IntoIterator<Item = Result<Block, CoreError>>,
    {
        let mut validator = self.car_validator(root);
        validator.begin()?;
        validator.header_read(None)?;

        for block in blocks {
            let block = block.map_err(|e| validator.fail(e.into()))?;
            validator.accept(&block)?;
        }

        validator.finish()
    }

    /// Validate a complete CAR body held in memory.
    pub fn validate_car_bytes(
        &self,
        root: &ContentIdentifier,
        bytes: &[u8],
    ) -> Result<CarSummary, ValidationError> {
        let mut validator = self.car_validator(root);
        validator.begin()?;

        let blocks = CarBlocks::new(bytes).map_err(|e| validator.fail(e.into()))?;
        validator.header_read(blocks.header())?;

        for block in blocks {
            let block = block.map_err(|e| validator.fail(e.into()))?;
            validator.accept(&block)?;
        }

        validator.finish()
    }
}

/// Where a [`CarValidator`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarState {
    Start,
    ReadingHeader,
    /// Waiting for the block at this index.
    ReadingBlock(u64),
    Done,
    Failed,
}

/// Aggregate of a fully validated CAR response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarSummary {
    /// Sum of all block payload lengths.
    pub size: u64,
    /// Payload length per block CID.
    pub blocks: BTreeMap<String, u64>,
    /// Number of distinct block CIDs.
    pub block_count: usize,
}

/// State machine validating one CAR response.
///
/// `Start -> ReadingHeader -> ReadingBlock(0) -> ... -> Done`, with any
/// failure moving to `Failed`. A failed or finished validator rejects
/// further input.
#[derive(Debug)]
pub struct CarValidator<'a> {
    verifier: &'a Verifier,
    root: ContentIdentifier,
    state: CarState,
    size: u64,
    blocks: BTreeMap<String, u64>,
}

impl<'a> CarValidator<'a> {
    fn new(verifier: &'a Verifier, root: ContentIdentifier) -> Self {
        Self {
            verifier,
            root,
            state: CarState::Start,
            size: 0,
            blocks: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> CarState {
        self.state
    }

    pub fn root(&self) -> &ContentIdentifier {
        &self.root
    }

    /// Bytes accepted so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The response stream is open; the header is being read.
    pub fn begin(&mut self) -> Result<(), ValidationError> {
        self.transition(CarState::Start, CarState::ReadingHeader)
    }

    /// The header has been decoded.
    pub fn header_read(&mut self, header: Option<&CarHeader>) -> Result<(), ValidationError> {
        if let Some(header) = header {
            tracing::trace!(root = %self.root, roots = header.roots.len(), "CAR header decoded");
        }
        self.transition(CarState::ReadingHeader, CarState::ReadingBlock(0))
    }

    /// Validate the next block.
    pub fn accept(&mut self, block: &Block) -> Result<(), ValidationError> {
        let CarState::ReadingBlock(index) = self.state else {
            return Err(self.fail(ValidationError::InvalidState(
                "block received outside of block reading",
            )));
        };

        if let Err(e) = self.check(index, block) {
            return Err(self.fail(e));
        }

        self.size += block.len() as u64;
        self.blocks.insert(block.cid.to_string(), block.len() as u64);
        self.state = CarState::ReadingBlock(index + 1);
        Ok(())
    }

    /// Mark the run failed and hand the error back.
    pub fn fail(&mut self, err: ValidationError) -> ValidationError {
        self.state = CarState::Failed;
        err
    }

    /// End-of-stream reached without failure.
    pub fn finish(mut self) -> Result<CarSummary, ValidationError> {
        let CarState::ReadingBlock(_) = self.state else {
            return Err(self.fail(ValidationError::InvalidState(
                "finish called before header or after failure",
            )));
        };
        self.state = CarState::Done;

        Ok(CarSummary {
            size: self.size,
            block_count: self.blocks.len(),
            blocks: self.blocks,
        })
    }

    fn check(&self, index: u64, block: &Block) -> Result<(), ValidationError> {
        if index == 0 {
            if self.root.has_path() {
                // A resolved sub-path cannot be authenticated against the
                // root identifier; only the block itself is checked.
                let shown = &block.data[..block.len().min(LOGGED_CONTENT_LEN)];
                tracing::info!(
                    root = %self.root,
                    block = %block.cid,
                    content = %String::from_utf8_lossy(shown),
                    "path-qualified root, skipping identity check"
                );
            } else if block.cid != self.root {
                return Err(ValidationError::RootMismatch {
                    root: self.root.to_string(),
                    block: block.cid.to_string(),
                });
            }
        }

        self.verifier.validate_block(&block.cid, &block.data)
    }

    fn transition(&mut self, from: CarState, to: CarState) -> Result<(), ValidationError> {
        if self.state != from {
            return Err(self.fail(ValidationError::InvalidState("out-of-order transition")));
        }
        self.state = to;
        Ok(())
    }
}
