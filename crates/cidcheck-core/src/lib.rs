//! # cidcheck core
//!
//! Pure primitives for verifying content served by IPFS gateways: content
//! identifiers, the codec/multihash registry, CAR decoding, block
//! verification and the run state a comparison accumulates.
//!
//! This crate contains no I/O, no storage, no networking. Bytes go in,
//! verdicts come out.
//!
//! ## Key Types
//!
//! - [`ContentIdentifier`] - A parsed CID, optionally with a path suffix
//! - [`Registry`] - Supported codecs and multihash functions
//! - [`Verifier`] - Checks raw blocks and CAR streams against a root CID
//! - [`CarDecoder`] - Incremental CARv1 frame decoder
//! - [`RunState`] - Results, errors, status histograms and size diffs
//!
//! ## Verification
//!
//! A block is trusted only after its digest has been recomputed with the
//! hash function its CID names. See [`verify`] module.

pub mod block;
pub mod car;
pub mod compare;
pub mod error;
pub mod identifier;
pub mod registry;
pub mod state;
pub mod verify;

pub use block::Block;
pub use car::{CarBlocks, CarDecoder, CarHeader};
pub use compare::{classify_sizes, SizeDiff};
pub use error::{CoreError, ValidationError};
pub use identifier::ContentIdentifier;
pub use registry::{Codec, HashFunction, Registry, RegistryBuilder};
pub use state::{DiffRecord, RunState, SourceResult, SourceResults};
pub use verify::{CarState, CarSummary, CarValidator, Verifier};
