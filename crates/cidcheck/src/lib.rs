//! # cidcheck
//!
//! Verifies that independent IPFS gateways return byte-identical,
//! cryptographically correct content for the same CID, and records where
//! they diverge.
//!
//! ## Overview
//!
//! For every CID in a working set the [`Engine`]:
//!
//! - **Probes** each configured gateway once, in order
//! - **Verifies** the body: a raw block is re-hashed against the CID, a CAR
//!   stream is checked block by block as it arrives
//! - **Records** status, cache status, size and any error per gateway
//! - **Compares** the sizes reported by the two reference gateways
//! - **Checkpoints** the whole run state before moving to the next CID
//!
//! A restarted run skips CIDs every gateway already answered and re-probes
//! only the gateways that have not yet succeeded.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cidcheck::{Engine, EngineConfig};
//! use cidcheck::probe::{Format, HttpProbe};
//! use cidcheck::store::JsonStore;
//!
//! async fn example() -> cidcheck::Result<()> {
//!     let probe = HttpProbe::with_defaults()?;
//!     let store = JsonStore::open("out").await?.with_diffs(true);
//!     let config = EngineConfig::default().with_format(Format::Car);
//!
//!     let engine = Engine::new(probe, store, config)?;
//!     let report = engine
//!         .run(["bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi"])
//!         .await?;
//!     println!("{} diffs", report.smaller + report.larger);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `cidcheck::core` - Identifiers, registry, CAR decoding, verification
//! - `cidcheck::store` - Checkpoint persistence
//! - `cidcheck::probe` - Gateway probes

pub mod config;
pub mod engine;
pub mod error;
pub mod reader;

// Re-export component crates
pub use cidcheck_core as core;
pub use cidcheck_probe as probe;
pub use cidcheck_store as store;

pub use config::{EngineConfig, DEFAULT_SOURCES};
pub use engine::{CidReport, Engine, RunReport};
pub use error::{CheckError, Result};
pub use reader::CarBlockReader;

// Re-export commonly used core types
pub use cidcheck_core::{
    CarSummary, ContentIdentifier, DiffRecord, Registry, RunState, SizeDiff, SourceResult,
    Verifier,
};
