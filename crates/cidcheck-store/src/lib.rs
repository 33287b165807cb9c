//! # cidcheck store
//!
//! Checkpoint persistence for comparison runs. Provides a trait-based
//! interface so the engine is storage-agnostic.
//!
//! ## Key Types
//!
//! - [`CheckpointStore`] - The async trait: `load` once, `save` after every CID
//! - [`JsonStore`] - One JSON document per partition in a directory
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cidcheck_store::{CheckpointStore, JsonStore};
//!
//! async fn example() -> cidcheck_store::Result<()> {
//!     let store = JsonStore::open("out").await?.with_diffs(true);
//!
//!     let mut state = store.load().await?;
//!     state.ensure_sources(&["ipfs.io", "strn.pl"]);
//!     store.save(&state).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod json;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use traits::CheckpointStore;
