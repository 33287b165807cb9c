//! CheckpointStore trait: the abstract interface for run-state persistence.

use async_trait::async_trait;
use cidcheck_core::RunState;

use crate::error::Result;

/// Loads and saves the whole [`RunState`] of a comparison run.
///
/// # Design Notes
///
/// - **Wholesale writes**: `save` overwrites every partition. There are no
///   incremental or append writes.
/// - **Tolerant loads**: a missing or corrupt partition loads as empty.
///   Only `save` failures are reported to the caller.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the last saved state, substituting empty partitions for any
    /// that are missing or unreadable.
    async fn load(&self) -> Result<RunState>;

    /// Persist `state`, replacing whatever was saved before.
    async fn save(&self, state: &RunState) -> Result<()>;
}
