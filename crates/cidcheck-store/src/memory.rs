//! In-memory implementation of the CheckpointStore trait.
//!
//! This is primarily for testing. It keeps the last saved snapshot and counts
//! how many times the engine checkpointed.

use async_trait::async_trait;
use cidcheck_core::RunState;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::CheckpointStore;

/// In-memory checkpoint store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    snapshot: RunState,
    saves: usize,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that will hand `state` to the next `load`.
    pub fn with_state(state: RunState) -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                snapshot: state,
                saves: 0,
            }),
        }
    }

    /// The last saved state.
    pub async fn snapshot(&self) -> RunState {
        self.inner.read().await.snapshot.clone()
    }

    /// Number of completed saves.
    pub async fn saves(&self) -> usize {
        self.inner.read().await.saves
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn load(&self) -> Result<RunState> {
        Ok(self.inner.read().await.snapshot.clone())
    }

    async fn save(&self, state: &RunState) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.snapshot = state.clone();
        inner.saves += 1;
        Ok(())
    }
}
