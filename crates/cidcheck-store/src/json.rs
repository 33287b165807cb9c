//! Directory-of-JSON-documents checkpoint store.
//!
//! Each [`RunState`] partition lives in its own pretty-printed document:
//!
//! | file                | partition                          |
//! |---------------------|------------------------------------|
//! | `results.json`      | cid → source → result              |
//! | `errors.json`       | cid → source → message             |
//! | `statuses.json`     | source → status → count            |
//! | `diff-smaller.json` | cid → diff record (diffs enabled)  |
//! | `diff-larger.json`  | cid → diff record (diffs enabled)  |
//!
//! Every document is written to a sibling `.tmp` file and renamed over the
//! target, so a crash mid-save leaves either the old or the new document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cidcheck_core::RunState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::CheckpointStore;

pub const RESULTS_FILE: &str = "results.json";
pub const ERRORS_FILE: &str = "errors.json";
pub const STATUSES_FILE: &str = "statuses.json";
pub const DIFF_SMALLER_FILE: &str = "diff-smaller.json";
pub const DIFF_LARGER_FILE: &str = "diff-larger.json";

/// Checkpoint store backed by JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
    include_diffs: bool,
}

impl JsonStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            include_diffs: false,
        })
    }

    /// Also load and save the diff partitions.
    pub fn with_diffs(mut self, include_diffs: bool) -> Self {
        self.include_diffs = include_diffs;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    async fn read_partition<T>(&self, file: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable checkpoint, starting empty");
                return T::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt checkpoint, starting empty");
                T::default()
            }
        }
    }

    async fn write_partition<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.path(file);
        let tmp = self.path(&format!("{file}.tmp"));

        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for JsonStore {
    async fn load(&self) -> Result<RunState> {
        let mut state = RunState {
            results: self.read_partition(RESULTS_FILE).await,
            errors: self.read_partition(ERRORS_FILE).await,
            statuses: self.read_partition(STATUSES_FILE).await,
            ..RunState::default()
        };
        if self.include_diffs {
            state.diff_smaller = self.read_partition(DIFF_SMALLER_FILE).await;
            state.diff_larger = self.read_partition(DIFF_LARGER_FILE).await;
        }

        debug!(
            dir = %self.dir.display(),
            cids = state.results.len(),
            "loaded checkpoint"
        );
        Ok(state)
    }

    async fn save(&self, state: &RunState) -> Result<()> {
        self.write_partition(RESULTS_FILE, &state.results).await?;
        self.write_partition(ERRORS_FILE, &state.errors).await?;
        self.write_partition(STATUSES_FILE, &state.statuses).await?;
        if self.include_diffs {
            self.write_partition(DIFF_SMALLER_FILE, &state.diff_smaller)
                .await?;
            self.write_partition(DIFF_LARGER_FILE, &state.diff_larger)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cidcheck_core::SourceResult;
    use tempfile::TempDir;

    fn sample_state() -> RunState {
        let mut state = RunState::new();
        state.ensure_sources(&["ipfs.io", "strn.pl"]);
        state.record(
            "bafy1",
            "ipfs.io",
            SourceResult {
                size: Some(100),
                ..SourceResult::responded(200, Some("HIT".into()))
            },
        );
        state.record(
            "bafy1",
            "strn.pl",
            SourceResult {
                size: Some(150),
                ..SourceResult::responded(200, None)
            },
        );
        state.count_status("ipfs.io", 200);
        state.count_status("strn.pl", 200);
        state.classify("bafy1", "ipfs.io", "strn.pl");
        state
    }

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap().with_diffs(true);
        assert_eq!(store.load().await.unwrap(), RunState::default());
    }

    #[tokio::test]
    async fn test_round_trip_with_diffs() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap().with_diffs(true);

        let state = sample_state();
        assert_eq!(state.diff_smaller.len(), 1);
        store.save(&state).await.unwrap();

        assert_eq!(store.load().await.unwrap(), state);
        assert!(store.path(DIFF_SMALLER_FILE).exists());
        assert!(!store.path("results.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_diffs_skipped_when_disabled() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        let state = sample_state();
        store.save(&state).await.unwrap();

        assert!(!store.path(DIFF_SMALLER_FILE).exists());
        assert!(!store.path(DIFF_LARGER_FILE).exists());

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.results, state.results);
        assert!(loaded.diff_smaller.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_partition_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        store.save(&sample_state()).await.unwrap();

        std::fs::write(store.path(ERRORS_FILE), b"{ not json").unwrap();
        std::fs::write(store.path(STATUSES_FILE), b"[1, 2, 3]").unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.results, sample_state().results);
        assert!(loaded.errors.is_empty());
        assert!(loaded.statuses.is_empty());
    }

    #[tokio::test]
    async fn test_document_shape() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        store.save(&sample_state()).await.unwrap();

        let statuses: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path(STATUSES_FILE)).unwrap()).unwrap();
        assert_eq!(statuses["ipfs.io"]["200"], 1);

        let results: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path(RESULTS_FILE)).unwrap()).unwrap();
        assert_eq!(results["bafy1"]["ipfs.io"]["cache"], "HIT");
        assert!(results["bafy1"]["strn.pl"].get("cache").is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path().join("nested")).await.unwrap();

        store.save(&sample_state()).await.unwrap();
        store.save(&RunState::default()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), RunState::default());
    }
}
