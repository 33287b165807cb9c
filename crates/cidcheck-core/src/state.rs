//! Run state: everything a comparison run accumulates.
//!
//! The state is a plain value. It is loaded once when a run starts, threaded
//! by `&mut` through the engine, and saved whole after every CID. All maps
//! are ordered so the serialised form is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::compare::{classify_sizes, SizeDiff};

/// Per-source results for one CID, keyed by source host.
pub type SourceResults = BTreeMap<String, SourceResult>;

/// Outcome of probing one source for one CID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResult {
    /// HTTP status, absent when the request never got a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Gateway-reported cache status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,

    /// Verified body size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Number of distinct blocks (CAR responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_count: Option<usize>,

    /// Payload size per block CID (CAR responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<BTreeMap<String, u64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceResult {
    /// A response was received.
    pub fn responded(status: u16, cache: Option<String>) -> Self {
        Self {
            status: Some(status),
            cache,
            ..Self::default()
        }
    }

    /// No usable response: transport failure or unparseable CID.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Attach an error to this result.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// A 2xx response whose body verified.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
            && self.size.is_some()
            && matches!(self.status, Some(status) if (200..300).contains(&status))
    }
}

/// A size divergence between the two reference sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    /// Snapshot of every source's result for the CID.
    #[serde(flatten)]
    pub sources: SourceResults,
    pub reason: String,
}

/// All state accumulated by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// cid -> source -> result.
    pub results: BTreeMap<String, SourceResults>,
    /// cid -> source -> error message, failed pairs only.
    pub errors: BTreeMap<String, BTreeMap<String, String>>,
    /// source -> status code -> count.
    pub statuses: BTreeMap<String, BTreeMap<u16, u64>>,
    pub diff_smaller: BTreeMap<String, DiffRecord>,
    pub diff_larger: BTreeMap<String, DiffRecord>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure every source has a (possibly empty) status histogram.
    pub fn ensure_sources<S: AsRef<str>>(&mut self, sources: &[S]) {
        for source in sources {
            self.statuses.entry(source.as_ref().to_owned()).or_default();
        }
    }

    /// Whether `cid` has an entry for every source.
    pub fn is_complete<S: AsRef<str>>(&self, cid: &str, sources: &[S]) -> bool {
        self.results
            .get(cid)
            .is_some_and(|results| sources.iter().all(|s| results.contains_key(s.as_ref())))
    }

    /// Whether `source` already has a successful result for `cid`.
    pub fn has_success(&self, cid: &str, source: &str) -> bool {
        self.result(cid, source).is_some_and(SourceResult::is_success)
    }

    pub fn result(&self, cid: &str, source: &str) -> Option<&SourceResult> {
        self.results.get(cid).and_then(|results| results.get(source))
    }

    /// Store a result, keeping the `errors` partition in step with it.
    pub fn record(&mut self, cid: &str, source: &str, result: SourceResult) {
        match &result.error {
            Some(error) => {
                self.errors
                    .entry(cid.to_owned())
                    .or_default()
                    .insert(source.to_owned(), error.clone());
            }
            None => {
                if let Some(errors) = self.errors.get_mut(cid) {
                    errors.remove(source);
                    if errors.is_empty() {
                        self.errors.remove(cid);
                    }
                }
            }
        }

        self.results
            .entry(cid.to_owned())
            .or_default()
            .insert(source.to_owned(), result);
    }

    /// Count one response with `status` from `source`.
    pub fn count_status(&mut self, source: &str, status: u16) {
        *self
            .statuses
            .entry(source.to_owned())
            .or_default()
            .entry(status)
            .or_insert(0) += 1;
    }

    pub fn status_count(&self, source: &str, status: u16) -> u64 {
        self.statuses
            .get(source)
            .and_then(|histogram| histogram.get(&status))
            .copied()
            .unwrap_or(0)
    }

    /// Compare the sizes the two reference sources reported for `cid` and
    /// record a diff if they differ.
    ///
    /// Any stale record for `cid` is dropped first, so the diff partitions
    /// always reflect the latest results.
    pub fn classify(&mut self, cid: &str, primary: &str, secondary: &str) -> Option<SizeDiff> {
        self.diff_smaller.remove(cid);
        self.diff_larger.remove(cid);

        let size = |source| self.result(cid, source).and_then(|r| r.size);
        let diff = classify_sizes(size(primary), size(secondary))?;

        let record = DiffRecord {
            sources: self.results.get(cid).cloned().unwrap_or_default(),
            reason: diff.reason(primary, secondary),
        };
        match diff {
            SizeDiff::Smaller => self.diff_smaller.insert(cid.to_owned(), record),
            SizeDiff::Larger => self.diff_larger.insert(cid.to_owned(), record),
        };
        Some(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES: [&str; 3] = ["ipfs.io", "bifrost-gateway.ipfs.io", "strn.pl"];

    fn sized(size: u64) -> SourceResult {
        SourceResult {
            size: Some(size),
            ..SourceResult::responded(200, Some("HIT".into()))
        }
    }

    #[test]
    fn test_complete_requires_every_source() {
        let mut state = RunState::new();
        state.record("cid", SOURCES[0], sized(1));
        state.record("cid", SOURCES[1], SourceResult::failed("boom"));
        assert!(!state.is_complete("cid", &SOURCES));

        state.record("cid", SOURCES[2], sized(1));
        assert!(state.is_complete("cid", &SOURCES));
        assert!(!state.is_complete("other", &SOURCES));
    }

    #[test]
    fn test_success_needs_size_and_2xx() {
        assert!(sized(10).is_success());
        assert!(!SourceResult::responded(200, None).is_success());
        assert!(!SourceResult::responded(500, None).is_success());
        assert!(!sized(10).with_error("bad digest").is_success());
    }

    #[test]
    fn test_record_tracks_errors() {
        let mut state = RunState::new();
        state.record("cid", "a", SourceResult::failed("timeout"));
        assert_eq!(state.errors["cid"]["a"], "timeout");

        state.record("cid", "a", sized(3));
        assert!(state.errors.is_empty());
    }

    #[test]
    fn test_status_histogram() {
        let mut state = RunState::new();
        state.ensure_sources(&SOURCES);
        assert_eq!(state.statuses.len(), 3);

        state.count_status("ipfs.io", 200);
        state.count_status("ipfs.io", 200);
        state.count_status("ipfs.io", 504);
        assert_eq!(state.status_count("ipfs.io", 200), 2);
        assert_eq!(state.status_count("ipfs.io", 504), 1);
        assert_eq!(state.status_count("strn.pl", 200), 0);
    }

    #[test]
    fn test_classify_records() {
        let mut state = RunState::new();
        state.record("small", SOURCES[0], sized(100));
        state.record("small", SOURCES[2], sized(150));
        state.record("large", SOURCES[0], sized(150));
        state.record("large", SOURCES[2], sized(100));
        state.record("same", SOURCES[0], sized(100));
        state.record("same", SOURCES[2], sized(100));

        assert_eq!(state.classify("small", SOURCES[0], SOURCES[2]), Some(SizeDiff::Smaller));
        assert_eq!(state.classify("large", SOURCES[0], SOURCES[2]), Some(SizeDiff::Larger));
        assert_eq!(state.classify("same", SOURCES[0], SOURCES[2]), None);

        assert_eq!(
            state.diff_smaller["small"].reason,
            "ipfs.io response smaller than strn.pl"
        );
        assert!(state.diff_larger.contains_key("large"));
        assert!(!state.diff_smaller.contains_key("same") && !state.diff_larger.contains_key("same"));
    }

    #[test]
    fn test_classify_ignores_failed_reference() {
        let mut state = RunState::new();
        state.record("cid", SOURCES[0], sized(100));
        state.record("cid", SOURCES[2], SourceResult::failed("connection reset"));
        assert_eq!(state.classify("cid", SOURCES[0], SOURCES[2]), None);
    }

    #[test]
    fn test_source_result_json_shape() {
        let result = SourceResult {
            block_count: Some(1),
            blocks: Some(BTreeMap::from([("bafk".to_string(), 5)])),
            ..sized(5)
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": 200,
                "cache": "HIT",
                "size": 5,
                "blockCount": 1,
                "blocks": { "bafk": 5 }
            })
        );
    }

    #[test]
    fn test_diff_record_flattens_sources() {
        let record = DiffRecord {
            sources: BTreeMap::from([("ipfs.io".to_string(), sized(1))]),
            reason: "why".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["reason"], "why");
        assert_eq!(json["ipfs.io"]["size"], 1);

        let back: DiffRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
