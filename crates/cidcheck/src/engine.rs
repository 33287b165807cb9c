//! The comparison engine: probe every source for every CID, verify what
//! comes back, record it, compare the reference sources and checkpoint.

use cidcheck_core::{CarSummary, ContentIdentifier, RunState, SizeDiff, SourceResult, Verifier};
use cidcheck_probe::{Body, Format, GatewayProbe, ProbeResponse};
use cidcheck_store::CheckpointStore;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::reader::CarBlockReader;

/// Counters for one call to [`Engine::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// CIDs probed and checkpointed.
    pub processed: usize,
    /// CIDs skipped because every source already had a result.
    pub skipped: usize,
    /// Path-qualified CIDs dropped from a raw run.
    pub filtered: usize,
    /// Gateway requests issued.
    pub probes: usize,
    /// (cid, source) pairs that ended with an error.
    pub failures: usize,
    /// New "smaller" diff records.
    pub smaller: usize,
    /// New "larger" diff records.
    pub larger: usize,
}

/// What happened to one CID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CidReport {
    pub probes: usize,
    pub failures: usize,
    pub diff: Option<SizeDiff>,
}

/// Drives gateway probes, verification and checkpointing.
///
/// CIDs are processed strictly one at a time, and within a CID sources are
/// probed in configured order, never concurrently.
pub struct Engine<P: GatewayProbe, S: CheckpointStore> {
    probe: P,
    store: S,
    verifier: Verifier,
    config: EngineConfig,
}

impl<P: GatewayProbe, S: CheckpointStore> Engine<P, S> {
    /// Create an engine with the standard registry.
    pub fn new(probe: P, store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            probe,
            store,
            verifier: Verifier::default(),
            config,
        })
    }

    /// Replace the verifier (e.g. one built on a restricted registry).
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Run
    // ─────────────────────────────────────────────────────────────────────────

    /// Process a working set of CIDs, resuming from the stored checkpoint.
    ///
    /// Per-CID failures are recorded, never returned. The only error is a
    /// checkpoint that cannot be saved.
    pub async fn run<I, T>(&self, cids: I) -> Result<RunReport>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut state = self.store.load().await?;
        state.ensure_sources(&self.config.sources);

        let mut report = RunReport::default();

        for cid in cids {
            let cid = cid.as_ref();

            // 1. Raw bodies of sub-paths cannot be checked against the root
            if self.config.format == Format::Raw && cid.contains('/') {
                debug!(cid, "skipping path-qualified CID in raw run");
                report.filtered += 1;
                continue;
            }

            // 2. Every source already answered
            if state.is_complete(cid, &self.config.sources) {
                debug!(cid, "already complete, skipping");
                report.skipped += 1;
                continue;
            }

            // 3. Probe, verify, compare
            let outcome = self.process_cid(&mut state, cid).await;
            report.probes += outcome.probes;
            report.failures += outcome.failures;
            match outcome.diff {
                Some(SizeDiff::Smaller) => report.smaller += 1,
                Some(SizeDiff::Larger) => report.larger += 1,
                None => {}
            }

            // 4. Checkpoint
            self.store.save(&state).await?;
            report.processed += 1;
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            filtered = report.filtered,
            probes = report.probes,
            failures = report.failures,
            smaller = report.smaller,
            larger = report.larger,
            "run complete"
        );
        Ok(report)
    }

    /// Probe every source for `cid` and record the outcome in `state`.
    ///
    /// Sources that already hold a successful result are not probed again.
    pub async fn process_cid(&self, state: &mut RunState, cid: &str) -> CidReport {
        info!(cid, "checking");
        let mut outcome = CidReport::default();
        let parsed = ContentIdentifier::parse(cid);

        for source in &self.config.sources {
            if state.has_success(cid, source) {
                debug!(cid, source = %source, "already verified");
                continue;
            }

            let result = match &parsed {
                Ok(root) => {
                    outcome.probes += 1;
                    self.check_source(source, cid, root).await
                }
                Err(e) => SourceResult::failed(e.to_string()),
            };

            if let Some(status) = result.status {
                state.count_status(source, status);
            }
            if let Some(error) = &result.error {
                warn!(cid, source = %source, error = %error, "check failed");
                outcome.failures += 1;
            }
            state.record(cid, source, result);
        }

        outcome.diff = state.classify(cid, self.config.primary(), self.config.secondary());
        if let Some(diff) = outcome.diff {
            info!(
                cid,
                diff = %diff,
                primary = self.config.primary(),
                secondary = self.config.secondary(),
                "response size differs"
            );
        }
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-source checks
    // ─────────────────────────────────────────────────────────────────────────

    /// One probe of one source, verified. Never fails: every error ends up
    /// in the returned result.
    async fn check_source(&self, source: &str, cid: &str, root: &ContentIdentifier) -> SourceResult {
        let response = match self.probe.fetch(source, cid, self.config.format).await {
            Ok(response) => response,
            Err(e) => return SourceResult::failed(e.to_string()),
        };

        let result = SourceResult::responded(response.status, response.cache_status.clone());
        if !response.is_success() {
            return result.with_error(format!("unexpected status {}", response.status));
        }

        match self.config.format {
            Format::Raw => match self.verify_raw(root, response).await {
                Ok(size) => SourceResult {
                    size: Some(size),
                    ..result
                },
                Err(e) => result.with_error(e.to_string()),
            },
            Format::Car => match self.verify_car(root, response.body).await {
                Ok(summary) => SourceResult {
                    size: Some(summary.size),
                    block_count: Some(summary.block_count),
                    blocks: Some(summary.blocks),
                    ..result
                },
                Err(e) => result.with_error(e.to_string()),
            },
        }
    }

    async fn verify_raw(&self, root: &ContentIdentifier, response: ProbeResponse) -> Result<u64> {
        let bytes = response.bytes().await?;
        Ok(self.verifier.validate_raw(root, &bytes)?)
    }

    /// Validate a CAR body block by block as it streams in. The first
    /// failure stops reading.
    async fn verify_car(&self, root: &ContentIdentifier, body: Body) -> Result<CarSummary> {
        let mut validator = self.verifier.car_validator(root);
        validator.begin()?;

        let mut reader = CarBlockReader::open(body).await?;
        validator.header_read(Some(reader.header()))?;

        while let Some(block) = reader.next_block().await {
            validator.accept(&block?)?;
        }

        Ok(validator.finish()?)
    }
}
