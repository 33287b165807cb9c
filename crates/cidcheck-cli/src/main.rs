//! # cidcheck CLI Entry Point
//!
//! Loads the working set, wires the HTTP probe and JSON checkpoint store into
//! the engine, and runs it to completion.

mod working_set;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cidcheck::probe::{Format, HttpProbe, ProbeConfig};
use cidcheck::store::JsonStore;
use cidcheck::{Engine, EngineConfig, DEFAULT_SOURCES};

/// Default endpoint publishing the working set.
const DEFAULT_CIDS_URL: &str = "https://orchestrator.strn.pl/top-cids";

/// Checks that IPFS gateways serve verifiable, identical content.
///
/// Every CID in the working set is fetched from each gateway, re-hashed
/// against its identifier, and the response sizes of two reference gateways
/// are compared. Results are checkpointed after every CID, so an interrupted
/// run resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "cidcheck", version, about)]
struct Cli {
    /// Response format to request: "raw" or "car".
    #[arg(long, env = "CIDCHECK_FORMAT", default_value = "raw")]
    format: Format,

    /// Gateway hosts to probe, in order. Defaults to ipfs.io,
    /// bifrost-gateway.ipfs.io and strn.pl.
    #[arg(long = "source", env = "CIDCHECK_SOURCES", value_delimiter = ',')]
    sources: Vec<String>,

    /// Indices of the two sources whose sizes are compared, as "primary,secondary".
    #[arg(long, default_value = "0,2", value_parser = parse_reference)]
    reference: (usize, usize),

    /// URL serving the working set as a JSON array of CIDs.
    #[arg(long, env = "CIDCHECK_CIDS_URL", default_value = DEFAULT_CIDS_URL)]
    cids_url: String,

    /// Read the working set from a file instead (JSON array or one CID per line).
    #[arg(long, env = "CIDCHECK_CIDS_FILE")]
    cids_file: Option<PathBuf>,

    /// Check at most this many CIDs.
    #[arg(long)]
    limit: Option<usize>,

    /// Directory holding the checkpoint documents.
    #[arg(long, env = "CIDCHECK_OUT", default_value = ".")]
    out: PathBuf,

    /// URL scheme used to reach the gateways.
    #[arg(long, default_value = "https")]
    scheme: String,

    /// Per-request timeout in seconds. No timeout when unset.
    #[arg(long)]
    timeout: Option<u64>,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let sources: Vec<String> = if self.sources.is_empty() {
            DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
        } else {
            self.sources.clone()
        };
        let (primary, secondary) = self.reference;

        EngineConfig::default()
            .with_sources(sources)
            .with_format(self.format)
            .with_reference(primary, secondary)
    }

    fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            scheme: self.scheme.clone(),
            timeout: self.timeout.map(Duration::from_secs),
            ..ProbeConfig::default()
        }
    }
}

fn parse_reference(s: &str) -> std::result::Result<(usize, usize), String> {
    let (primary, secondary) = s
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated indices, got {s:?}"))?;
    let index = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|e| format!("bad index {part:?}: {e}"))
    };
    Ok((index(primary)?, index(secondary)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let probe_config = cli.probe_config();
    let cids = match &cli.cids_file {
        Some(path) => working_set::load_file(path).await?,
        None => {
            let client = reqwest::Client::builder()
                .user_agent(&probe_config.user_agent)
                .build()
                .context("building HTTP client")?;
            working_set::fetch(&client, &cli.cids_url).await?
        }
    };
    let cids = working_set::truncate(cids, cli.limit);
    tracing::info!(count = cids.len(), format = %cli.format, "loaded working set");

    let store = JsonStore::open(&cli.out)
        .await
        .with_context(|| format!("opening checkpoint directory {}", cli.out.display()))?
        .with_diffs(cli.format == Format::Car);
    let probe = HttpProbe::new(probe_config)?;
    let engine = Engine::new(probe, store, cli.engine_config())?;

    let report = engine.run(&cids).await?;
    if report.smaller + report.larger > 0 {
        tracing::info!(
            smaller = report.smaller,
            larger = report.larger,
            "size divergence found"
        );
    }

    Ok(())
}
