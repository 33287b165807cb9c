//! Engine configuration.

use cidcheck_probe::Format;

use crate::error::{CheckError, Result};

/// Gateways probed by default, in probe order.
pub const DEFAULT_SOURCES: [&str; 3] = ["ipfs.io", "bifrost-gateway.ipfs.io", "strn.pl"];

/// Configuration for the comparison engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Gateway hosts, probed in this order for every CID.
    pub sources: Vec<String>,
    /// Response format requested from every gateway.
    pub format: Format,
    /// Indices into `sources` of the two gateways whose sizes are compared.
    pub reference: (usize, usize),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            format: Format::Raw,
            reference: (0, 2),
        }
    }
}

impl EngineConfig {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reference(mut self, primary: usize, secondary: usize) -> Self {
        self.reference = (primary, secondary);
        self
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.sources.len() < 2 {
            return Err(CheckError::Config(format!(
                "need at least two sources, got {}",
                self.sources.len()
            )));
        }

        if let Some(source) = self.sources.iter().find(|s| s.trim().is_empty()) {
            return Err(CheckError::Config(format!("blank source name {source:?}")));
        }

        for (i, source) in self.sources.iter().enumerate() {
            if self.sources[..i].contains(source) {
                return Err(CheckError::Config(format!("duplicate source {source}")));
            }
        }

        let (primary, secondary) = self.reference;
        let len = self.sources.len();
        if primary >= len || secondary >= len {
            return Err(CheckError::Config(format!(
                "reference indices ({primary}, {secondary}) out of range for {len} sources"
            )));
        }
        if primary == secondary {
            return Err(CheckError::Config(
                "reference sources must be two different gateways".into(),
            ));
        }

        Ok(())
    }

    /// The primary reference source.
    pub fn primary(&self) -> &str {
        &self.sources[self.reference.0]
    }

    /// The secondary reference source.
    pub fn secondary(&self) -> &str {
        &self.sources[self.reference.1]
    }
}
