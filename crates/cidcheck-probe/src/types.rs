//! Probe request and response types.

use std::fmt;
use std::str::FromStr;

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::{ProbeError, Result};

/// Response headers carrying the gateway cache status, in lookup order.
pub const CACHE_STATUS_HEADERS: [&str; 2] = ["x-proxy-cache", "saturn-cache-status"];

/// A response body as a stream of chunks, in arrival order.
pub type Body = BoxStream<'static, Result<Bytes>>;

/// Response format requested from a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// The single raw block named by the CID.
    Raw,
    /// A CARv1 stream of every block under the CID.
    Car,
}

impl Format {
    /// Value of the `format` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Raw => "raw",
            Format::Car => "car",
        }
    }

    /// Value of the `Accept` header.
    pub fn accept(self) -> &'static str {
        match self {
            Format::Raw => "application/vnd.ipld.raw",
            Format::Car => "application/vnd.ipld.car",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Format::Raw),
            "car" => Ok(Format::Car),
            other => Err(ProbeError::InvalidConfig(format!(
                "unknown format {other:?}, expected \"raw\" or \"car\""
            ))),
        }
    }
}

/// What a gateway answered.
pub struct ProbeResponse {
    pub status: u16,
    /// First cache-status header present, if any.
    pub cache_status: Option<String>,
    pub body: Body,
}

impl ProbeResponse {
    pub fn new(status: u16, cache_status: Option<String>, body: Body) -> Self {
        Self {
            status,
            cache_status,
            body,
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Drain the body into one buffer.
    pub async fn bytes(mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Debug for ProbeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeResponse")
            .field("status", &self.status)
            .field("cache_status", &self.cache_status)
            .finish_non_exhaustive()
    }
}
