//! # cidcheck probe
//!
//! Gateway probes: one fetch per (source, cid, format), no retries.
//!
//! ## Overview
//!
//! The engine talks to gateways only through the [`GatewayProbe`] trait.
//! [`HttpProbe`] is the production implementation; [`MemoryGateway`]
//! answers from a script and counts probes, for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cidcheck_probe::{Format, GatewayProbe, HttpProbe};
//!
//! async fn example() -> cidcheck_probe::Result<()> {
//!     let probe = HttpProbe::with_defaults()?;
//!     let response = probe
//!         .fetch("ipfs.io", "bafkreigh2akiscaildcqabsyg3dfr6chu3fgpregiymsck7e7aqa4s52zy", Format::Raw)
//!         .await?;
//!     println!("{} cache={:?}", response.status, response.cache_status);
//!     let body = response.bytes().await?;
//!     println!("{} bytes", body.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use error::{ProbeError, Result};
pub use http::{HttpProbe, ProbeConfig};
pub use transport::{
    memory::{MemoryGateway, Script, ScriptedResponse},
    GatewayProbe,
};
pub use types::{Body, Format, ProbeResponse, CACHE_STATUS_HEADERS};
