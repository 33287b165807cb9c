//! GatewayProbe trait and an in-memory, scripted implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Format, ProbeResponse};

/// Issues a single fetch of `cid` in `format` from the gateway `source`.
///
/// No retries and no side effects beyond the request itself. Non-2xx
/// statuses are responses, not errors; only a request that never gets a
/// response fails.
#[async_trait]
pub trait GatewayProbe: Send + Sync {
    async fn fetch(&self, source: &str, cid: &str, format: Format) -> Result<ProbeResponse>;
}

/// A scripted gateway for testing.
///
/// Answers from a table keyed by (source, cid) and counts every probe.
/// Unknown keys answer 404 with an empty body.
pub mod memory {
    use super::*;
    use std::collections::HashMap;

    use bytes::Bytes;
    use futures::StreamExt;
    use tokio::sync::Mutex;

    use crate::error::ProbeError;

    /// One scripted answer.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Script {
        /// Answer with a response.
        Respond(ScriptedResponse),
        /// Fail the request with a transport error.
        Fail(String),
    }

    /// A canned response.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ScriptedResponse {
        pub status: u16,
        pub cache_status: Option<String>,
        /// Body chunks, delivered in order.
        pub chunks: Vec<Bytes>,
        /// Error raised after the last chunk.
        pub body_error: Option<String>,
    }

    impl ScriptedResponse {
        /// 200 with `body` as a single chunk.
        pub fn ok(body: impl Into<Bytes>) -> Self {
            Self::status(200).body(body)
        }

        /// Empty response with `status`.
        pub fn status(status: u16) -> Self {
            Self {
                status,
                cache_status: None,
                chunks: Vec::new(),
                body_error: None,
            }
        }

        pub fn body(mut self, body: impl Into<Bytes>) -> Self {
            self.chunks = vec![body.into()];
            self
        }

        pub fn cache(mut self, value: impl Into<String>) -> Self {
            self.cache_status = Some(value.into());
            self
        }

        /// Re-split the body into chunks of at most `size` bytes.
        pub fn chunked(mut self, size: usize) -> Self {
            let body: Vec<u8> = self.chunks.concat();
            self.chunks = body
                .chunks(size.max(1))
                .map(Bytes::copy_from_slice)
                .collect();
            self
        }

        pub fn body_error(mut self, message: impl Into<String>) -> Self {
            self.body_error = Some(message.into());
            self
        }
    }

    type Key = (String, String);

    /// In-memory gateway.
    #[derive(Debug, Default)]
    pub struct MemoryGateway {
        scripts: HashMap<Key, Script>,
        probes: Mutex<Vec<(String, String, Format)>>,
    }

    impl MemoryGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the answer for (source, cid).
        pub fn script(mut self, source: &str, cid: &str, script: Script) -> Self {
            self.scripts
                .insert((source.to_owned(), cid.to_owned()), script);
            self
        }

        /// Shorthand for a [`Script::Respond`].
        pub fn respond(self, source: &str, cid: &str, response: ScriptedResponse) -> Self {
            self.script(source, cid, Script::Respond(response))
        }

        /// Shorthand for a [`Script::Fail`].
        pub fn fail(self, source: &str, cid: &str, message: impl Into<String>) -> Self {
            self.script(source, cid, Script::Fail(message.into()))
        }

        /// Number of probes issued for (source, cid).
        pub async fn probes(&self, source: &str, cid: &str) -> usize {
            self.probes
                .lock()
                .await
                .iter()
                .filter(|(s, c, _)| s == source && c == cid)
                .count()
        }

        /// Total number of probes issued.
        pub async fn total_probes(&self) -> usize {
            self.probes.lock().await.len()
        }

        /// Every probe in issue order.
        pub async fn log(&self) -> Vec<(String, String, Format)> {
            self.probes.lock().await.clone()
        }
    }

    #[async_trait]
    impl GatewayProbe for MemoryGateway {
        async fn fetch(&self, source: &str, cid: &str, format: Format) -> Result<ProbeResponse> {
            self.probes
                .lock()
                .await
                .push((source.to_owned(), cid.to_owned(), format));

            let script = self
                .scripts
                .get(&(source.to_owned(), cid.to_owned()))
                .cloned()
                .unwrap_or_else(|| Script::Respond(ScriptedResponse::status(404)));

            match script {
                Script::Fail(message) => Err(ProbeError::Transport(message)),
                Script::Respond(response) => {
                    let tail = response.body_error.map(|e| Err(ProbeError::Body(e)));
                    let chunks = response.chunks.into_iter().map(Ok).chain(tail);
                    Ok(ProbeResponse::new(
                        response.status,
                        response.cache_status,
                        futures::stream::iter(chunks).boxed(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{MemoryGateway, ScriptedResponse};
    use super::*;
    use crate::error::ProbeError;

    #[tokio::test]
    async fn test_memory_gateway_scripts() {
        let gateway = MemoryGateway::new()
            .respond("a", "cid", ScriptedResponse::ok("hello").cache("HIT").chunked(2))
            .fail("b", "cid", "connection refused");

        let response = gateway.fetch("a", "cid", Format::Raw).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.cache_status.as_deref(), Some("HIT"));
        assert_eq!(&response.bytes().await.unwrap()[..], b"hello");

        let err = gateway.fetch("b", "cid", Format::Raw).await.unwrap_err();
        assert_eq!(err, ProbeError::Transport("connection refused".into()));

        let missing = gateway.fetch("c", "cid", Format::Car).await.unwrap();
        assert_eq!(missing.status, 404);

        assert_eq!(gateway.probes("a", "cid").await, 1);
        assert_eq!(gateway.total_probes().await, 3);
        assert_eq!(gateway.log().await[2].2, Format::Car);
    }

    #[tokio::test]
    async fn test_memory_gateway_body_error() {
        let gateway = MemoryGateway::new().respond(
            "a",
            "cid",
            ScriptedResponse::ok("partial").body_error("reset by peer"),
        );
        let response = gateway.fetch("a", "cid", Format::Car).await.unwrap();
        assert_eq!(
            response.bytes().await,
            Err(ProbeError::Body("reset by peer".into()))
        );
    }
}
