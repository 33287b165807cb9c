//! HTTP gateway probe over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::Client;
use tracing::debug;

use crate::error::{ProbeError, Result};
use crate::transport::GatewayProbe;
use crate::types::{Format, ProbeResponse, CACHE_STATUS_HEADERS};

/// HTTP probe configuration.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// URL scheme used to reach every source.
    pub scheme: String,
    pub user_agent: String,
    /// Whole-request timeout. `None` leaves the transport default.
    pub timeout: Option<Duration>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            user_agent: format!("cidcheck/{}", env!("CARGO_PKG_VERSION")),
            timeout: None,
        }
    }
}

/// Probes gateways with `GET {scheme}://{source}/ipfs/{cid}?format={format}`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    config: ProbeConfig,
}

impl HttpProbe {
    pub fn new(config: ProbeConfig) -> Result<Self> {
        if config.scheme.is_empty() {
            return Err(ProbeError::InvalidConfig("empty URL scheme".into()));
        }

        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProbeError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(ProbeConfig::default())
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// The URL probed for (source, cid, format).
    pub fn url(&self, source: &str, cid: &str, format: Format) -> String {
        format!(
            "{}://{}/ipfs/{}?format={}",
            self.config.scheme, source, cid, format
        )
    }
}

/// First cache-status header present on the response.
pub fn cache_status(headers: &HeaderMap) -> Option<String> {
    CACHE_STATUS_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    })
}

#[async_trait]
impl GatewayProbe for HttpProbe {
    async fn fetch(&self, source: &str, cid: &str, format: Format) -> Result<ProbeResponse> {
        let url = self.url(source, cid, format);
        debug!(%url, "probing gateway");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, format.accept())
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let cache = cache_status(response.headers());
        debug!(%url, status, cache = ?cache, "gateway responded");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ProbeError::Body(e.to_string())))
            .boxed();

        Ok(ProbeResponse::new(status, cache, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_url_shape() {
        let probe = HttpProbe::with_defaults().unwrap();
        assert_eq!(
            probe.url("ipfs.io", "bafkqaaa", Format::Car),
            "https://ipfs.io/ipfs/bafkqaaa?format=car"
        );
    }

    #[test]
    fn test_cache_status_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(cache_status(&headers), None);

        headers.insert("saturn-cache-status", HeaderValue::from_static("MISS"));
        assert_eq!(cache_status(&headers).as_deref(), Some("MISS"));

        headers.insert("x-proxy-cache", HeaderValue::from_static("HIT"));
        assert_eq!(cache_status(&headers).as_deref(), Some("HIT"));
    }

    #[test]
    fn test_empty_scheme_rejected() {
        let config = ProbeConfig {
            scheme: String::new(),
            ..ProbeConfig::default()
        };
        assert!(matches!(
            HttpProbe::new(config),
            Err(ProbeError::InvalidConfig(_))
        ));
    }
}
