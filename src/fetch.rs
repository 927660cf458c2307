//! Page fetching.
//!
//! The harvester only needs one capability from the network: fetch a URL with
//! optional query parameters and get the markup back, failing on any non-2xx
//! status. [`PageFetcher`] is that seam; [`HttpFetcher`] implements it over
//! `reqwest`, and [`Limited`] puts a hard ceiling on simultaneous requests in
//! front of any fetcher.

use crate::config::TransportConfig;
use crate::error::HarvestError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};
use url::Url;

/// Fetch markup for a URL.
pub trait PageFetcher {
    /// Fetch `url` with `params` appended to its query string.
    ///
    /// Any non-success status is an error; there is no retry.
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<String, HarvestError>;
}

impl<F: PageFetcher> PageFetcher for &F {
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<String, HarvestError> {
        (**self).fetch(url, params).await
    }
}

/// Render `url` plus `params` the way they go on the wire. Used for logging
/// and as the key of canned pages in tests.
pub fn full_url(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.query_pairs_mut().extend_pairs(params);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// `reqwest`-backed fetcher with the pipeline's keep-alive and timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(transport: &TransportConfig) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(transport.max_keepalive)
            .timeout(transport.timeout())
            .build()
            .map_err(|e| HarvestError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self, params), fields(params = params.len()))]
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<String, HarvestError> {
        let http = |source| HarvestError::Http {
            url: full_url(url, params),
            source,
        };
        let response = self.client.get(url).query(params).send().await.map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: full_url(url, params),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(http)?;
        debug!(%status, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// Caps the number of requests in flight through `inner`.
///
/// A request waits for a permit before it reaches the inner fetcher and holds
/// it until the body has been read.
#[derive(Debug, Clone)]
pub struct Limited<F> {
    inner: F,
    permits: Arc<Semaphore>,
}

impl<F: PageFetcher> Limited<F> {
    pub fn new(inner: F, max_connections: usize) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(max_connections.max(1))),
        }
    }
}

impl<F: PageFetcher> PageFetcher for Limited<F> {
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<String, HarvestError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| HarvestError::Config(format!("connection pool closed: {e}")))?;
        self.inner.fetch(url, params).await
    }
}
