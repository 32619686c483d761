//! Auckland Transport GTFS-Realtime client.
//!
//! Fetches the network-wide trip-updates feed and narrows it down to one
//! board's stop. No retries and no caching: the refresh engine decides what
//! to do when a fetch fails.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::Semaphore;

use crate::domain::{RawDeparture, StopRef};

use super::convert::{decode_feed, departures_for_stop};
use super::error::UpstreamError;

/// Default trip-updates endpoint.
const DEFAULT_FEED_URL: &str = "https://api.at.govt.nz/v2/public/realtime/tripupdates";

/// Header carrying the subscription key.
const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A source of live departures for a stop.
///
/// Implementations fail with an [`UpstreamError`] and never retry.
pub trait FeedClient: Send + Sync {
    /// Fetch the upcoming departures at `stop`, in board order.
    fn fetch(
        &self,
        stop: &StopRef,
    ) -> impl Future<Output = Result<Vec<RawDeparture>, UpstreamError>> + Send;
}

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Subscription key
    pub api_key: String,
    /// Trip-updates endpoint
    pub url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: DEFAULT_FEED_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom endpoint (for testing).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Live GTFS-Realtime client.
#[derive(Debug, Clone)]
pub struct AtFeedClient {
    http: reqwest::Client,
    url: String,
    semaphore: Arc<Semaphore>,
}

impl AtFeedClient {
    /// Create a new client.
    ///
    /// Fails with `AuthMissing` when the key is empty, so a missing
    /// credential never reaches the network.
    pub fn new(config: FeedConfig) -> Result<Self, UpstreamError> {
        if config.api_key.trim().is_empty() {
            return Err(UpstreamError::AuthMissing);
        }

        let mut headers = HeaderMap::new();
        let api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| UpstreamError::AuthMissing)?;
        headers.insert(HeaderName::from_static(SUBSCRIPTION_KEY_HEADER), api_key);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/x-google-protobuf"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Fetch and decode the whole trip-updates feed.
    pub async fn fetch_feed(&self) -> Result<gtfs_rt::FeedMessage, UpstreamError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| UpstreamError::network("semaphore closed"))?;

        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(UpstreamError::AuthMissing);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::EmptyQuota);
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_forbidden(&body));
        }

        if !status.is_success() {
            return Err(UpstreamError::network(format!(
                "feed returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response.bytes().await?;
        decode_feed(&body)
    }
}

impl FeedClient for AtFeedClient {
    async fn fetch(&self, stop: &StopRef) -> Result<Vec<RawDeparture>, UpstreamError> {
        let feed = self.fetch_feed().await?;
        Ok(departures_for_stop(&feed, stop.stop_id(), Utc::now()))
    }
}

/// The gateway answers 403 both for bad keys and for spent quotas.
fn classify_forbidden(body: &str) -> UpstreamError {
    if body.to_ascii_lowercase().contains("quota") {
        UpstreamError::EmptyQuota
    } else {
        UpstreamError::AuthMissing
    }
}
