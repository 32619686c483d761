//! Auckland Transport GTFS stop search client.

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use super::error::DiscoveryError;

/// Default base URL for the GTFS v3 API.
const DEFAULT_BASE_URL: &str = "https://api.at.govt.nz/gtfs/v3";

/// GTFS location type of a platform or child stop.
const LOCATION_TYPE_STOP: i64 = 0;

/// Wrapper for the stop search response.
#[derive(Debug, Deserialize)]
pub struct StopsResponse {
    #[serde(default)]
    pub data: Vec<StopItem>,
}

/// One search result.
#[derive(Debug, Clone, Deserialize)]
pub struct StopItem {
    pub id: String,
    #[serde(default)]
    pub attributes: StopAttributes,
}

/// Minimal DTO for stop attributes - we only need name and type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopAttributes {
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub location_type: Option<i64>,
}

/// Pick the stop a board should use from search results.
///
/// Platforms and child stops (location type 0) win; otherwise the first
/// result is used.
pub fn select_stop(items: &[StopItem]) -> Option<&StopItem> {
    items
        .iter()
        .find(|item| item.attributes.location_type == Some(LOCATION_TYPE_STOP))
        .or_else(|| items.first())
}

/// Configuration for the stop search client.
#[derive(Debug, Clone)]
pub struct StopSearchConfig {
    /// Subscription key sent in `Ocp-Apim-Subscription-Key`
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StopSearchConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Client for the stop search endpoint.
#[derive(Debug, Clone)]
pub struct StopSearchClient {
    http: reqwest::Client,
    base_url: String,
}

impl StopSearchClient {
    pub fn new(config: StopSearchConfig) -> Result<Self, DiscoveryError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&config.api_key).map_err(|_| DiscoveryError::Api {
            status: 0,
            message: "invalid API key format".to_string(),
        })?;
        headers.insert(HeaderName::from_static("ocp-apim-subscription-key"), key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Search stops by name.
    pub async fn search(&self, term: &str) -> Result<Vec<StopItem>, DiscoveryError> {
        let url = format!("{}/stops", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("search", term)])
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(DiscoveryError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_stops(&body)
    }
}

/// Parse a stop search response body.
pub fn parse_stops(body: &str) -> Result<Vec<StopItem>, DiscoveryError> {
    let response: StopsResponse = serde_json::from_str(body).map_err(|e| DiscoveryError::Json {
        message: e.to_string(),
    })?;
    Ok(response.data)
}
