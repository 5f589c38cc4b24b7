use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;
use crate::months::MonthRange;
use crate::traffic::TrafficType;

pub const DEFAULT_BASE_URL: &str = "https://api.similarweb.com/v4/website";
pub const SOURCE_HEADER: &str = "x-sw-source";
pub const DEFAULT_SOURCE: &str = "geoshare";

/// One read request against the provider for a (domain, month) unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficQuery {
    pub domain: String,
    pub credential: String,
    pub traffic_type: TrafficType,
    pub range: MonthRange,
    pub limit: u32,
}

impl TrafficQuery {
    pub fn new(domain: &str, credential: &str, traffic_type: TrafficType, range: MonthRange, limit: u32) -> Self {
        TrafficQuery {
            domain: domain.to_string(),
            credential: credential.to_string(),
            traffic_type,
            range,
            limit,
        }
    }

    /// `{base}/{domain}/{endpoint}?api_key=..&start_date=..&end_date=..&main_domain_only=false&format=json&limit=..&offset=0&asc=true`
    pub fn url(&self, base: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(base).map_err(|e| FetchError::Transport(format!("invalid base url '{}': {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| FetchError::Transport(format!("base url '{}' cannot carry a path", base)))?
            .pop_if_empty()
            .push(&self.domain)
            .extend(self.traffic_type.endpoint().split('/'));

        url.query_pairs_mut()
            .append_pair("api_key", &self.credential)
            .append_pair("start_date", &self.range.start.to_string())
            .append_pair("end_date", &self.range.end.to_string())
            .append_pair("main_domain_only", "false")
            .append_pair("format", "json")
            .append_pair("limit", &self.limit.to_string())
            .append_pair("offset", "0")
            .append_pair("asc", "true");

        Ok(url)
    }
}

/// Raw provider answer; status interpretation is left to the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can answer a [`TrafficQuery`].
pub trait TrafficSource: Send + Sync {
    fn fetch(&self, query: &TrafficQuery) -> Result<ProviderResponse, FetchError>;
}

impl<T: TrafficSource + ?Sized> TrafficSource for &T {
    fn fetch(&self, query: &TrafficQuery) -> Result<ProviderResponse, FetchError> {
        (**self).fetch(query)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub source: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpTrafficSource {
    client: Client,
    config: ProviderConfig,
}

impl HttpTrafficSource {
    pub fn new(config: ProviderConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {}", e)))?;

        info!(
            action = "configure",
            component = "http_source",
            base_url = %config.base_url,
            timeout_ms = config.timeout.as_millis(),
            "HTTP traffic source ready"
        );
        Ok(Self { client, config })
    }
}

impl TrafficSource for HttpTrafficSource {
    fn fetch(&self, query: &TrafficQuery) -> Result<ProviderResponse, FetchError> {
        let url = query.url(&self.config.base_url)?;
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .header(SOURCE_HEADER, &self.config.source)
            .send()
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;

        debug!(
            action = "request",
            component = "http_source",
            domain = %query.domain,
            endpoint = query.traffic_type.endpoint(),
            month = %query.range.start,
            status,
            duration_ms = start_time.elapsed().as_millis(),
            "Provider responded"
        );
        Ok(ProviderResponse { status, body })
    }
}
