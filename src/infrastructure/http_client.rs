//! HTTP client for provider requests with rate limiting
//!
//! Thin wrapper around `reqwest` that applies a requests-per-second ceiling
//! (governor token bucket) before every call.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder};

use crate::infrastructure::config::SearchApiConfig;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
}

impl HttpClientConfig {
    pub fn from_search_api(config: &SearchApiConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.timeout_seconds,
            max_requests_per_second: config.max_requests_per_second,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_search_api(&SearchApiConfig::default())
    }
}

pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    /// GET builder for `url`, returned once the rate limiter lets the request through
    pub async fn get(&self, url: &str) -> RequestBuilder {
        self.rate_limiter.until_ready().await;
        tracing::debug!("🌐 HTTP GET: {}", url);
        self.client.get(url)
    }
}
