//! Naver Local Search API client
//!
//! `GET /v1/search/local.json?query=..&display=..&start=..&sort=..` with the
//! `X-Naver-Client-Id` / `X-Naver-Client-Secret` headers.

use std::env;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::search::{LocalSearchProvider, RawPlace, SearchError, SearchRequest};
use crate::infrastructure::config::SearchApiConfig;
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};

const CLIENT_ID_HEADER: &str = "X-Naver-Client-Id";
const CLIENT_SECRET_HEADER: &str = "X-Naver-Client-Secret";

/// Longest error body kept in a `SearchError::Status`
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Required environment variable {0} is not set")]
    Missing(String),

    #[error("Environment variable {0} is empty")]
    Empty(String),
}

/// API credentials read from the process environment
#[derive(Clone, PartialEq, Eq)]
pub struct SearchCredentials {
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for SearchCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

impl SearchCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read both values from the environment; either one missing is fatal.
    pub fn from_env(id_var: &str, secret_var: &str) -> Result<Self, CredentialsError> {
        Self::from_lookup(id_var, secret_var, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(id_var: &str, secret_var: &str, lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| -> Result<String, CredentialsError> {
            let value = lookup(name).ok_or_else(|| CredentialsError::Missing(name.to_string()))?;
            if value.trim().is_empty() {
                return Err(CredentialsError::Empty(name.to_string()));
            }
            Ok(value)
        };
        Ok(Self::new(read(id_var)?, read(secret_var)?))
    }
}

#[derive(Debug, Deserialize)]
struct LocalSearchResponse {
    #[serde(default)]
    items: Vec<RawPlace>,
}

pub struct NaverLocalSearchClient {
    http: HttpClient,
    endpoint: String,
    credentials: SearchCredentials,
}

impl NaverLocalSearchClient {
    pub fn new(config: &SearchApiConfig, credentials: SearchCredentials) -> anyhow::Result<Self> {
        let http = HttpClient::new(HttpClientConfig::from_search_api(config))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[async_trait]
impl LocalSearchProvider for NaverLocalSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawPlace>, SearchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .await
            .header(CLIENT_ID_HEADER, &self.credentials.client_id)
            .header(CLIENT_SECRET_HEADER, &self.credentials.client_secret)
            .query(&[
                ("query", request.query.as_str()),
                ("display", &request.display.to_string()),
                ("start", &request.start.to_string()),
                ("sort", request.sort.as_param()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        let parsed: LocalSearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;

        debug!("'{}' start={} -> {} items", request.query, request.start, parsed.items.len());
        Ok(parsed.items)
    }
}
