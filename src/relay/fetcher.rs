//! Server-side URL fetching for the content proxy
//!
//! The browser cannot read most third-party pages because of CORS, so the
//! gateway fetches them and hands back the raw text. With an empty host
//! allow-list and no size limit this is an open proxy.

use crate::config::ProxyConfig;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Top-level message for every proxy failure.
pub const FETCH_FAILED: &str = "Failed to fetch URL";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("response too large: {size} bytes (limit: {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Request(String),
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        warn!("Proxy fetch failed: {}", self);
        let body = Json(json!({
            "error": FETCH_FAILED,
            "details": self.to_string(),
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[derive(Clone)]
pub struct UrlFetcher {
    client: Client,
    allowed_hosts: Vec<String>,
    max_response_bytes: Option<usize>,
    timeout_secs: u64,
}

impl UrlFetcher {
    pub fn new(config: &ProxyConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            allowed_hosts: config
                .allowed_hosts
                .iter()
                .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            max_response_bytes: config.max_response_bytes,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Parse `raw` and apply the scheme and host guards.
    pub fn check_url(&self, raw: &str) -> Result<Url, FetchError> {
        let url = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl(format!("missing host in {}", raw)))?
            .to_ascii_lowercase();

        if !self.is_host_allowed(&host) {
            return Err(FetchError::HostNotAllowed(host));
        }

        Ok(url)
    }

    fn is_host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.is_empty()
            || self.allowed_hosts.iter().any(|allowed| {
                host == allowed
                    || host
                        .strip_suffix(allowed.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
    }

    /// GET `raw` and return the body as text, whatever the status code.
    pub async fn fetch(&self, raw: &str) -> Result<String, FetchError> {
        let url = self.check_url(raw)?;
        debug!(%url, "Proxy fetching");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if let (Some(limit), Some(length)) = (self.max_response_bytes, response.content_length()) {
            if length as usize > limit {
                return Err(FetchError::TooLarge {
                    size: length as usize,
                    limit,
                });
            }
        }

        let status = response.status();
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_error(e))? {
            body.extend_from_slice(&chunk);
            if let Some(limit) = self.max_response_bytes {
                if body.len() > limit {
                    return Err(FetchError::TooLarge {
                        size: body.len(),
                        limit,
                    });
                }
            }
        }

        debug!(%status, bytes = body.len(), "Proxy fetched");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(allowed: &[&str]) -> UrlFetcher {
        UrlFetcher::new(&ProxyConfig {
            allowed_hosts: allowed.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_open_proxy_allows_any_host() {
        assert!(fetcher(&[]).check_url("https://anything.example.org/x").is_ok());
    }

    #[test]
    fn test_allow_list_matches_subdomains() {
        let fetcher = fetcher(&["example.com"]);
        assert!(fetcher.check_url("https://example.com/").is_ok());
        assert!(fetcher.check_url("https://www.Example.com/page").is_ok());
        assert!(matches!(
            fetcher.check_url("https://badexample.com/"),
            Err(FetchError::HostNotAllowed(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(matches!(
            fetcher(&[]).check_url("file:///etc/passwd"),
            Err(FetchError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            fetcher(&[]).check_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
