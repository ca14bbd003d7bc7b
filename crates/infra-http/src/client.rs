// Shared reqwest plumbing for the upstream sources

use navtrack_core::port::{SourceError, SourceResult};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Upstream HTTP configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout
    pub timeout_secs: u64,
    pub user_agent: String,
    pub mfapi_base_url: String,
    pub yahoo_base_url: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("Mozilla/5.0 (compatible; navtrack/{})", navtrack_core::VERSION),
            mfapi_base_url: "https://api.mfapi.in".to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Thin GET wrapper that maps transport and status failures to `SourceError`
#[derive(Clone)]
pub(crate) struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub(crate) fn new(settings: &HttpSettings, base_url: &str) -> SourceResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and return the body of a 2xx response
    pub(crate) async fn get_text(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> SourceResult<String> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(status_error(status, path, &body));
        }
        Ok(body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout(err.to_string())
    } else {
        SourceError::Http(err.to_string())
    }
}

/// Map a non-2xx response to a `SourceError`
pub(crate) fn status_error(status: StatusCode, path: &str, body: &str) -> SourceError {
    if status == StatusCode::NOT_FOUND {
        return SourceError::NotFound(path.to_string());
    }

    let mut message: String = body.chars().take(200).collect();
    if message.is_empty() {
        message = status.canonical_reason().unwrap_or("unknown").to_string();
    }
    SourceError::Status {
        code: status.as_u16(),
        message,
    }
}
