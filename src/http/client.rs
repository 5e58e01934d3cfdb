//! HTTP client
//!
//! A thin wrapper over `reqwest` that handles:
//! - Base URL joining
//! - Default headers and bearer authentication
//! - Error classification (connection, status, body)
//!
//! Requests are never retried; a failure ends the sync pass.

use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative paths
    pub base_url: Option<String>,
    /// Request timeout; none means wait indefinitely
    pub timeout: Option<Duration>,
    /// Bearer token sent with every request
    pub bearer_token: Option<String>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: None,
            bearer_token: None,
            default_headers: HashMap::new(),
            user_agent: format!("strapi-loader/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the bearer token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.config.bearer_token = Some(token.into());
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client for JSON GET requests
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET `url` with query pairs and parse the body as JSON
    pub async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        let full_url = self.build_url(url);

        let mut req = self.client.get(&full_url);

        // Add default headers
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(token) = &self.config.bearer_token {
            req = req.bearer_auth(token);
        }

        if !query.is_empty() {
            req = req.query(query);
        }

        debug!("GET {} ({} query params)", full_url, query.len());

        let response = req.send().await.map_err(|e| {
            if e.is_connect() {
                Error::Connection {
                    url: full_url.clone(),
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), body));
        }
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Err(Error::shape(&full_url, "empty response body"));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::shape(&full_url, format!("response is not JSON: {e}")))
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .field("has_token", &self.config.bearer_token.is_some())
            .finish_non_exhaustive()
    }
}
