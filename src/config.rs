//! Configuration types for loaders
//!
//! `LoaderOptions` describes one collection to sync. `ProjectConfig` is the
//! file format read by the CLI: shared connection settings plus a list of
//! collections.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{ItemFailurePolicy, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable consulted when no base URL is configured
pub const BASE_URL_ENV: &str = "STRAPI_BASE_URL";

/// Environment variable consulted when no API token is configured
pub const API_TOKEN_ENV: &str = "STRAPI_API_TOKEN";

/// Default number of items requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Default REST prefix of a Strapi server
pub const DEFAULT_API_PATH: &str = "/api";

// ============================================================================
// Schema Source
// ============================================================================

/// Where a loader's `schema()` comes from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaSource {
    /// No schema: the host must declare one itself
    #[default]
    Unavailable,
    /// A schema declared up front
    Explicit {
        /// The declared schema
        schema: Schema,
    },
    /// Infer from the first item of the collection (best effort)
    InferFromSample,
    /// Convert the content-type builder's attribute descriptor
    Introspect,
}

// ============================================================================
// Loader Options
// ============================================================================

/// Options for a single collection loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderOptions {
    /// Strapi content type to query (singular API id, e.g. "article")
    pub content_type: String,

    /// Plural API id used in the collection URL; defaults to `{content_type}s`
    #[serde(default)]
    pub plural_content_type: Option<String>,

    /// Server origin, e.g. `http://localhost:1337`; falls back to `STRAPI_BASE_URL`
    #[serde(default, alias = "strapiUrl")]
    pub base_url: Option<String>,

    /// REST prefix appended to the origin
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// API token sent as a bearer token; falls back to `STRAPI_API_TOKEN`
    #[serde(default)]
    pub api_token: Option<String>,

    /// How long a sync stays fresh, in milliseconds (0 = always sync)
    #[serde(default, alias = "cacheDurationInMs", alias = "syncInterval")]
    pub cache_duration_ms: u64,

    /// Extra query parameters (qs-style object); `pagination` is controlled by the loader
    #[serde(default = "empty_params")]
    pub params: JsonValue,

    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// What to do when a single item fails
    #[serde(default)]
    pub on_item_failure: ItemFailurePolicy,

    /// Per-request timeout; none by default
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Where `schema()` comes from
    #[serde(default)]
    pub schema: SchemaSource,
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn empty_params() -> JsonValue {
    JsonValue::Object(JsonObject::new())
}

impl LoaderOptions {
    /// Options for a content type with every other field defaulted
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            plural_content_type: None,
            base_url: None,
            api_path: default_api_path(),
            api_token: None,
            cache_duration_ms: 0,
            params: empty_params(),
            page_size: DEFAULT_PAGE_SIZE,
            on_item_failure: ItemFailurePolicy::default(),
            timeout_ms: None,
            schema: SchemaSource::default(),
        }
    }

    /// Set the server origin
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the plural API id
    #[must_use]
    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural_content_type = Some(plural.into());
        self
    }

    /// Set the REST prefix
    #[must_use]
    pub fn with_api_path(mut self, path: impl Into<String>) -> Self {
        self.api_path = path.into();
        self
    }

    /// Set the API token
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the cache duration
    #[must_use]
    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration_ms = duration.as_millis() as u64;
        self
    }

    /// Set extra query parameters
    #[must_use]
    pub fn with_params(mut self, params: JsonValue) -> Self {
        self.params = params;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the item failure policy
    #[must_use]
    pub fn with_item_failure_policy(mut self, policy: ItemFailurePolicy) -> Self {
        self.on_item_failure = policy;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the schema source
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaSource) -> Self {
        self.schema = schema;
        self
    }

    /// Plural API id used in the collection URL
    pub fn plural(&self) -> String {
        self.plural_content_type
            .clone()
            .unwrap_or_else(|| format!("{}s", self.content_type))
    }

    /// Cache duration as a `Duration`
    pub fn cache_duration(&self) -> Duration {
        Duration::from_millis(self.cache_duration_ms)
    }

    /// Extra params with any caller-supplied `pagination` key removed
    pub fn query_params(&self) -> JsonObject {
        let mut params = self.params.as_object().cloned().unwrap_or_default();
        params.remove("pagination");
        params
    }

    /// Check the options without touching the environment
    pub fn validate(&self) -> Result<()> {
        if self.content_type.trim().is_empty() {
            return Err(Error::missing_field("contentType"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("pageSize", "must be at least 1"));
        }
        if !self.params.is_object() {
            return Err(Error::invalid_value("params", "must be a JSON object"));
        }
        Ok(())
    }

    /// REST root for this loader, e.g. `http://localhost:1337/api/`
    ///
    /// Falls back to `STRAPI_BASE_URL` and fails if neither is set.
    pub fn api_root(&self) -> Result<Url> {
        let env = std::env::var(BASE_URL_ENV).ok();
        let origin = check_base_url(self.base_url.as_deref(), env.as_deref())?;
        api_root(&origin, &self.api_path)
    }

    /// Configured API token, or the one from `STRAPI_API_TOKEN`
    pub fn resolved_api_token(&self) -> Option<String> {
        self.api_token
            .clone()
            .or_else(|| std::env::var(API_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Pick the configured base URL, else the environment value; both blank is an error.
pub fn check_base_url(configured: Option<&str>, env: Option<&str>) -> Result<String> {
    configured
        .filter(|u| !u.trim().is_empty())
        .or_else(|| env.filter(|u| !u.trim().is_empty()))
        .map(|u| u.trim().to_string())
        .ok_or_else(|| {
            Error::config(format!(
                "{BASE_URL_ENV} is not set. Provide a base URL in the loader options or set {BASE_URL_ENV} in the environment."
            ))
        })
}

/// Join an origin and a REST prefix into a directory-style URL.
pub fn api_root(origin: &str, api_path: &str) -> Result<Url> {
    let base = origin.trim_end_matches('/');
    let path = api_path.trim_matches('/');
    let joined = if path.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{path}/")
    };
    Ok(Url::parse(&joined)?)
}

// ============================================================================
// Project Config (CLI)
// ============================================================================

/// A set of collections sharing one Strapi server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Server origin shared by every collection
    #[serde(default)]
    pub base_url: Option<String>,

    /// REST prefix shared by every collection
    #[serde(default)]
    pub api_path: Option<String>,

    /// API token shared by every collection
    #[serde(default)]
    pub api_token: Option<String>,

    /// Collections to sync
    #[serde(default)]
    pub collections: Vec<LoaderOptions>,
}

impl ProjectConfig {
    /// Parse a YAML (or JSON) document
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Collections with the shared settings filled in where they left them unset
    pub fn collection_options(&self) -> Vec<LoaderOptions> {
        self.collections
            .iter()
            .cloned()
            .map(|mut options| {
                if options.base_url.is_none() {
                    options.base_url.clone_from(&self.base_url);
                }
                if options.api_token.is_none() {
                    options.api_token.clone_from(&self.api_token);
                }
                if let Some(path) = &self.api_path {
                    if options.api_path == DEFAULT_API_PATH {
                        options.api_path.clone_from(path);
                    }
                }
                options
            })
            .collect()
    }

    /// Look up one collection by content type
    pub fn collection(&self, content_type: &str) -> Option<LoaderOptions> {
        self.collection_options()
            .into_iter()
            .find(|c| c.content_type == content_type)
    }
}
