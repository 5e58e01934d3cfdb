//! Error types for strapi-loader
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for strapi-loader
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Strapi API error ({status}): {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to connect to Strapi at {url}. Is the server running?")]
    Connection { url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Response Shape Errors
    // ============================================================================
    #[error("Invalid response from '{endpoint}': {message}")]
    ResponseShape { endpoint: String, message: String },

    #[error("Response for page {page} of '{endpoint}' has no pagination info")]
    MissingPagination { endpoint: String, page: u32 },

    // ============================================================================
    // Item Errors
    // ============================================================================
    #[error("Item at index {index} has no id")]
    MissingId { index: usize },

    #[error("Item id must be a string or number, got {found}")]
    InvalidId { found: String },

    #[error("Item {id} failed validation: {message}")]
    Validation { id: String, message: String },

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("No schema available for '{content_type}': {message}")]
    SchemaUnavailable {
        content_type: String,
        message: String,
    },

    #[error("Schema inference failed: {message}")]
    SchemaInference { message: String },

    // ============================================================================
    // Persistence Errors
    // ============================================================================
    #[error("Snapshot error: {message}")]
    Snapshot { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a response shape error
    pub fn shape(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseShape {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a schema-unavailable error
    pub fn schema_unavailable(content_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaUnavailable {
            content_type: content_type.into(),
            message: message.into(),
        }
    }

    /// Create a snapshot error
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }

    /// Errors raised while talking to the CMS, as opposed to local problems
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::HttpStatus { .. } | Error::Connection { .. }
        )
    }

    /// Errors scoped to a single content item
    pub fn is_item_error(&self) -> bool {
        matches!(
            self,
            Error::MissingId { .. } | Error::InvalidId { .. } | Error::Validation { .. }
        )
    }
}

/// Result type alias for strapi-loader
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
