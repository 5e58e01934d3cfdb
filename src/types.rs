//! Common types used throughout strapi-loader
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Item Failure Policy
// ============================================================================

/// What a sync pass does when a single item cannot be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFailurePolicy {
    /// Abort the pass on the first failing item
    #[default]
    FailFast,
    /// Record the failure in the report and keep going
    Collect,
}

impl ItemFailurePolicy {
    /// Whether a failing item ends the pass
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FailFast)
    }
}

// ============================================================================
// Item Id
// ============================================================================

/// Coerce a CMS `id` value into the string key used by the store.
///
/// Strings pass through; numbers use their JSON representation.
pub fn coerce_id(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
