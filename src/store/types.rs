//! Host contract traits
//!
//! A loader never owns storage. The host hands it a data store, a metadata
//! map, a logger, and optional parse/digest hooks through these traits.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stored content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    /// Item id coerced to a string
    pub id: String,
    /// Item data as returned by the CMS (after parsing, if any)
    pub data: Value,
    /// Fingerprint of `data` used to detect changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl DataEntry {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
            digest: None,
        }
    }

    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }
}

/// Keyed content store
pub trait DataStore: Send + Sync {
    fn get(&self, id: &str) -> Option<DataEntry>;

    /// Insert or replace; returns `false` if the digest matched and nothing changed
    fn set(&mut self, entry: DataEntry) -> bool;

    fn delete(&mut self, id: &str);

    fn clear(&mut self);

    fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn keys(&self) -> Vec<String>;

    fn entries(&self) -> Vec<(String, DataEntry)> {
        self.keys()
            .into_iter()
            .filter_map(|k| self.get(&k).map(|e| (k, e)))
            .collect()
    }

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// String key-value metadata owned by the host
pub trait MetaStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String);

    fn delete(&mut self, key: &str);

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Host-visible log sink
pub trait LoaderLogger: Send + Sync {
    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);
}

/// Per-item parse/validation hook
pub trait DataParser: Send + Sync {
    /// Return the (possibly transformed) data, or an item error
    fn parse(&self, id: &str, data: Value) -> Result<Value>;
}

/// Per-item fingerprint hook
pub trait DigestGenerator: Send + Sync {
    fn digest(&self, data: &Value) -> String;
}
