//! In-memory host implementations

use super::types::{DataEntry, DataStore, LoaderLogger, MetaStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Data store backed by a sorted map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    entries: BTreeMap<String, DataEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataStore for MemoryStore {
    fn get(&self, id: &str) -> Option<DataEntry> {
        self.entries.get(id).cloned()
    }

    fn set(&mut self, entry: DataEntry) -> bool {
        if let (Some(existing), Some(digest)) = (self.entries.get(&entry.id), &entry.digest) {
            if existing.digest.as_ref() == Some(digest) {
                return false;
            }
        }
        self.entries.insert(entry.id.clone(), entry);
        true
    }

    fn delete(&mut self, id: &str) {
        self.entries.remove(id);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Metadata map backed by a sorted map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryMeta {
    values: BTreeMap<String, String>,
}

impl MemoryMeta {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetaStore for MemoryMeta {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Logger that forwards to `tracing`, prefixed with a label
#[derive(Debug, Clone)]
pub struct TracingLogger {
    label: String,
}

impl TracingLogger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("strapi-loader")
    }
}

impl LoaderLogger for TracingLogger {
    fn debug(&self, message: &str) {
        debug!(label = %self.label, "{message}");
    }

    fn info(&self, message: &str) {
        info!(label = %self.label, "{message}");
    }

    fn warn(&self, message: &str) {
        warn!(label = %self.label, "{message}");
    }

    fn error(&self, message: &str) {
        error!(label = %self.label, "{message}");
    }
}
