//! File-backed snapshot of stores and metadata
//!
//! Provides file-based persistence with atomic writes, one store/meta pair
//! per collection.

use super::memory::{MemoryMeta, MemoryStore};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Store and metadata of one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    #[serde(default)]
    pub store: MemoryStore,
    #[serde(default)]
    pub meta: MemoryMeta,
}

/// Everything persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionSnapshot>,
}

/// Loads and saves a [`Snapshot`]
#[derive(Debug)]
pub struct SnapshotManager {
    /// Path to the snapshot file
    path: PathBuf,
    /// Current snapshot
    snapshot: Snapshot,
}

impl SnapshotManager {
    /// Create a manager for `path`, starting empty
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            snapshot: Snapshot::default(),
        }
    }

    /// Create an in-memory manager (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            snapshot: Snapshot::default(),
        }
    }

    /// Create a manager from a file, loading existing content if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                Error::snapshot(format!("Failed to read snapshot file: {e}"))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                Error::snapshot(format!("Failed to parse snapshot file: {e}"))
            })?
        } else {
            Snapshot::default()
        };

        Ok(Self { path, snapshot })
    }

    /// Save the snapshot; a no-op in memory mode
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = serde_json::to_string_pretty(&self.snapshot)
            .map_err(|e| Error::snapshot(format!("Failed to serialize snapshot: {e}")))?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::snapshot(format!("Failed to write snapshot file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::snapshot(format!("Failed to rename snapshot file: {e}")))?;

        Ok(())
    }

    /// Snapshot of one collection, if any
    pub fn collection(&self, name: &str) -> Option<&CollectionSnapshot> {
        self.snapshot.collections.get(name)
    }

    /// Mutable snapshot of one collection, creating it if needed
    pub fn collection_mut(&mut self, name: &str) -> &mut CollectionSnapshot {
        self.snapshot
            .collections
            .entry(name.to_string())
            .or_default()
    }

    /// The whole snapshot
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Get the snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}
