//! Store module
//!
//! The host side of the loader contract: where synced items and sync
//! metadata live.
//!
//! # Overview
//!
//! The store module provides:
//! - `DataStore`, `MetaStore`, `LoaderLogger`, `DataParser`, `DigestGenerator` - host traits
//! - `MemoryStore`, `MemoryMeta`, `TracingLogger`, `Sha256Digest` - default implementations
//! - `SnapshotManager` - JSON file persistence for stand-alone use

mod digest;
mod memory;
mod snapshot;
mod types;

pub use digest::Sha256Digest;
pub use memory::{MemoryMeta, MemoryStore, TracingLogger};
pub use snapshot::{CollectionSnapshot, Snapshot, SnapshotManager};
pub use types::{DataEntry, DataParser, DataStore, DigestGenerator, LoaderLogger, MetaStore};
