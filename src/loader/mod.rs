//! Loader module
//!
//! Syncs a Strapi collection into a host-owned store.
//!
//! # Overview
//!
//! The loader module provides:
//! - `Loader` - The host-facing contract (`name`, `load`, `schema`)
//! - `StrapiLoader` - Paged collection sync with a cache window and pruning
//! - `LoaderContext` - Store, meta, logger, and hooks borrowed for one call
//! - `SyncOutcome` / `SyncReport` - Per-item results folded into a pass summary

mod strapi;
mod types;

pub use strapi::StrapiLoader;
pub use types::{
    BatchOutcome, Clock, FixedClock, ItemFailure, ItemResult, LoaderContext, SyncOutcome,
    SyncReport, SystemClock, LAST_SYNCED_KEY,
};

use crate::error::Result;
use crate::schema::InferredSchema;
use async_trait::async_trait;

/// A content source the host can sync and describe
#[async_trait]
pub trait Loader: Send + Sync {
    /// Collection name the host registers this loader under
    fn name(&self) -> &str;

    /// Run one sync pass unless the last one is still fresh
    async fn load(&self, ctx: &mut LoaderContext<'_>) -> Result<SyncOutcome>;

    /// Schema for the collection's items
    async fn schema(&self) -> Result<InferredSchema>;
}

#[cfg(test)]
mod tests;
