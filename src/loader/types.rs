//! Loader types
//!
//! The per-call host context, the clock seam, and sync results.

use crate::store::{DataParser, DataStore, DigestGenerator, LoaderLogger, MetaStore, Sha256Digest};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Meta key holding the millisecond timestamp of the last complete pass
pub const LAST_SYNCED_KEY: &str = "lastSynced";

// ============================================================================
// Clock
// ============================================================================

/// Source of "now" in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

static SYSTEM_CLOCK: SystemClock = SystemClock;
static DEFAULT_DIGEST: Sha256Digest = Sha256Digest;

// ============================================================================
// Loader Context
// ============================================================================

/// Everything a loader borrows from its host for one `load` call.
///
/// The store and meta are borrowed mutably, so two passes over the same
/// store cannot overlap.
pub struct LoaderContext<'a> {
    pub store: &'a mut dyn DataStore,
    pub meta: &'a mut dyn MetaStore,
    pub logger: &'a dyn LoaderLogger,
    /// Optional per-item parse/validation hook
    pub parse_data: Option<&'a dyn DataParser>,
    pub digest: &'a dyn DigestGenerator,
    pub clock: &'a dyn Clock,
}

impl<'a> LoaderContext<'a> {
    /// Context with SHA-256 digests, the wall clock, and no parser
    pub fn new(
        store: &'a mut dyn DataStore,
        meta: &'a mut dyn MetaStore,
        logger: &'a dyn LoaderLogger,
    ) -> Self {
        Self {
            store,
            meta,
            logger,
            parse_data: None,
            digest: &DEFAULT_DIGEST,
            clock: &SYSTEM_CLOCK,
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: &'a dyn DataParser) -> Self {
        self.parse_data = Some(parser);
        self
    }

    #[must_use]
    pub fn with_digest(mut self, digest: &'a dyn DigestGenerator) -> Self {
        self.digest = digest;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }
}

// ============================================================================
// Results
// ============================================================================

/// What happened to one item of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult {
    /// Written to the store
    Stored { id: String },
    /// Digest matched the stored entry
    Unchanged { id: String },
    /// Rejected; nothing written
    Failed(ItemFailure),
}

impl ItemResult {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Stored { id } | Self::Unchanged { id } => Some(id),
            Self::Failed(failure) => failure.id.as_deref(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A rejected item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Page the item arrived on
    pub page: u32,
    /// Position within that page
    pub index: usize,
    /// Item id, if one could be read
    pub id: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "page {} item {} (id {}): {}", self.page, self.index, id, self.message),
            None => write!(f, "page {} item {}: {}", self.page, self.index, self.message),
        }
    }
}

/// Item results for one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub page: u32,
    pub results: Vec<ItemResult>,
}

impl BatchOutcome {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            results: Vec::new(),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemFailure> {
        self.results.iter().filter_map(|r| match r {
            ItemResult::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    /// No item on the page failed
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Summary of one complete pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub content_type: String,
    /// Pages requested
    pub pages: u32,
    /// Items written (new or changed)
    pub stored: usize,
    /// Items whose digest matched
    pub unchanged: usize,
    /// Entries removed because the CMS no longer returned them
    pub pruned: usize,
    pub failures: Vec<ItemFailure>,
    /// Value written to `lastSynced`
    pub synced_at: i64,
}

impl SyncReport {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            ..Default::default()
        }
    }

    /// Fold one item result into the totals
    pub fn record(&mut self, result: ItemResult) {
        match result {
            ItemResult::Stored { .. } => self.stored += 1,
            ItemResult::Unchanged { .. } => self.unchanged += 1,
            ItemResult::Failed(failure) => self.failures.push(failure),
        }
    }

    /// Items seen across all pages
    pub fn total_items(&self) -> usize {
        self.stored + self.unchanged + self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Result of a `load` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The last pass is younger than the cache duration; nothing was touched
    Skipped { last_synced: i64 },
    /// A full pass ran
    Synced(SyncReport),
}

impl SyncOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Synced(report) => Some(report),
            Self::Skipped { .. } => None,
        }
    }
}
