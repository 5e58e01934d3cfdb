//! Pagination types
//!
//! Strapi reports page-based pagination as
//! `meta.pagination = { page, pageCount, pageSize, total }`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a response sits in the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    /// `meta.pagination.page`
    pub current_page: Option<u32>,
    /// `meta.pagination.pageCount`
    pub total_pages: Option<u32>,
}

impl PaginationInfo {
    /// Both counters present
    pub fn is_complete(&self) -> bool {
        self.current_page.is_some() && self.total_pages.is_some()
    }
}

/// Extract the pagination descriptor from a response envelope.
///
/// Missing or non-numeric counters come back as `None`.
pub fn pagination_info(response: &Value) -> PaginationInfo {
    let pagination = response.get("meta").and_then(|m| m.get("pagination"));
    let counter = |key: &str| {
        pagination
            .and_then(|p| p.get(key))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };
    PaginationInfo {
        current_page: counter("page"),
        total_pages: counter("pageCount"),
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Request this page next
    Continue(u32),
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Tracks one pass through a paginated collection.
///
/// A page without both counters is an error rather than a silent stop, so a
/// malformed response can never look like a short collection.
#[derive(Debug, Clone)]
pub struct PageCursor {
    /// Page to request next (1-based)
    page: u32,
    /// Last page number the server reported
    last_reported: Option<u32>,
    /// Pages fetched so far
    pages_fetched: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    /// Start at page 1
    pub fn new() -> Self {
        Self {
            page: 1,
            last_reported: None,
            pages_fetched: 0,
        }
    }

    /// Page to request next
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Record a fetched page and decide whether to continue
    pub fn advance(&mut self, info: PaginationInfo, endpoint: &str) -> Result<NextPage> {
        self.pages_fetched += 1;

        let (Some(current), Some(total)) = (info.current_page, info.total_pages) else {
            return Err(Error::MissingPagination {
                endpoint: endpoint.to_string(),
                page: self.page,
            });
        };

        if let Some(previous) = self.last_reported {
            if current < previous {
                return Err(Error::shape(
                    endpoint,
                    format!("page counter went backwards from {previous} to {current}"),
                ));
            }
        }
        self.last_reported = Some(current);

        // The requested page also counts so a server that clamps `page` cannot loop forever
        if current >= total || self.page >= total {
            return Ok(NextPage::Done);
        }

        self.page += 1;
        Ok(NextPage::Continue(self.page))
    }
}
