//! Pagination module
//!
//! # Overview
//!
//! Reads Strapi's page-based pagination envelope and decides, page by page,
//! whether a sync pass continues.

mod types;

pub use types::{pagination_info, NextPage, PageCursor, PaginationInfo};
