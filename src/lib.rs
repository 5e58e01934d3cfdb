// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # strapi-loader
//!
//! Syncs Strapi collections into a host-owned content store.
//!
//! ## Features
//!
//! - **Paged Sync**: Walks a collection page by page, flushing each page into the store
//! - **Cache Window**: Skips a pass when the last one is recent enough
//! - **Change Detection**: Digests every item so unchanged entries are left alone
//! - **Per-Item Results**: Fail fast or collect item failures into a report
//! - **Schemas**: Declared, introspected, or inferred from a sample with confidence notes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strapi_loader::{Loader, LoaderContext, LoaderOptions, MemoryMeta, MemoryStore, StrapiLoader, TracingLogger};
//!
//! #[tokio::main]
//! async fn main() -> strapi_loader::Result<()> {
//!     let loader = StrapiLoader::new(
//!         LoaderOptions::new("article").with_base_url("http://localhost:1337"),
//!     )?;
//!
//!     let mut store = MemoryStore::new();
//!     let mut meta = MemoryMeta::new();
//!     let logger = TracingLogger::new("article");
//!
//!     let mut ctx = LoaderContext::new(&mut store, &mut meta, &logger);
//!     let outcome = loader.load(&mut ctx).await?;
//!     println!("{outcome:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Loader Interface                         │
//! │   name() → &str    load(ctx) → SyncOutcome    schema() → Schema │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────┬───┴─────────┬─────────────┬─────────┐
//! │   HTTP     │  Paginate   │   Schema    │   Store     │  CLI    │
//! ├────────────┼─────────────┼─────────────┼─────────────┼─────────┤
//! │ GET/JSON   │ page/count  │ Inference   │ Data/Meta   │ sync    │
//! │ Bearer     │ Monotonic   │ Attributes  │ Digest      │ schema  │
//! │ qs params  │ Strict      │ Validation  │ Snapshot    │ validate│
//! └────────────┴─────────────┴─────────────┴─────────────┴─────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Loader options and project configuration
pub mod config;

/// HTTP client and Strapi endpoints
pub mod http;

/// Page-based pagination
pub mod pagination;

/// Schema inference, conversion, and validation
pub mod schema;

/// Host stores, metadata, and snapshots
pub mod store;

/// Collection loaders
pub mod loader;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{LoaderOptions, ProjectConfig, SchemaSource};
pub use loader::{Loader, LoaderContext, StrapiLoader, SyncOutcome, SyncReport};
pub use schema::{infer_schema, InferredSchema, Schema};
pub use store::{MemoryMeta, MemoryStore, Sha256Digest, TracingLogger};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
