//! CLI module
//!
//! Command-line interface for syncing collections.
//!
//! # Commands
//!
//! - `sync` - Sync collections into a snapshot file
//! - `schema` - Print a collection's schema as JSON Schema
//! - `validate` - Check the project configuration

mod commands;
mod runner;

pub use commands::{Cli, CollectionArgs, Commands, OutputFormat};
pub use runner::{ad_hoc_options, Runner};
