//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strapi content loader CLI
#[derive(Parser, Debug)]
#[command(name = "strapi-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options naming a single collection without a config file
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CollectionArgs {
    /// Content type to sync (singular API id); overrides --config
    #[arg(long)]
    pub content_type: Option<String>,

    /// Plural API id (defaults to `{content-type}s`)
    #[arg(long)]
    pub plural: Option<String>,

    /// Strapi server origin (falls back to STRAPI_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Items per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Extra query params as a JSON object
    #[arg(long)]
    pub params: Option<String>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync collections into a snapshot file
    Sync {
        #[command(flatten)]
        target: CollectionArgs,

        /// Only sync this collection from the config file
        #[arg(long)]
        collection: Option<String>,

        /// Snapshot file holding stores and metadata
        #[arg(short, long)]
        store: PathBuf,

        /// Validate each item against the collection's schema,
        /// inferred from a sample when none is configured
        #[arg(long)]
        validate: bool,

        /// Record failing items and keep going instead of aborting
        #[arg(long)]
        collect_failures: bool,

        /// Ignore the cache window and sync anyway
        #[arg(long)]
        force: bool,
    },

    /// Print a collection's schema as JSON Schema
    Schema {
        #[command(flatten)]
        target: CollectionArgs,

        /// Collection from the config file
        #[arg(long)]
        collection: Option<String>,

        /// Use the content-type builder instead of sampling an item
        #[arg(long)]
        introspect: bool,
    },

    /// Validate the project configuration
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Indented JSON
    Pretty,
}
