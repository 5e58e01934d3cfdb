//! CLI runner - executes commands

use crate::cli::commands::{Cli, CollectionArgs, Commands, OutputFormat};
use crate::config::{LoaderOptions, ProjectConfig, SchemaSource};
use crate::error::{Error, Result, ResultExt};
use crate::loader::{Loader, LoaderContext, StrapiLoader, SyncOutcome, LAST_SYNCED_KEY};
use crate::schema::SchemaValidator;
use crate::store::{MetaStore, SnapshotManager, TracingLogger};
use crate::types::ItemFailurePolicy;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Sync {
                target,
                collection,
                store,
                validate,
                collect_failures,
                force,
            } => {
                let mut targets = self.resolve_targets(target, collection.as_deref())?;
                if *collect_failures {
                    for options in &mut targets {
                        options.on_item_failure = ItemFailurePolicy::Collect;
                    }
                }
                self.sync(targets, store, *validate, *force).await
            }
            Commands::Schema {
                target,
                collection,
                introspect,
            } => {
                let targets = self.resolve_targets(target, collection.as_deref())?;
                self.schema(targets, *introspect).await
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Load the project config named by `--config`
    fn load_project(&self) -> Result<ProjectConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("No collection given (use --content-type or --config)"))?;
        ProjectConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))
    }

    /// Collections selected by the command line
    fn resolve_targets(
        &self,
        args: &CollectionArgs,
        collection: Option<&str>,
    ) -> Result<Vec<LoaderOptions>> {
        if let Some(content_type) = &args.content_type {
            return Ok(vec![ad_hoc_options(content_type, args)?]);
        }

        let project = self.load_project()?;
        let targets = match collection {
            Some(name) => vec![project
                .collection(name)
                .ok_or_else(|| Error::config(format!("Collection '{name}' not found in config")))?],
            None => project.collection_options(),
        };

        if targets.is_empty() {
            return Err(Error::config("Config declares no collections"));
        }
        Ok(targets)
    }

    /// Sync each collection into the snapshot, saving after every one
    async fn sync(
        &self,
        targets: Vec<LoaderOptions>,
        store: &Path,
        validate: bool,
        force: bool,
    ) -> Result<()> {
        let mut snapshot = SnapshotManager::from_file(store)?;

        for mut options in targets {
            if validate && options.schema == SchemaSource::Unavailable {
                options.schema = SchemaSource::InferFromSample;
            }

            let loader = StrapiLoader::new(options)?;
            let name = loader.name().to_string();

            let validator = if validate {
                let inferred = loader.schema().await?;
                if inferred.is_best_effort() {
                    warn!(
                        "Validating {} against a best-effort schema ({:?})",
                        name, inferred.confidence
                    );
                }
                Some(SchemaValidator::new(inferred.schema))
            } else {
                None
            };

            let logger = TracingLogger::new(&name);
            let collection = snapshot.collection_mut(&name);
            if force {
                collection.meta.delete(LAST_SYNCED_KEY);
            }

            let mut ctx = LoaderContext::new(&mut collection.store, &mut collection.meta, &logger);
            if let Some(validator) = &validator {
                ctx = ctx.with_parser(validator);
            }
            let result = loader.load(&mut ctx).await;

            // Writes made before a failure are kept
            snapshot.save().await?;
            let outcome = result?;

            self.output_message(&sync_message(&name, &outcome));
        }

        info!("Snapshot written to {}", store.display());
        Ok(())
    }

    /// Print each collection's schema as a JSON Schema document
    async fn schema(&self, targets: Vec<LoaderOptions>, introspect: bool) -> Result<()> {
        for mut options in targets {
            if introspect {
                options.schema = SchemaSource::Introspect;
            } else if options.schema == SchemaSource::Unavailable {
                options.schema = SchemaSource::InferFromSample;
            }

            let loader = StrapiLoader::new(options)?;
            let inferred = loader.schema().await?;

            self.output_message(&json!({
                "type": "SCHEMA",
                "collection": loader.name(),
                "confidence": inferred.confidence,
                "notes": inferred.notes.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "schema": inferred.schema.to_json_schema_document(loader.name()),
            }));
        }
        Ok(())
    }

    /// Check the config file without contacting the server
    fn validate(&self) -> Result<()> {
        let project = self.load_project()?;
        let collections = project.collection_options();

        for options in &collections {
            options
                .validate()
                .with_context(|| format!("Collection '{}'", options.content_type))?;
        }

        self.output_message(&json!({
            "type": "VALIDATE",
            "status": "ok",
            "collections": collections
                .iter()
                .map(|c| json!({"contentType": c.content_type, "endpoint": c.plural()}))
                .collect::<Vec<_>>(),
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Options for a collection named entirely on the command line
pub fn ad_hoc_options(content_type: &str, args: &CollectionArgs) -> Result<LoaderOptions> {
    let mut options = LoaderOptions::new(content_type);
    if let Some(plural) = &args.plural {
        options = options.with_plural(plural);
    }
    if let Some(base_url) = &args.base_url {
        options = options.with_base_url(base_url);
    }
    if let Some(page_size) = args.page_size {
        options = options.with_page_size(page_size);
    }
    if let Some(params) = &args.params {
        let params: Value = serde_json::from_str(params).context("Invalid --params JSON")?;
        options = options.with_params(params);
    }
    options.validate()?;
    Ok(options)
}

fn sync_message(collection: &str, outcome: &SyncOutcome) -> Value {
    match outcome {
        SyncOutcome::Skipped { last_synced } => json!({
            "type": "SYNC",
            "collection": collection,
            "status": "skipped",
            "lastSynced": last_synced,
        }),
        SyncOutcome::Synced(report) => json!({
            "type": "SYNC",
            "collection": collection,
            "status": "synced",
            "report": report,
        }),
    }
}
