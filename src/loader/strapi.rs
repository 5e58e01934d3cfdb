//! Strapi collection loader

use super::types::{
    BatchOutcome, ItemFailure, ItemResult, LoaderContext, SyncOutcome, SyncReport, LAST_SYNCED_KEY,
};
use super::Loader;
use crate::config::{LoaderOptions, SchemaSource};
use crate::error::{Error, Result};
use crate::http::StrapiClient;
use crate::pagination::PageCursor;
use crate::schema::{infer_schema, schema_from_attributes, InferredSchema};
use crate::store::DataEntry;
use crate::types::{coerce_id, JsonObject, JsonValue};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Syncs one Strapi collection into a host store
#[derive(Debug)]
pub struct StrapiLoader {
    options: LoaderOptions,
    plural: String,
    params: JsonObject,
    client: StrapiClient,
}

impl StrapiLoader {
    /// Validate the options and build the client.
    ///
    /// Fails if no base URL is configured or set in the environment.
    pub fn new(options: LoaderOptions) -> Result<Self> {
        options.validate()?;
        let api_root = options.api_root()?;
        let client = StrapiClient::new(
            api_root,
            options.resolved_api_token(),
            options.timeout_ms.map(Duration::from_millis),
        )?;

        Ok(Self {
            plural: options.plural(),
            params: options.query_params(),
            options,
            client,
        })
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn client(&self) -> &StrapiClient {
        &self.client
    }

    fn content_type(&self) -> &str {
        &self.options.content_type
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.client.api_root(), self.plural)
    }

    /// `lastSynced` from meta; an unparseable value counts as absent
    fn last_synced(&self, ctx: &LoaderContext<'_>) -> Option<i64> {
        let raw = ctx.meta.get(LAST_SYNCED_KEY)?;
        match raw.trim().parse::<i64>() {
            Ok(millis) => Some(millis),
            Err(_) => {
                ctx.logger.warn(&format!(
                    "Ignoring unparseable {LAST_SYNCED_KEY} value {raw:?} for {}",
                    self.content_type()
                ));
                None
            }
        }
    }

    /// Walk every page, flushing each one into the store
    async fn sync_pass(
        &self,
        ctx: &mut LoaderContext<'_>,
        current_page: &mut u32,
    ) -> Result<SyncReport> {
        let endpoint = self.endpoint();
        let mut cursor = PageCursor::new();
        let mut report = SyncReport::new(self.content_type());
        let mut seen = HashSet::new();

        loop {
            let page = cursor.page();
            *current_page = page;
            let response = self
                .client
                .find_page(&self.plural, &self.params, page, self.options.page_size)
                .await?;

            // Check the envelope before touching the store
            let next = cursor.advance(response.pagination, &endpoint)?;

            let batch = self.store_page(ctx, page, response.items)?;
            ctx.logger.debug(&format!(
                "Stored page {page} of {}: {} items, {} failed",
                self.content_type(),
                batch.results.len(),
                batch.failures().count()
            ));

            for result in batch.results {
                if let Some(id) = result.id() {
                    seen.insert(id.to_string());
                }
                report.record(result);
            }

            if next.is_done() {
                break;
            }
        }

        report.pages = cursor.pages_fetched();
        report.pruned = prune_unseen(ctx, &seen);
        Ok(report)
    }

    /// Upsert one page; under fail-fast the first item error ends the pass
    fn store_page(
        &self,
        ctx: &mut LoaderContext<'_>,
        page: u32,
        items: Vec<JsonValue>,
    ) -> Result<BatchOutcome> {
        let mut batch = BatchOutcome::new(page);

        for (index, item) in items.into_iter().enumerate() {
            let id = item.get("id").and_then(coerce_id);
            match store_item(ctx, index, item) {
                Ok(result) => batch.results.push(result),
                Err(e) if e.is_item_error() && !self.options.on_item_failure.is_fatal() => {
                    ctx.logger.warn(&format!(
                        "Skipping {} item {} on page {page}: {e}",
                        self.content_type(),
                        id.as_deref().unwrap_or("<no id>")
                    ));
                    batch.results.push(ItemResult::Failed(ItemFailure {
                        page,
                        index,
                        id,
                        message: e.to_string(),
                    }));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(batch)
    }
}

/// Derive the id, parse, digest, and upsert a single item
fn store_item(ctx: &mut LoaderContext<'_>, index: usize, item: JsonValue) -> Result<ItemResult> {
    let raw_id = item.get("id").ok_or(Error::MissingId { index })?;
    let id = coerce_id(raw_id).ok_or_else(|| Error::InvalidId {
        found: raw_id.to_string(),
    })?;

    let data = match ctx.parse_data {
        Some(parser) => parser.parse(&id, item)?,
        None => item,
    };
    let digest = ctx.digest.digest(&data);

    let entry = DataEntry::new(id.clone(), data).with_digest(digest);
    if ctx.store.set(entry) {
        Ok(ItemResult::Stored { id })
    } else {
        Ok(ItemResult::Unchanged { id })
    }
}

/// Delete entries the pass did not return
fn prune_unseen(ctx: &mut LoaderContext<'_>, seen: &HashSet<String>) -> usize {
    let stale: Vec<String> = ctx
        .store
        .keys()
        .into_iter()
        .filter(|key| !seen.contains(key))
        .collect();
    for key in &stale {
        ctx.store.delete(key);
    }
    stale.len()
}

#[async_trait]
impl Loader for StrapiLoader {
    fn name(&self) -> &str {
        self.content_type()
    }

    async fn load(&self, ctx: &mut LoaderContext<'_>) -> Result<SyncOutcome> {
        let content_type = self.content_type();
        let now = ctx.clock.now_millis();

        if let Some(last_synced) = self.last_synced(ctx) {
            let cache_ms = i64::try_from(self.options.cache_duration_ms).unwrap_or(i64::MAX);
            let age = now.saturating_sub(last_synced);
            if age < 0 {
                ctx.logger.warn(&format!(
                    "{LAST_SYNCED_KEY} for {content_type} is {}ms in the future, syncing anyway",
                    -age
                ));
            } else if age < cache_ms {
                ctx.logger.info(&format!(
                    "Skipping {content_type} sync, last synced {age}ms ago"
                ));
                return Ok(SyncOutcome::Skipped { last_synced });
            }
        }

        ctx.logger.info(&format!("Loading {content_type} from Strapi"));
        debug!("Syncing {} from {}", content_type, self.endpoint());

        let mut page = 1;
        match self.sync_pass(ctx, &mut page).await {
            Ok(mut report) => {
                report.synced_at = now;
                ctx.meta.set(LAST_SYNCED_KEY, now.to_string());
                ctx.logger.info(&format!(
                    "Synced {} {content_type} items ({} stored, {} unchanged, {} pruned, {} failed) in {} pages",
                    report.total_items(),
                    report.stored,
                    report.unchanged,
                    report.pruned,
                    report.failures.len(),
                    report.pages
                ));
                Ok(SyncOutcome::Synced(report))
            }
            Err(e) => {
                ctx.logger.error(&format!(
                    "Error loading {content_type} (page {page}): {e}"
                ));
                Err(e)
            }
        }
    }

    async fn schema(&self) -> Result<InferredSchema> {
        let content_type = self.content_type();
        match &self.options.schema {
            SchemaSource::Unavailable => Err(Error::schema_unavailable(
                content_type,
                "no schema source configured; declare a schema or choose infer_from_sample or introspect",
            )),
            SchemaSource::Explicit { schema } => Ok(InferredSchema::declared(schema.clone())),
            SchemaSource::InferFromSample => {
                let page = self
                    .client
                    .find_page(&self.plural, &self.params, 1, 1)
                    .await?;
                let sample = page.items.first().ok_or_else(|| Error::SchemaInference {
                    message: format!("{content_type} collection is empty, no sample to infer from"),
                })?;
                let inferred = infer_schema(sample);
                for note in &inferred.notes {
                    debug!("{}: {}", content_type, note);
                }
                Ok(inferred)
            }
            SchemaSource::Introspect => {
                let attributes = self.client.attributes(content_type).await?;
                Ok(schema_from_attributes(&attributes))
            }
        }
    }
}
