//! Tests for the loader module

use super::*;
use crate::config::{LoaderOptions, SchemaSource};
use crate::error::Error;
use crate::schema::{Confidence, Schema, SchemaValidator};
use crate::store::{
    DataEntry, DataParser, DataStore, DigestGenerator, LoaderLogger, MemoryMeta, MemoryStore,
    MetaStore, Sha256Digest,
};
use crate::types::ItemFailurePolicy;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOW: i64 = 1_700_000_000_000;

// ============================================================================
// Test Doubles
// ============================================================================

#[derive(Default)]
struct RecordingLogger {
    lines: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingLogger {
    fn push(&self, level: &'static str, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }

    fn contains(&self, level: &str, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl LoaderLogger for RecordingLogger {
    fn debug(&self, message: &str) {
        self.push("debug", message);
    }
    fn info(&self, message: &str) {
        self.push("info", message);
    }
    fn warn(&self, message: &str) {
        self.push("warn", message);
    }
    fn error(&self, message: &str) {
        self.push("error", message);
    }
}

#[derive(Default)]
struct SpyParser {
    calls: AtomicUsize,
}

impl DataParser for SpyParser {
    fn parse(&self, _id: &str, data: Value) -> crate::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(data)
    }
}

#[derive(Default)]
struct SpyDigest {
    calls: AtomicUsize,
}

impl DigestGenerator for SpyDigest {
    fn digest(&self, data: &Value) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Sha256Digest.digest(data)
    }
}

struct Host {
    store: MemoryStore,
    meta: MemoryMeta,
    logger: RecordingLogger,
}

impl Host {
    fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            meta: MemoryMeta::new(),
            logger: RecordingLogger::default(),
        }
    }

    async fn load(&mut self, loader: &StrapiLoader) -> crate::Result<SyncOutcome> {
        let clock = FixedClock(NOW);
        let mut ctx = LoaderContext::new(&mut self.store, &mut self.meta, &self.logger)
            .with_clock(&clock);
        loader.load(&mut ctx).await
    }

    async fn load_with(
        &mut self,
        loader: &StrapiLoader,
        parser: &dyn DataParser,
        digest: &dyn DigestGenerator,
    ) -> crate::Result<SyncOutcome> {
        let clock = FixedClock(NOW);
        let mut ctx = LoaderContext::new(&mut self.store, &mut self.meta, &self.logger)
            .with_parser(parser)
            .with_digest(digest)
            .with_clock(&clock);
        loader.load(&mut ctx).await
    }
}

fn page_body(items: Value, page: u32, page_count: u32) -> Value {
    json!({
        "data": items,
        "meta": {"pagination": {"page": page, "pageCount": page_count, "pageSize": 25, "total": 0}}
    })
}

fn loader(server: &MockServer, options: LoaderOptions) -> StrapiLoader {
    StrapiLoader::new(options.with_base_url(server.uri())).unwrap()
}

async fn mount_single_page(server: &MockServer, items: Value) {
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(items, 1, 1)))
        .mount(server)
        .await;
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_name_is_content_type() {
    let loader = StrapiLoader::new(
        LoaderOptions::new("article").with_base_url("http://localhost:1337"),
    )
    .unwrap();
    assert_eq!(loader.name(), "article");
    assert_eq!(
        loader.client().api_root().as_str(),
        "http://localhost:1337/api/"
    );
}

#[test]
fn test_new_rejects_invalid_options() {
    let err = StrapiLoader::new(
        LoaderOptions::new("article")
            .with_base_url("http://localhost:1337")
            .with_page_size(0),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));

    let err = StrapiLoader::new(LoaderOptions::new(" ").with_base_url("http://localhost:1337"))
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));
}

// ============================================================================
// Cache Window Tests
// ============================================================================

#[tokio::test]
async fn test_recent_sync_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(json!([]), 1, 0)))
        .expect(0)
        .mount(&server)
        .await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_cache_duration(Duration::from_secs(30)),
    );
    let mut host = Host::new();
    let last = (NOW - 10_000).to_string();
    host.meta.set(LAST_SYNCED_KEY, last.clone());

    let outcome = host.load(&loader).await.unwrap();

    assert_eq!(outcome, SyncOutcome::Skipped { last_synced: NOW - 10_000 });
    assert!(host.store.is_empty());
    assert_eq!(host.meta.get(LAST_SYNCED_KEY), Some(last));
    assert!(host.logger.contains("info", "Skipping article sync"));
}

#[tokio::test]
async fn test_stale_sync_fetches_everything() {
    let server = MockServer::start().await;
    mount_single_page(&server, json!([{"id": 1, "title": "One"}, {"id": "abc", "title": "Two"}]))
        .await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_cache_duration(Duration::from_secs(10)),
    );
    let mut host = Host::new();
    host.meta.set(LAST_SYNCED_KEY, (NOW - 30_000).to_string());

    let outcome = host.load(&loader).await.unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.stored, 2);
    assert_eq!(report.pages, 1);
    assert_eq!(host.store.keys(), vec!["1".to_string(), "abc".to_string()]);
    assert_eq!(host.store.get("1").unwrap().data["title"], "One");
    assert_eq!(host.meta.get(LAST_SYNCED_KEY), Some(NOW.to_string()));
}

#[tokio::test]
async fn test_unparseable_last_synced_is_ignored() {
    let server = MockServer::start().await;
    mount_single_page(&server, json!([{"id": 1}])).await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_cache_duration(Duration::from_secs(3600)),
    );
    let mut host = Host::new();
    host.meta.set(LAST_SYNCED_KEY, "yesterday".to_string());

    let outcome = host.load(&loader).await.unwrap();
    assert!(!outcome.is_skipped());
    assert!(host.logger.contains("warn", "unparseable lastSynced"));
}

#[test_case(0 ; "no cache window")]
#[test_case(3_600_000 ; "hour cache window")]
#[tokio::test]
async fn test_future_last_synced_syncs(cache_ms: u64) {
    let server = MockServer::start().await;
    mount_single_page(&server, json!([{"id": 1}])).await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_cache_duration(Duration::from_millis(cache_ms)),
    );
    let mut host = Host::new();
    host.meta.set(LAST_SYNCED_KEY, (NOW + 5_000).to_string());

    let outcome = host.load(&loader).await.unwrap();

    assert!(!outcome.is_skipped());
    assert!(host.store.has("1"));
    assert_eq!(host.meta.get(LAST_SYNCED_KEY), Some(NOW.to_string()));
    assert!(host.logger.contains("warn", "5000ms in the future"));
}

// ============================================================================
// Paging Tests
// ============================================================================

#[tokio::test]
async fn test_two_pages_two_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("pagination[page]", "1"))
        .and(query_param("pagination[pageSize]", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(json!([{"id": 1}]), 1, 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("pagination[page]", "2"))
        .and(query_param("pagination[pageSize]", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(json!([{"id": 2}]), 2, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader(&server, LoaderOptions::new("article").with_page_size(1));
    let mut host = Host::new();

    let outcome = host.load(&loader).await.unwrap();

    assert_eq!(outcome.report().unwrap().pages, 2);
    assert!(host.store.has("1"));
    assert!(host.store.has("2"));
    assert_eq!(host.store.len(), 2);
}

#[tokio::test]
async fn test_user_params_merged_without_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("locale", "en"))
        .and(query_param("populate[0]", "cover"))
        .and(query_param("pagination[pageSize]", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(json!([{"id": 1}]), 1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_params(json!({
            "locale": "en",
            "populate": ["cover"],
            "pagination": {"pageSize": 100}
        })),
    );
    let mut host = Host::new();
    host.load(&loader).await.unwrap();
    assert_eq!(host.store.len(), 1);
}

#[tokio::test]
async fn test_empty_source_calls_no_hooks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(json!([]), 1, 0)))
        .mount(&server)
        .await;

    let loader = loader(&server, LoaderOptions::new("article"));
    let parser = SpyParser::default();
    let digest = SpyDigest::default();
    let mut host = Host::new();

    let outcome = host.load_with(&loader, &parser, &digest).await.unwrap();

    assert_eq!(outcome.report().unwrap().total_items(), 0);
    assert!(host.store.is_empty());
    assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    assert_eq!(digest.calls.load(Ordering::SeqCst), 0);
    assert_eq!(host.meta.get(LAST_SYNCED_KEY), Some(NOW.to_string()));
}

#[tokio::test]
async fn test_hooks_run_once_per_item() {
    let server = MockServer::start().await;
    mount_single_page(&server, json!([{"id": 1}, {"id": 2}, {"id": 3}])).await;

    let loader = loader(&server, LoaderOptions::new("article"));
    let parser = SpyParser::default();
    let digest = SpyDigest::default();
    let mut host = Host::new();

    host.load_with(&loader, &parser, &digest).await.unwrap();

    assert_eq!(parser.calls.load(Ordering::SeqCst), 3);
    assert_eq!(digest.calls.load(Ordering::SeqCst), 3);
    assert!(host.store.get("2").unwrap().digest.is_some());
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_server_error_keeps_last_synced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let loader = loader(&server, LoaderOptions::new("article"));
    let mut host = Host::new();
    host.meta.set(LAST_SYNCED_KEY, "5".to_string());

    let err = host.load(&loader).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert_eq!(host.meta.get(LAST_SYNCED_KEY), Some("5".to_string()));
    assert!(host.logger.contains("error", "Error loading article (page 1)"));
}

#[tokio::test]
async fn test_malformed_body_keeps_last_synced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let loader = loader(&server, LoaderOptions::new("article"));
    let mut host = Host::new();

    let err = host.load(&loader).await.unwrap_err();

    assert!(matches!(err, Error::ResponseShape { .. }));
    assert!(!host.meta.has(LAST_SYNCED_KEY));
}

#[tokio::test]
async fn test_missing_pagination_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1}]})))
        .mount(&server)
        .await;

    let loader = loader(&server, LoaderOptions::new("article"));
    let mut host = Host::new();

    let err = host.load(&loader).await.unwrap_err();

    assert!(matches!(err, Error::MissingPagination { page: 1, .. }));
    assert!(host.store.is_empty());
    assert!(!host.meta.has(LAST_SYNCED_KEY));
}

fn title_schema() -> Schema {
    Schema::object([("title", Schema::string())])
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_bad_item() {
    let server = MockServer::start().await;
    mount_single_page(
        &server,
        json!([{"id": 1, "title": "ok"}, {"id": 2, "title": 5}, {"id": 3, "title": "late"}]),
    )
    .await;

    let loader = loader(&server, LoaderOptions::new("article"));
    let validator = SchemaValidator::new(title_schema());
    let mut host = Host::new();

    let err = host
        .load_with(&loader, &validator, &Sha256Digest)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation { ref id, .. } if id == "2"));
    // Writes made before the failure stay
    assert!(host.store.has("1"));
    assert!(!host.store.has("3"));
    assert!(!host.meta.has(LAST_SYNCED_KEY));
}

#[tokio::test]
async fn test_collect_policy_records_failures() {
    let server = MockServer::start().await;
    mount_single_page(
        &server,
        json!([
            {"id": 1, "title": "ok"},
            {"id": 2, "title": 5},
            {"title": "no id"},
            {"id": true},
            {"id": 5, "title": "also ok"}
        ]),
    )
    .await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_item_failure_policy(ItemFailurePolicy::Collect),
    );
    let validator = SchemaValidator::new(title_schema());
    let mut host = Host::new();

    let outcome = host
        .load_with(&loader, &validator, &Sha256Digest)
        .await
        .unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.stored, 2);
    assert_eq!(report.failures.len(), 3);
    assert_eq!(report.failures[0].id.as_deref(), Some("2"));
    assert!(report.failures[0].message.contains("title"));
    assert_eq!(report.failures[1].index, 2);
    assert!(report.failures[1].id.is_none());
    assert!(report.has_failures());
    assert_eq!(host.store.keys(), vec!["1".to_string(), "5".to_string()]);
    assert_eq!(host.meta.get(LAST_SYNCED_KEY), Some(NOW.to_string()));
}

// ============================================================================
// Store Reconciliation Tests
// ============================================================================

#[tokio::test]
async fn test_entries_missing_from_source_are_pruned() {
    let server = MockServer::start().await;
    mount_single_page(&server, json!([{"id": 1}])).await;

    let loader = loader(&server, LoaderOptions::new("article"));
    let mut host = Host::new();
    host.store.set(DataEntry::new("old", json!({"id": "old"})));

    let outcome = host.load(&loader).await.unwrap();

    assert_eq!(outcome.report().unwrap().pruned, 1);
    assert!(!host.store.has("old"));
    assert!(host.store.has("1"));
}

#[tokio::test]
async fn test_second_pass_reports_unchanged() {
    let server = MockServer::start().await;
    mount_single_page(&server, json!([{"id": 1}, {"id": 2}])).await;

    let loader = loader(&server, LoaderOptions::new("article"));
    let mut host = Host::new();

    host.load(&loader).await.unwrap();
    let outcome = host.load(&loader).await.unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.stored, 0);
    assert_eq!(report.unchanged, 2);
    assert_eq!(report.pruned, 0);
}

// ============================================================================
// Schema Tests
// ============================================================================

#[tokio::test]
async fn test_schema_unavailable_by_default() {
    let server = MockServer::start().await;
    let loader = loader(&server, LoaderOptions::new("article"));
    let err = loader.schema().await.unwrap_err();
    assert!(matches!(err, Error::SchemaUnavailable { .. }));
}

#[tokio::test]
async fn test_schema_explicit_is_declared() {
    let server = MockServer::start().await;
    let loader = loader(
        &server,
        LoaderOptions::new("article").with_schema(SchemaSource::Explicit {
            schema: title_schema(),
        }),
    );
    let inferred = loader.schema().await.unwrap();
    assert_eq!(inferred.confidence, Confidence::Declared);
    assert_eq!(inferred.schema, title_schema());
}

#[tokio::test]
async fn test_schema_from_sample_fetches_one_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("pagination[pageSize]", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            json!([{"id": 1, "cover": "https://cdn.example.com/a.png", "tags": []}]),
            1,
            3,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_schema(SchemaSource::InferFromSample),
    );
    let inferred = loader.schema().await.unwrap();

    assert!(inferred.is_best_effort());
    assert_eq!(inferred.confidence, Confidence::Heuristic);
    assert!(inferred.schema.field("cover").is_some());
}

#[tokio::test]
async fn test_schema_from_sample_empty_collection() {
    let server = MockServer::start().await;
    mount_single_page(&server, json!([])).await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_schema(SchemaSource::InferFromSample),
    );
    let err = loader.schema().await.unwrap_err();
    assert!(matches!(err, Error::SchemaInference { .. }));
    assert!(err.to_string().contains("article collection is empty"));
}

#[tokio::test]
async fn test_schema_introspect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content-type-builder/content-types/api::article.article"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"schema": {"attributes": {
                "title": {"type": "string", "required": true}
            }}}
        })))
        .mount(&server)
        .await;

    let loader = loader(
        &server,
        LoaderOptions::new("article").with_schema(SchemaSource::Introspect),
    );
    let inferred = loader.schema().await.unwrap();

    assert_eq!(inferred.confidence, Confidence::Declared);
    assert_eq!(inferred.schema.field("title"), Some(&Schema::string()));
}
