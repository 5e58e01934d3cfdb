//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: project config → paged Strapi requests → snapshot file

use clap::Parser;
use serde_json::{json, Value};
use std::path::Path;
use strapi_loader::cli::{Cli, Runner};
use strapi_loader::loader::{FixedClock, LAST_SYNCED_KEY};
use strapi_loader::schema::{Confidence, SchemaValidator};
use strapi_loader::store::{DataStore, MetaStore, SnapshotManager};
use strapi_loader::{
    Error, ItemFailurePolicy, Loader, LoaderContext, LoaderOptions, MemoryMeta, MemoryStore,
    SchemaSource, StrapiLoader, TracingLogger,
};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(items: Value, page: u32, page_count: u32) -> Value {
    json!({
        "data": items,
        "meta": {"pagination": {"page": page, "pageCount": page_count, "pageSize": 25, "total": 0}}
    })
}

async fn mount_page(server: &MockServer, route: &str, number: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("pagination[page]", number.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let config_path = dir.path().join("loader.yaml");
    std::fs::write(&config_path, contents).unwrap();
    config_path
}

async fn run(args: &[&str]) -> strapi_loader::Result<()> {
    let cli = Cli::parse_from(std::iter::once("strapi-loader").chain(args.iter().copied()));
    Runner::new(cli).run().await
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// CLI Sync Tests
// ============================================================================

#[tokio::test]
async fn test_sync_project_into_snapshot() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/api/articles",
        1,
        page(json!([{"id": 1, "title": "Hello"}, {"id": 2, "title": "World"}]), 1, 2),
    )
    .await;
    mount_page(
        &server,
        "/api/articles",
        2,
        page(json!([{"id": 3, "title": "Again"}]), 2, 2),
    )
    .await;
    mount_page(
        &server,
        "/api/categories",
        1,
        page(json!([{"id": "news", "name": "News"}]), 1, 1),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &format!(
            r"
baseUrl: {}
collections:
  - contentType: article
    pageSize: 2
  - contentType: category
    pluralContentType: categories
",
            server.uri()
        ),
    );
    let snapshot_path = dir.path().join("snapshot.json");

    run(&["-C", arg(&config), "sync", "--store", arg(&snapshot_path)])
        .await
        .unwrap();

    let snapshot = SnapshotManager::from_file(&snapshot_path).unwrap();
    let articles = snapshot.collection("article").unwrap();
    assert_eq!(articles.store.keys(), vec!["1", "2", "3"]);
    assert_eq!(articles.store.get("3").unwrap().data["title"], "Again");
    assert!(articles.meta.has(LAST_SYNCED_KEY));

    let categories = snapshot.collection("category").unwrap();
    assert_eq!(categories.store.keys(), vec!["news"]);
}

#[tokio::test]
async fn test_cache_window_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{"id": 1}]), 1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &format!(
            r"
baseUrl: {}
collections:
  - contentType: article
    cacheDurationInMs: 3600000
",
            server.uri()
        ),
    );
    let snapshot_path = dir.path().join("snapshot.json");
    let args = ["-C", arg(&config), "sync", "--store", arg(&snapshot_path)];

    run(&args).await.unwrap();
    let first = SnapshotManager::from_file(&snapshot_path).unwrap();
    let synced_at = first
        .collection("article")
        .unwrap()
        .meta
        .get(LAST_SYNCED_KEY)
        .unwrap();

    // Second run is inside the cache window and must not hit the server
    run(&args).await.unwrap();
    let second = SnapshotManager::from_file(&snapshot_path).unwrap();
    assert_eq!(
        second.collection("article").unwrap().meta.get(LAST_SYNCED_KEY),
        Some(synced_at)
    );
}

#[tokio::test]
async fn test_failed_sync_keeps_partial_snapshot() {
    let server = MockServer::start().await;
    mount_page(&server, "/api/articles", 1, page(json!([{"id": 1}]), 1, 2)).await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("pagination[page]", "2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("snapshot.json");
    let uri = server.uri();

    let err = run(&[
        "sync",
        "--content-type",
        "article",
        "--base-url",
        uri.as_str(),
        "--page-size",
        "1",
        "--store",
        arg(&snapshot_path),
    ])
    .await
    .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));

    let snapshot = SnapshotManager::from_file(&snapshot_path).unwrap();
    let articles = snapshot.collection("article").unwrap();
    assert!(articles.store.has("1"));
    assert!(!articles.meta.has(LAST_SYNCED_KEY));
}

#[tokio::test]
async fn test_sync_validate_infers_missing_schema() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("pagination[pageSize]", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(json!([{"id": 1, "title": "Hello"}]), 1, 2)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("pagination[pageSize]", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"id": 1, "title": "Hello"}, {"id": 2, "title": "World"}]),
            1,
            1,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("snapshot.json");
    let uri = server.uri();

    run(&[
        "sync",
        "--content-type",
        "article",
        "--base-url",
        uri.as_str(),
        "--store",
        arg(&snapshot_path),
        "--validate",
    ])
    .await
    .unwrap();

    let snapshot = SnapshotManager::from_file(&snapshot_path).unwrap();
    let articles = snapshot.collection("article").unwrap();
    assert_eq!(articles.store.keys(), vec!["1", "2"]);
    assert!(articles.meta.has(LAST_SYNCED_KEY));
}

#[tokio::test]
async fn test_validate_command() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        r"
baseUrl: http://localhost:1337
collections:
  - contentType: article
    pageSize: 0
",
    );

    let err = run(&["-C", arg(&config), "validate"]).await.unwrap_err();
    assert!(err.to_string().contains("Collection 'article'"));
    assert!(err.to_string().contains("pageSize"));
}

// ============================================================================
// Library Flow Tests
// ============================================================================

#[tokio::test]
async fn test_token_and_params_reach_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cms/posts"))
        .and(header("Authorization", "Bearer t0ken"))
        .and(query_param("filters[published][$eq]", "true"))
        .and(query_param("pagination[page]", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{"id": 7}]), 1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let loader = StrapiLoader::new(
        LoaderOptions::new("post")
            .with_base_url(server.uri())
            .with_api_path("/cms")
            .with_api_token("t0ken")
            .with_params(json!({"filters": {"published": {"$eq": true}}})),
    )
    .unwrap();

    let mut store = MemoryStore::new();
    let mut meta = MemoryMeta::new();
    let logger = TracingLogger::new("post");
    let clock = FixedClock(1_000);
    let mut ctx = LoaderContext::new(&mut store, &mut meta, &logger).with_clock(&clock);

    let outcome = loader.load(&mut ctx).await.unwrap();
    assert_eq!(outcome.report().unwrap().stored, 1);
    assert_eq!(meta.get(LAST_SYNCED_KEY), Some("1000".to_string()));
    assert!(store.has("7"));
}

#[tokio::test]
async fn test_inferred_schema_gates_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .and(query_param("pagination[pageSize]", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{
                "id": 1,
                "slug": "home",
                "publishedAt": "2024-01-01T00:00:00.000Z",
                "blocks": [
                    {"__component": "shared.hero", "heading": "Hi"},
                    {"__component": "shared.quote", "body": "...", "author": "A"}
                ]
            }]),
            1,
            2,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .and(query_param("pagination[pageSize]", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([
                {
                    "id": 1,
                    "slug": "home",
                    "publishedAt": "2024-01-01T00:00:00.000Z",
                    "blocks": [{"__component": "shared.hero", "heading": "Hi"}]
                },
                {
                    "id": 2,
                    "slug": "about",
                    "publishedAt": "not a date",
                    "blocks": []
                },
                {
                    "id": 3,
                    "slug": "contact",
                    "publishedAt": "2024-02-01T00:00:00.000Z",
                    "blocks": [{"__component": "shared.unknown"}]
                }
            ]),
            1,
            1,
        )))
        .mount(&server)
        .await;

    let loader = StrapiLoader::new(
        LoaderOptions::new("page")
            .with_base_url(server.uri())
            .with_schema(SchemaSource::InferFromSample)
            .with_item_failure_policy(ItemFailurePolicy::Collect),
    )
    .unwrap();

    let inferred = loader.schema().await.unwrap();
    assert_eq!(inferred.confidence, Confidence::Structural);
    let document = inferred.schema.to_json_schema_document("page");
    assert_eq!(document["properties"]["blocks"]["items"]["oneOf"].as_array().unwrap().len(), 2);

    let validator = SchemaValidator::new(inferred.schema);
    let mut store = MemoryStore::new();
    let mut meta = MemoryMeta::new();
    let logger = TracingLogger::new("page");
    let mut ctx = LoaderContext::new(&mut store, &mut meta, &logger).with_parser(&validator);

    let outcome = loader.load(&mut ctx).await.unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.stored, 1);
    let failed: Vec<_> = report
        .failures
        .iter()
        .filter_map(|f| f.id.as_deref())
        .collect();
    assert_eq!(failed, vec!["2", "3"]);
    assert!(store.has("1"));
    assert!(!store.has("2"));
}
