// Tests for the in-memory graph provider

use anchorage_core::classify::follow_filter;
use anchorage_core::model::{Asset, AssetId, Relation, RelationKind};
use anchorage_core::provider::{GraphProvider, ProviderError};
use anchorage_core::report::Check;
use anchorage_core::{CheckConfig, MemoryGraph};
use std::io::Write;
use url::Url;

const SITE: &str = r#"{
    "assets": [
        { "url": "https://site.test/index.html", "kind": "html", "initial": true,
          "content_type": "text/html", "ids": ["top"] },
        { "url": "https://site.test/style.css", "kind": "css", "content_type": "text/css" },
        { "url": "https://site.test/about.html", "kind": "html",
          "content_type": "text/html", "ids": ["team"] },
        { "url": "https://site.test/index.html", "kind": "css", "inline": true, "parent": 0 }
    ],
    "relations": [
        { "from": 0, "kind": "stylesheet", "href": "style.css", "line": 4, "column": 9 },
        { "from": 0, "kind": "anchor", "href": "about.html#team" },
        { "from": 0, "kind": "image", "href": "missing.png", "line": 12, "column": 3 },
        { "from": 3, "kind": "css_url", "href": "bg.png" }
    ]
}"#;

fn config() -> CheckConfig {
    CheckConfig::new(Url::parse("https://site.test/").unwrap())
}

async fn populated(json: &str, config: &CheckConfig) -> MemoryGraph {
    let mut graph = MemoryGraph::from_json(json)
        .unwrap()
        .with_pretty_urls(config.pretty_urls);
    let follow = follow_filter(config);
    graph.populate(follow.as_ref(), 4).await.unwrap();
    graph
}

// ============================================================================
// Loading Tests
// ============================================================================

#[test]
fn test_relations_resolve_against_containing_document() {
    let graph = MemoryGraph::from_json(SITE).unwrap();
    let relations = graph.find_relations(&|rel: &Relation| rel.kind == RelationKind::CssUrl);

    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].to.as_str(), "https://site.test/bg.png");
    assert_eq!(relations[0].location.url, "https://site.test/index.html");
}

#[test]
fn test_relations_keep_declaration_order() {
    let graph = MemoryGraph::from_json(SITE).unwrap();
    let hrefs: Vec<String> = graph
        .find_relations(&|_: &Relation| true)
        .into_iter()
        .map(|rel| rel.href)
        .collect();
    assert_eq!(hrefs, vec!["style.css", "about.html#team", "missing.png", "bg.png"]);
}

#[test]
fn test_cross_origin_defaults_from_urls() {
    let json = r#"{
        "assets": [{ "url": "https://site.test/", "kind": "html" }],
        "relations": [
            { "from": 0, "kind": "anchor", "href": "https://elsewhere.test/" },
            { "from": 0, "kind": "anchor", "href": "/local" }
        ]
    }"#;
    let graph = MemoryGraph::from_json(json).unwrap();
    let relations = graph.find_relations(&|_: &Relation| true);
    assert!(relations[0].cross_origin);
    assert!(!relations[1].cross_origin);
}

#[test]
fn test_unknown_source_asset_is_malformed() {
    let json = r#"{
        "assets": [{ "url": "https://site.test/", "kind": "html" }],
        "relations": [{ "from": 7, "kind": "anchor", "href": "/x" }]
    }"#;
    assert!(matches!(
        MemoryGraph::from_json(json),
        Err(ProviderError::Malformed(_))
    ));
}

#[test]
fn test_inline_asset_needs_parent() {
    let json = r#"{ "assets": [{ "url": "https://site.test/", "kind": "css", "inline": true }] }"#;
    assert!(matches!(
        MemoryGraph::from_json(json),
        Err(ProviderError::Malformed(_))
    ));
}

#[test]
fn test_invalid_json_is_malformed() {
    assert!(matches!(
        MemoryGraph::from_json("{ not json"),
        Err(ProviderError::Malformed(_))
    ));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SITE.as_bytes()).unwrap();

    let graph = MemoryGraph::load(file.path()).unwrap();
    assert_eq!(graph.find_assets(&|_: &Asset| true).len(), 6);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let result = MemoryGraph::load(std::path::Path::new("/definitely/not/here.json"));
    assert!(matches!(result, Err(ProviderError::Io(_))));
}

// ============================================================================
// Population Tests
// ============================================================================

#[tokio::test]
async fn test_populate_follows_only_filtered_edges() {
    let graph = populated(SITE, &config()).await;

    let loaded: Vec<String> = graph
        .find_assets(&|asset: &Asset| asset.is_loaded && !asset.is_inline)
        .into_iter()
        .map(|asset| asset.url.to_string())
        .collect();
    assert_eq!(
        loaded,
        vec!["https://site.test/index.html", "https://site.test/style.css"]
    );
    // anchors are only followed when recursive
    assert!(!graph.asset(AssetId(2)).unwrap().is_loaded);
}

#[tokio::test]
async fn test_populate_loads_inline_children() {
    let graph = populated(SITE, &config()).await;
    assert!(graph.asset(AssetId(3)).unwrap().is_loaded);
}

#[tokio::test]
async fn test_recursive_populate_loads_anchored_documents() {
    let graph = populated(SITE, &config().with_recursive(true)).await;
    assert!(graph.asset(AssetId(2)).unwrap().is_loaded);
}

#[tokio::test]
async fn test_missing_targets_become_load_failures() {
    let mut graph = populated(SITE, &config()).await;
    let reports = graph.drain_reports();

    let load: Vec<_> = reports.iter().filter(|r| r.is(Check::Load)).collect();
    assert_eq!(load.len(), 2);

    let missing = load
        .iter()
        .find(|r| r.name == "load https://site.test/missing.png")
        .unwrap();
    assert!(!missing.ok);
    assert_eq!(missing.expected.as_deref(), Some("200 https://site.test/missing.png"));
    assert_eq!(missing.actual.as_deref(), Some("ENOENT https://site.test/missing.png"));
    assert_eq!(missing.at, "https://site.test/index.html:12:3");

    assert!(load.iter().any(|r| r.name == "load https://site.test/bg.png"));
    assert!(graph.drain_reports().is_empty());
}

#[tokio::test]
async fn test_populate_without_assets_is_fatal() {
    let mut graph = MemoryGraph::from_json(r#"{ "assets": [] }"#).unwrap();
    let follow = follow_filter(&config());
    let result = graph.populate(follow.as_ref(), 4).await;
    assert!(matches!(result, Err(ProviderError::Fatal(_))));
}

// ============================================================================
// Content Type Tests
// ============================================================================

#[tokio::test]
async fn test_conflicting_uses_report_mismatch() {
    let json = r#"{
        "assets": [
            { "url": "https://site.test/", "kind": "html", "content_type": "text/html" },
            { "url": "https://site.test/app.css", "kind": "css", "content_type": "text/css" }
        ],
        "relations": [
            { "from": 0, "kind": "stylesheet", "href": "/app.css" },
            { "from": 0, "kind": "script", "href": "/app.css", "line": 8, "column": 1 }
        ]
    }"#;
    let mut graph = populated(json, &config()).await;
    let reports = graph.drain_reports();

    let mismatch = reports
        .iter()
        .find(|r| r.is(Check::ContentTypeMismatch))
        .unwrap();
    assert_eq!(mismatch.name, "content-type-mismatch https://site.test/app.css");
    assert_eq!(mismatch.expected.as_deref(), Some("css"));
    assert_eq!(mismatch.actual.as_deref(), Some("javascript"));
    assert_eq!(mismatch.at, "https://site.test/:8:1");
}

#[tokio::test]
async fn test_loaded_asset_without_content_type() {
    let json = r#"{
        "assets": [
            { "url": "https://site.test/", "kind": "html", "content_type": "text/html" },
            { "url": "https://site.test/logo.png", "kind": "image" }
        ],
        "relations": [{ "from": 0, "kind": "image", "href": "/logo.png" }]
    }"#;
    let mut graph = populated(json, &config()).await;
    let reports = graph.drain_reports();

    assert_eq!(reports.len(), 1);
    assert!(reports[0].is(Check::ContentTypeMissing));
    assert_eq!(reports[0].name, "content-type-missing https://site.test/logo.png");
}

// ============================================================================
// Pretty URL Tests
// ============================================================================

const PRETTY: &str = r#"{
    "assets": [
        { "url": "https://site.test/", "kind": "html", "content_type": "text/html" },
        { "url": "https://site.test/about.html", "kind": "html",
          "content_type": "text/html", "ids": ["team"] }
    ],
    "relations": [{ "from": 0, "kind": "anchor", "href": "/about#team" }]
}"#;

#[tokio::test]
async fn test_pretty_urls_resolve_to_html_documents() {
    let config = config().with_recursive(true).with_pretty_urls(true);
    let mut graph = populated(PRETTY, &config).await;

    assert!(graph.drain_reports().is_empty());
    let anchor = &graph.find_relations(&|_: &Relation| true)[0];
    assert_eq!(graph.target_of(anchor), Some(AssetId(1)));
    assert!(graph.element_ids(AssetId(1)).unwrap().contains("team"));
}

#[tokio::test]
async fn test_without_pretty_urls_extensionless_target_is_missing() {
    let mut graph = populated(PRETTY, &config().with_recursive(true)).await;
    let reports = graph.drain_reports();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].name, "load https://site.test/about");
}

// ============================================================================
// Document Queries and Release Tests
// ============================================================================

#[tokio::test]
async fn test_element_ids_only_for_loaded_documents() {
    let graph = populated(SITE, &config()).await;

    assert!(graph.element_ids(AssetId(0)).unwrap().contains("top"));
    // style sheets have no ids
    assert!(graph.element_ids(AssetId(1)).is_none());
    // not loaded
    assert!(graph.element_ids(AssetId(2)).is_none());
}

#[test]
fn test_containing_document_of_inline_asset() {
    let graph = MemoryGraph::from_json(SITE).unwrap();
    assert_eq!(graph.containing_document(AssetId(3)), Some(AssetId(0)));
    assert_eq!(graph.containing_document(AssetId(1)), Some(AssetId(1)));
    assert!(graph.is_secure_context(AssetId(3)));
}

#[test]
fn test_plain_http_document_is_not_secure() {
    let json = r#"{ "assets": [{ "url": "http://site.test/", "kind": "html" }] }"#;
    let graph = MemoryGraph::from_json(json).unwrap();
    assert!(!graph.is_secure_context(AssetId(0)));
}

#[tokio::test]
async fn test_release_drops_content_and_ids() {
    let mut graph = populated(SITE, &config()).await;
    graph.release(AssetId(0));

    let asset = graph.asset(AssetId(0)).unwrap();
    assert!(!asset.is_loaded);
    assert!(asset.content.is_none());
    assert!(graph.element_ids(AssetId(0)).is_none());
}
