// Tests for relation classification

use anchorage_core::CheckConfig;
use anchorage_core::classify::{Disposition, classify, disposition};
use anchorage_core::model::{AssetId, Relation, RelationId, RelationKind, SourceLocation};
use url::Url;

fn config() -> CheckConfig {
    CheckConfig::new(Url::parse("https://site.test/").unwrap())
}

fn relation(kind: RelationKind, to: &str) -> Relation {
    let to = Url::parse(to).unwrap();
    Relation {
        id: RelationId(0),
        from: AssetId(0),
        kind,
        href: to.to_string(),
        cross_origin: to.host_str() != Some("site.test"),
        to,
        location: SourceLocation::new("https://site.test/index.html"),
    }
}

// ============================================================================
// Host Hint Tests
// ============================================================================

#[test]
fn test_host_hints_get_their_own_check() {
    let config = config().with_internal_only(true);
    for kind in [RelationKind::Preconnect, RelationKind::DnsPrefetch] {
        assert_eq!(
            disposition(&relation(kind, "https://fonts.example.com/"), &config),
            Disposition::HostCheck
        );
        assert_eq!(
            disposition(&relation(kind, "https://site.test/"), &config),
            Disposition::HostCheck
        );
    }
}

// ============================================================================
// Anchor Tests
// ============================================================================

#[test]
fn test_internal_anchor_is_neither_loaded_nor_requested() {
    assert_eq!(
        disposition(&relation(RelationKind::Anchor, "https://site.test/about.html"), &config()),
        Disposition::Navigate
    );
    assert_eq!(
        disposition(&relation(RelationKind::Anchor, "https://site.test/#top"), &config()),
        Disposition::Navigate
    );
}

#[test]
fn test_internal_anchor_outside_root_path_is_verified() {
    let config = CheckConfig::new(Url::parse("https://site.test/docs/").unwrap());
    assert_eq!(
        disposition(&relation(RelationKind::Anchor, "https://site.test/blog/"), &config),
        Disposition::Verify
    );
}

#[test]
fn test_internal_anchor_is_loaded_when_recursive() {
    assert_eq!(
        disposition(
            &relation(RelationKind::Anchor, "https://site.test/about.html"),
            &config().with_recursive(true)
        ),
        Disposition::Populate
    );
}

#[test]
fn test_internal_resources_are_loaded() {
    for kind in [RelationKind::Stylesheet, RelationKind::Script, RelationKind::Image] {
        assert_eq!(
            disposition(&relation(kind, "https://site.test/asset"), &config()),
            Disposition::Populate
        );
    }
}

// ============================================================================
// Source Map Tests
// ============================================================================

#[test]
fn test_source_maps_ignored_by_default() {
    let rel = relation(RelationKind::SourceMap, "https://site.test/app.js.map");
    assert_eq!(disposition(&rel, &config()), Disposition::Ignore);

    let rel = relation(RelationKind::SourceMapSource, "https://cdn.example.com/src/app.ts");
    assert_eq!(disposition(&rel, &config()), Disposition::Ignore);
}

#[test]
fn test_source_maps_followed_when_enabled() {
    let config = config().with_follow_source_maps(true);
    let rel = relation(RelationKind::SourceMap, "https://site.test/app.js.map");
    assert_eq!(disposition(&rel, &config), Disposition::Populate);

    let rel = relation(RelationKind::SourceMapSource, "https://cdn.example.com/src/app.ts");
    assert_eq!(disposition(&rel, &config), Disposition::Verify);
}

// ============================================================================
// Cross-Origin Tests
// ============================================================================

#[test]
fn test_cross_origin_is_verified_never_loaded() {
    let config = config().with_recursive(true);
    for kind in [RelationKind::Anchor, RelationKind::Script, RelationKind::Image] {
        assert_eq!(
            disposition(&relation(kind, "https://cdn.example.com/x"), &config),
            Disposition::Verify
        );
    }
}

#[test]
fn test_edge_marked_cross_origin_is_not_loaded() {
    let mut rel = relation(RelationKind::Image, "https://site.test/logo.png");
    rel.cross_origin = true;
    assert_eq!(disposition(&rel, &config()), Disposition::Verify);
}

// ============================================================================
// Internal-Only Tests
// ============================================================================

#[test]
fn test_internal_only_drops_external_targets() {
    let config = config().with_internal_only(true);
    assert_eq!(
        disposition(&relation(RelationKind::Anchor, "https://elsewhere.test/"), &config),
        Disposition::Ignore
    );
    assert_eq!(
        disposition(&relation(RelationKind::Anchor, "https://site.test/about.html#team"), &config),
        Disposition::Navigate
    );
}

#[test]
fn test_internal_only_respects_root_path() {
    let config = CheckConfig::new(Url::parse("https://site.test/docs/").unwrap())
        .with_internal_only(true);
    assert_eq!(
        disposition(&relation(RelationKind::Image, "https://site.test/blog/a.png"), &config),
        Disposition::Ignore
    );
    assert_eq!(
        disposition(&relation(RelationKind::Image, "https://site.test/docs/a.png"), &config),
        Disposition::Populate
    );
}

// ============================================================================
// Scheme and Partition Tests
// ============================================================================

#[test]
fn test_non_http_schemes_ignored() {
    for target in ["mailto:me@site.test", "tel:+100", "javascript:void(0)", "data:,x"] {
        assert_eq!(
            disposition(&relation(RelationKind::Anchor, target), &config()),
            Disposition::Ignore,
            "{}",
            target
        );
    }
}

#[test]
fn test_classify_partitions_every_relation() {
    let relations = vec![
        relation(RelationKind::Stylesheet, "https://site.test/a.css"),
        relation(RelationKind::Anchor, "https://elsewhere.test/"),
        relation(RelationKind::Preconnect, "https://fonts.example.com/"),
        relation(RelationKind::Anchor, "mailto:me@site.test"),
        relation(RelationKind::Anchor, "https://site.test/b.html"),
    ];

    let classification = classify(relations, &config());
    assert_eq!(classification.populate.len(), 1);
    assert_eq!(classification.verify.len(), 1);
    assert_eq!(classification.navigate.len(), 1);
    assert_eq!(classification.host_checks.len(), 1);
    assert_eq!(classification.ignored.len(), 1);
}
