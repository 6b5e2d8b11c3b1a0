/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for htempl using test fixtures.
 */

use htempl::{Htempl, HtemplError, MetaValue};
use pretty_assertions::assert_eq;

// Fixtures reference each other relative to the crate root, which is the
// working directory of `cargo test`.
fn fixture(name: &str) -> String {
    format!("test-fixtures/{name}")
}

fn render_fixture(name: &str) -> Result<String, HtemplError> {
    Htempl::open(fixture(name))?.render_to_string()
}

#[test]
fn test_hello() {
    assert_eq!(render_fixture("hello.htempl").unwrap(), "Hi");
}

#[test]
fn test_page_merges_includes() {
    let doc = Htempl::open(fixture("page.htempl")).unwrap();
    let vars = doc.vars();

    assert_eq!(vars["title"], MetaValue::String("Welcome".into()));
    assert_eq!(vars["site"], MetaValue::String("Example".into()));
    assert_eq!(
        vars["stylesheets"],
        MetaValue::List(vec![
            MetaValue::String("page.css".into()),
            MetaValue::String("base.css".into()),
        ])
    );
    assert_eq!(vars["nav"].as_list().map(<[_]>::len), Some(2));
    for key in ["include", "includes", "template", "templates"] {
        assert!(!vars.contains_key(key), "reserved key {key} leaked");
    }
}

#[test]
fn test_page_compiles_fragments_from_includes() {
    let doc = Htempl::open(fixture("page.htempl")).unwrap();
    let templates = doc.templates();
    assert_eq!(templates.name(), "test-fixtures/page.htempl");
    assert!(templates.contains("test-fixtures/layout.html"));
    assert!(templates.contains("test-fixtures/nav.html"));
}

#[test]
fn test_page_renders() {
    let html = render_fixture("page.htempl").unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Welcome | Example</title>"));
    assert!(html.contains(r#"<link rel="stylesheet" href="page.css">"#));
    assert!(html.contains(r#"<link rel="stylesheet" href="base.css">"#));
    assert!(html.contains(">Home</a>"));
    assert!(html.contains(">About</a>"));
    assert!(html.contains("<h1>Welcome</h1>"));
    assert!(html.contains("<p>Some <em>markdown</em> text.</p>"));
}

#[test]
fn test_include_cycle_fails_fast() {
    match render_fixture("cycle.htempl").unwrap_err() {
        HtemplError::IncludeCycle { chain } => {
            assert_eq!(chain.len(), 4);
            assert!(chain[0].ends_with("cycle.htempl"));
            assert!(chain[1].ends_with("cycle-a.yaml"));
            assert!(chain[3].ends_with("cycle-a.yaml"));
        }
        other => panic!("expected an include cycle, got {other:?}"),
    }
}

#[test]
fn test_unterminated_metadata_block() {
    let err = render_fixture("unterminated.htempl").unwrap_err();
    assert!(matches!(err, HtemplError::UnterminatedHeader { .. }));
}

#[test]
fn test_broken_fragment_is_named() {
    let err = render_fixture("bad-fragment.htempl").unwrap_err();
    match err {
        HtemplError::Compile { name, .. } => {
            assert_eq!(name, "test-fixtures/broken-fragment.html");
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn test_missing_document() {
    let err = render_fixture("does-not-exist.htempl").unwrap_err();
    assert!(matches!(err, HtemplError::Io { .. }));
    assert!(err.to_string().contains("does-not-exist.htempl"));
}
