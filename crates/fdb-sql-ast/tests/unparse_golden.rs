//! Golden Rendering Tests
//!
//! Builds every tree described in the JSON fixtures through the node factory,
//! renders it, and compares against the expected canonical SQL. Each case
//! also checks that a deep copy renders identically.

mod common;

use common::{statement_list_test, unparse_test, TestResults, UnparseFixtures};
use once_cell::sync::Lazy;
use std::fs;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

static UNPARSE_FIXTURES: Lazy<UnparseFixtures> = Lazy::new(|| {
    let path = format!("{}/unparse.json", FIXTURES_PATH);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", path, e))
});

#[test]
fn test_unparse_fixtures_all() {
    let fixtures = &*UNPARSE_FIXTURES;
    assert!(!fixtures.nodes.is_empty(), "no node fixtures loaded");

    let mut results = TestResults::default();
    for case in &fixtures.nodes {
        results.record(&case.name, unparse_test(case));
    }
    results.print_summary("Node rendering");

    assert!(
        results.failures.is_empty(),
        "{} of {} rendering fixtures failed",
        results.failures.len(),
        results.total()
    );
}

#[test]
fn test_statement_list_fixtures_all() {
    let fixtures = &*UNPARSE_FIXTURES;

    let mut results = TestResults::default();
    for case in &fixtures.statement_lists {
        results.record(&case.name, statement_list_test(case));
    }
    results.print_summary("Statement lists");

    assert!(
        results.failures.is_empty(),
        "{} of {} statement list fixtures failed",
        results.failures.len(),
        results.total()
    );
}

#[test]
fn test_fixture_names_are_unique() {
    let fixtures = &*UNPARSE_FIXTURES;
    let mut names: Vec<&str> = fixtures
        .nodes
        .iter()
        .map(|c| c.name.as_str())
        .chain(fixtures.statement_lists.iter().map(|c| c.name.as_str()))
        .collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total, "duplicate fixture names");
}

/// Rendering is a pure function of the tree: repeated renders agree.
#[test]
fn test_rendering_is_deterministic() {
    let fixtures = &*UNPARSE_FIXTURES;
    for case in &fixtures.nodes {
        let ctx = common::session_with(&case.features).unwrap();
        let node = case
            .node
            .build(&fdb_sql_ast::NodeFactory::new(&ctx))
            .unwrap();
        let first = fdb_sql_ast::render(&node).unwrap();
        for _ in 0..3 {
            assert_eq!(fdb_sql_ast::render(&node).unwrap(), first, "{}", case.name);
        }
    }
}
