#![allow(dead_code)]
//! Test runner utilities for the golden rendering tests

use super::fixtures::{NodeCase, StatementListCase};
use fdb_sql_ast::{
    deep_copy, deep_copy_statements, render, render_statements, NodeFactory, SessionContext,
    StatementList,
};

/// Fresh session with the fixture's feature overrides applied.
pub fn session_with(features: &[String]) -> Result<SessionContext, String> {
    let mut ctx = SessionContext::new();
    ctx.features_mut()
        .apply_overrides(features)
        .map_err(|e| format!("Feature override error: {}", e))?;
    Ok(ctx)
}

/// Build a node case, render it, then check that a deep copy renders the same.
pub fn unparse_test(case: &NodeCase) -> Result<(), String> {
    let ctx = session_with(&case.features)?;
    let node = case.node.build(&NodeFactory::new(&ctx))?;

    let output = render(&node).map_err(|e| format!("Render error: {}", e))?;
    if output != case.expected {
        return Err(format!(
            "Mismatch:\n  expected: {}\n  output:   {}",
            case.expected, output
        ));
    }

    let copy = deep_copy(&node, &ctx).map_err(|e| format!("Copy error: {}", e))?;
    let copied = render(&copy).map_err(|e| format!("Render error on copy: {}", e))?;
    if copied != output {
        return Err(format!(
            "Copy renders differently:\n  original: {}\n  copy:     {}",
            output, copied
        ));
    }

    Ok(())
}

/// Build every statement of a list case and render the list.
pub fn statement_list_test(case: &StatementListCase) -> Result<(), String> {
    let ctx = session_with(&case.features)?;
    let factory = NodeFactory::new(&ctx);
    let statements = case
        .statements
        .iter()
        .map(|spec| spec.build(&factory))
        .collect::<Result<Vec<_>, _>>()?;
    let list = StatementList::new(statements).map_err(|e| format!("List error: {}", e))?;

    let output = render_statements(&list).map_err(|e| format!("Render error: {}", e))?;
    if output != case.expected {
        return Err(format!(
            "Mismatch:\n  expected: {:?}\n  output:   {:?}",
            case.expected, output
        ));
    }

    let copy = deep_copy_statements(&list, &ctx).map_err(|e| format!("Copy error: {}", e))?;
    let copied = render_statements(&copy).map_err(|e| format!("Render error on copy: {}", e))?;
    if copied != output {
        return Err(format!(
            "Copy renders differently:\n  original: {:?}\n  copy:     {:?}",
            output, copied
        ));
    }

    Ok(())
}

/// Pass/fail tally over a fixture file.
#[derive(Debug, Default)]
pub struct TestResults {
    pub passed: usize,
    pub failures: Vec<(String, String)>,
}

impl TestResults {
    pub fn record(&mut self, name: &str, result: Result<(), String>) {
        match result {
            Ok(()) => self.passed += 1,
            Err(message) => self.failures.push((name.to_string(), message)),
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failures.len()
    }

    pub fn print_summary(&self, title: &str) {
        println!("{}: {}/{} passed", title, self.passed, self.total());
        for (name, message) in &self.failures {
            println!("  FAIL {}: {}", name, message);
        }
    }
}
