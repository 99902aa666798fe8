#![allow(dead_code)]
//! Data structures for the JSON node fixtures
//!
//! A fixture describes a tree the way the grammar front-end would produce
//! it: a node kind plus the raw production values, fed through
//! [`NodeFactory`] so the fixtures exercise the same validation path as a
//! real parse.

use fdb_sql_ast::nodes::{Node, NodeKind, Options, TableName};
use fdb_sql_ast::{NodeFactory, RawValue};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Golden rendering fixtures from unparse.json
#[derive(Debug, Deserialize)]
pub struct UnparseFixtures {
    pub nodes: Vec<NodeCase>,
    #[serde(default)]
    pub statement_lists: Vec<StatementListCase>,
}

/// A single node rendered on its own
#[derive(Debug, Deserialize)]
pub struct NodeCase {
    pub name: String,
    /// `+NAME` / `-NAME` feature override lines applied to a fresh session
    #[serde(default)]
    pub features: Vec<String>,
    pub node: NodeSpec,
    pub expected: String,
}

/// A list of statements rendered together
#[derive(Debug, Deserialize)]
pub struct StatementListCase {
    pub name: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub statements: Vec<NodeSpec>,
    pub expected: String,
}

/// A node kind plus its raw construction arguments.
#[derive(Debug, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    #[serde(default)]
    pub args: Vec<RawSpec>,
}

/// JSON form of [`RawValue`], with shorthands for the most common nodes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawSpec {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Tag(String),
    /// Delimited identifier text
    Delimited(String),
    /// `TableName` from dotted text
    Table(String),
    /// Unqualified `ColumnReference`
    Column(String),
    Node(NodeSpec),
    List(Vec<NodeSpec>),
    /// Heterogeneous list of raw values
    Items(Vec<RawSpec>),
    Options(BTreeMap<String, String>),
}

impl NodeSpec {
    /// Build the node through the factory of the given session.
    pub fn build(&self, factory: &NodeFactory<'_>) -> Result<Node, String> {
        let kind: NodeKind = self.kind.parse()?;
        let args = self
            .args
            .iter()
            .map(|arg| arg.to_raw(factory))
            .collect::<Result<Vec<_>, _>>()?;
        factory
            .make_node(kind, args)
            .map_err(|e| format!("{} construction failed: {}", self.kind, e))
    }
}

impl RawSpec {
    pub fn to_raw(&self, factory: &NodeFactory<'_>) -> Result<RawValue, String> {
        let raw = match self {
            RawSpec::Null => RawValue::Null,
            RawSpec::Bool(b) => RawValue::Bool(*b),
            RawSpec::Int(i) => RawValue::Int(*i),
            RawSpec::Str(s) => RawValue::str(s.as_str()),
            RawSpec::Tag(t) => RawValue::tag(t.as_str()),
            RawSpec::Delimited(name) => RawValue::delimited(name.as_str()),
            RawSpec::Table(text) => {
                RawValue::node(TableName::parse(text).map_err(|e| e.to_string())?)
            }
            RawSpec::Column(name) => RawValue::Node(
                factory
                    .make_node(
                        NodeKind::ColumnReference,
                        vec![RawValue::Null, RawValue::str(name.as_str())],
                    )
                    .map_err(|e| e.to_string())?,
            ),
            RawSpec::Node(spec) => RawValue::Node(spec.build(factory)?),
            RawSpec::List(specs) => RawValue::NodeList(
                specs
                    .iter()
                    .map(|spec| spec.build(factory))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            RawSpec::Items(items) => RawValue::List(
                items
                    .iter()
                    .map(|item| item.to_raw(factory))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            RawSpec::Options(entries) => {
                RawValue::Options(entries.iter().collect::<Options>())
            }
        };
        Ok(raw)
    }
}
