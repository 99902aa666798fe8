//! Syntax tree node types.
//!
//! Every node kind is a plain struct with private fields, built through a
//! validating constructor and read through accessors. [`Node`] is the closed
//! union of all kinds; it is what the factory returns, what the copy engine
//! and unparser accept, and what a [`StatementList`] holds.
//!
//! ```rust
//! use fdb_sql_ast::nodes::{CreateIndex, IndexColumn, IndexColumnList, Node, TableName};
//! use fdb_sql_ast::SessionContext;
//!
//! let ctx = SessionContext::new();
//! let columns = IndexColumnList::new(vec![
//!     IndexColumn::asc("c1").unwrap(),
//!     IndexColumn::desc("c2").unwrap(),
//! ])
//! .unwrap();
//! let index = CreateIndex::builder(
//!     TableName::parse("idx1").unwrap(),
//!     TableName::parse("t1").unwrap(),
//!     columns,
//! )
//! .unique(true)
//! .build(&ctx)
//! .unwrap();
//!
//! let node = Node::from(index);
//! assert!(node.is_statement());
//! ```

mod constraints;
mod ddl;
mod expr;
mod index;
mod names;

pub use constraints::{
    ConstraintBody, ConstraintDefinition, ConstraintDrop, ConstraintType, DropBehavior,
    ExistenceCheck, ForeignKeyDefinition, MatchType, ReferentialAction,
};
pub use ddl::{
    AlterTable, AlterTableAction, ColumnDefinition, CreateIndex, CreateIndexBuilder, CreateTable,
    DataType, DdlStatement, DropIndex, DropTable, TableElement,
};
pub use expr::{
    BinaryExpr, BinaryOperator, BooleanConstant, ColumnReference, IsNullExpr, NotExpr,
    NullConstant, NumericConstant, StringConstant, ValueExpr,
};
pub use index::{
    IndexColumn, IndexColumnList, IndexConstraint, IndexDefinition, JoinType, Options,
    StorageFormat,
};
pub use names::{ColumnList, Identifier, TableName};

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Byte range of a node in the statement text it was parsed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The kind tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NodeKind {
    TableName,
    ColumnReference,
    NumericConstant,
    StringConstant,
    BooleanConstant,
    NullConstant,
    BinaryOperator,
    Not,
    IsNull,
    ColumnList,
    IndexColumn,
    IndexColumnList,
    StorageFormat,
    ColumnDefinition,
    ConstraintDefinition,
    IndexConstraint,
    CreateIndex,
    DropIndex,
    CreateTable,
    DropTable,
    AlterTable,
}

impl NodeKind {
    pub const ALL: [NodeKind; 21] = [
        NodeKind::TableName,
        NodeKind::ColumnReference,
        NodeKind::NumericConstant,
        NodeKind::StringConstant,
        NodeKind::BooleanConstant,
        NodeKind::NullConstant,
        NodeKind::BinaryOperator,
        NodeKind::Not,
        NodeKind::IsNull,
        NodeKind::ColumnList,
        NodeKind::IndexColumn,
        NodeKind::IndexColumnList,
        NodeKind::StorageFormat,
        NodeKind::ColumnDefinition,
        NodeKind::ConstraintDefinition,
        NodeKind::IndexConstraint,
        NodeKind::CreateIndex,
        NodeKind::DropIndex,
        NodeKind::CreateTable,
        NodeKind::DropTable,
        NodeKind::AlterTable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::TableName => "TableName",
            NodeKind::ColumnReference => "ColumnReference",
            NodeKind::NumericConstant => "NumericConstant",
            NodeKind::StringConstant => "StringConstant",
            NodeKind::BooleanConstant => "BooleanConstant",
            NodeKind::NullConstant => "NullConstant",
            NodeKind::BinaryOperator => "BinaryOperator",
            NodeKind::Not => "Not",
            NodeKind::IsNull => "IsNull",
            NodeKind::ColumnList => "ColumnList",
            NodeKind::IndexColumn => "IndexColumn",
            NodeKind::IndexColumnList => "IndexColumnList",
            NodeKind::StorageFormat => "StorageFormat",
            NodeKind::ColumnDefinition => "ColumnDefinition",
            NodeKind::ConstraintDefinition => "ConstraintDefinition",
            NodeKind::IndexConstraint => "IndexConstraint",
            NodeKind::CreateIndex => "CreateIndex",
            NodeKind::DropIndex => "DropIndex",
            NodeKind::CreateTable => "CreateTable",
            NodeKind::DropTable => "DropTable",
            NodeKind::AlterTable => "AlterTable",
        }
    }

    /// Kinds that can stand alone as a statement.
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::CreateIndex
                | NodeKind::DropIndex
                | NodeKind::CreateTable
                | NodeKind::DropTable
                | NodeKind::AlterTable
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown node kind {s}"))
    }
}

/// Any syntax tree node.
///
/// Composite nodes are not `Clone`: use [`crate::deep_copy`] so the copy is
/// rebuilt and revalidated under a session.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    TableName(TableName),
    Value(ValueExpr),
    ColumnList(ColumnList),
    IndexColumn(IndexColumn),
    IndexColumnList(IndexColumnList),
    StorageFormat(StorageFormat),
    ColumnDefinition(ColumnDefinition),
    Constraint(Box<ConstraintDefinition>),
    IndexConstraint(Box<IndexConstraint>),
    CreateIndex(Box<CreateIndex>),
    DropIndex(Box<DropIndex>),
    CreateTable(Box<CreateTable>),
    DropTable(Box<DropTable>),
    AlterTable(Box<AlterTable>),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::TableName(_) => NodeKind::TableName,
            Node::Value(v) => v.kind(),
            Node::ColumnList(_) => NodeKind::ColumnList,
            Node::IndexColumn(_) => NodeKind::IndexColumn,
            Node::IndexColumnList(_) => NodeKind::IndexColumnList,
            Node::StorageFormat(_) => NodeKind::StorageFormat,
            Node::ColumnDefinition(_) => NodeKind::ColumnDefinition,
            Node::Constraint(_) => NodeKind::ConstraintDefinition,
            Node::IndexConstraint(_) => NodeKind::IndexConstraint,
            Node::CreateIndex(_) => NodeKind::CreateIndex,
            Node::DropIndex(_) => NodeKind::DropIndex,
            Node::CreateTable(_) => NodeKind::CreateTable,
            Node::DropTable(_) => NodeKind::DropTable,
            Node::AlterTable(_) => NodeKind::AlterTable,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::TableName(n) => n.span(),
            Node::Value(n) => n.span(),
            Node::ColumnList(n) => n.span(),
            Node::IndexColumn(n) => n.span(),
            Node::IndexColumnList(n) => n.span(),
            Node::StorageFormat(n) => n.span(),
            Node::ColumnDefinition(n) => n.span(),
            Node::Constraint(n) => n.span(),
            Node::IndexConstraint(n) => n.span(),
            Node::CreateIndex(n) => n.span(),
            Node::DropIndex(n) => n.span(),
            Node::CreateTable(n) => n.span(),
            Node::DropTable(n) => n.span(),
            Node::AlterTable(n) => n.span(),
        }
    }

    /// Attach a source position.
    pub fn with_span(self, span: Span) -> Self {
        match self {
            Node::TableName(n) => Node::TableName(n.with_span(span)),
            Node::Value(n) => Node::Value(n.with_span(span)),
            Node::ColumnList(n) => Node::ColumnList(n.with_span(span)),
            Node::IndexColumn(n) => Node::IndexColumn(n.with_span(span)),
            Node::IndexColumnList(n) => Node::IndexColumnList(n.with_span(span)),
            Node::StorageFormat(n) => Node::StorageFormat(n.with_span(span)),
            Node::ColumnDefinition(n) => Node::ColumnDefinition(n.with_span(span)),
            Node::Constraint(n) => Node::Constraint(Box::new((*n).with_span(span))),
            Node::IndexConstraint(n) => Node::IndexConstraint(Box::new((*n).with_span(span))),
            Node::CreateIndex(n) => Node::CreateIndex(Box::new((*n).with_span(span))),
            Node::DropIndex(n) => Node::DropIndex(Box::new((*n).with_span(span))),
            Node::CreateTable(n) => Node::CreateTable(Box::new((*n).with_span(span))),
            Node::DropTable(n) => Node::DropTable(Box::new((*n).with_span(span))),
            Node::AlterTable(n) => Node::AlterTable(Box::new((*n).with_span(span))),
        }
    }

    pub fn is_statement(&self) -> bool {
        self.kind().is_statement()
    }

    /// The index-defining facet, for kinds that define an index.
    pub fn as_index_definition(&self) -> Option<&dyn IndexDefinition> {
        match self {
            Node::CreateIndex(n) => Some(n.as_ref()),
            Node::IndexConstraint(n) => Some(n.as_ref()),
            _ => None,
        }
    }

    /// The statement facet, for statement kinds.
    pub fn as_ddl_statement(&self) -> Option<&dyn DdlStatement> {
        match self {
            Node::CreateIndex(n) => Some(n.as_ref()),
            Node::DropIndex(n) => Some(n.as_ref()),
            Node::CreateTable(n) => Some(n.as_ref()),
            Node::DropTable(n) => Some(n.as_ref()),
            Node::AlterTable(n) => Some(n.as_ref()),
            _ => None,
        }
    }

    /// Serialize the tree as pretty-printed JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

macro_rules! node_conversions {
    (@wrap $value:ident yes) => { Box::new($value) };
    (@wrap $value:ident) => { $value };
    (@unwrap $value:ident yes) => { *$value };
    (@unwrap $value:ident) => { $value };
    ($($ty:ty => $variant:ident $(boxed $boxed:tt)?),* $(,)?) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::$variant(node_conversions!(@wrap value $($boxed)?))
                }
            }

            impl TryFrom<Node> for $ty {
                type Error = Node;

                /// Hands the node back when it is of another kind.
                fn try_from(node: Node) -> std::result::Result<Self, Node> {
                    match node {
                        Node::$variant(value) => Ok(node_conversions!(@unwrap value $($boxed)?)),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

node_conversions! {
    TableName => TableName,
    ValueExpr => Value,
    ColumnList => ColumnList,
    IndexColumn => IndexColumn,
    IndexColumnList => IndexColumnList,
    StorageFormat => StorageFormat,
    ColumnDefinition => ColumnDefinition,
    ConstraintDefinition => Constraint boxed yes,
    IndexConstraint => IndexConstraint boxed yes,
    CreateIndex => CreateIndex boxed yes,
    DropIndex => DropIndex boxed yes,
    CreateTable => CreateTable boxed yes,
    DropTable => DropTable boxed yes,
    AlterTable => AlterTable boxed yes,
}

/// An ordered list of statements, e.g. one script.
#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatementList {
    statements: Vec<Node>,
}

impl StatementList {
    pub fn new(statements: Vec<Node>) -> Result<Self> {
        let mut list = Self::default();
        for statement in statements {
            list.push(statement)?;
        }
        Ok(list)
    }

    /// Append a statement; anything else is rejected.
    pub fn push(&mut self, statement: Node) -> Result<()> {
        if !statement.is_statement() {
            return Err(Error::malformed(
                statement.kind(),
                "only statements can be added to a statement list",
            ));
        }
        self.statements.push(statement);
        Ok(())
    }

    pub fn statements(&self) -> &[Node] {
        &self.statements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.statements.iter()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl<'a> IntoIterator for &'a StatementList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}
