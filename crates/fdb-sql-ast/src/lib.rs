//! FDB SQL AST - typed syntax trees for a SQL front-end
//!
//! This library holds the tree layer that sits between a SQL grammar and the
//! passes that consume its output.
//!
//! # Architecture
//!
//! 1. **Factory** - turns reduced grammar productions into typed nodes
//! 2. **Nodes** - validated, typed statement/clause/name/expression kinds
//! 3. **Copy** - rebuilds an independent tree under a session
//! 4. **Unparser** - renders any node back into canonical SQL
//!
//! Grammar extensions are switched on per session through the
//! [`FeatureSet`] carried by a [`SessionContext`].
//!
//! ```rust
//! use fdb_sql_ast::nodes::{CreateIndex, IndexColumn, IndexColumnList, Node, TableName};
//! use fdb_sql_ast::{deep_copy, render, SessionContext};
//!
//! let ctx = SessionContext::new();
//! let columns = IndexColumnList::new(vec![
//!     IndexColumn::asc("c1").unwrap(),
//!     IndexColumn::desc("c2").unwrap(),
//! ])
//! .unwrap();
//! let index: Node = CreateIndex::builder(
//!     TableName::parse("idx1").unwrap(),
//!     TableName::parse("t1").unwrap(),
//!     columns,
//! )
//! .unique(true)
//! .build(&ctx)
//! .unwrap()
//! .into();
//!
//! assert_eq!(render(&index).unwrap(), "CREATE UNIQUE INDEX idx1 ON t1 (c1, c2 DESC)");
//! let copy = deep_copy(&index, &ctx).unwrap();
//! assert_eq!(render(&copy).unwrap(), render(&index).unwrap());
//! ```

pub mod context;
pub mod copy;
pub mod error;
pub mod factory;
pub mod features;
pub mod nodes;
pub mod traversal;
pub mod tree_print;
pub mod unparser;

pub use context::{SessionConfig, SessionContext};
pub use copy::{deep_copy, deep_copy_statements, CopyContext, DeepCopy};
pub use error::{Error, Result};
pub use factory::{NodeFactory, RawValue};
pub use features::{Feature, FeatureSet};
pub use nodes::{Node, NodeKind, StatementList};
pub use traversal::{DfsIter, NodeRef, NodeWalk};
pub use tree_print::tree_print;
pub use unparser::{Unparser, UnparserConfig};

/// Render a node as canonical SQL.
pub fn render(node: &Node) -> Result<String> {
    Unparser::sql(node)
}

/// Render a statement list, each statement terminated by `;`.
pub fn render_statements(statements: &StatementList) -> Result<String> {
    Unparser::new().generate_statements(statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_public_types_are_thread_safe() {
        assert_send_sync::<Node>();
        assert_send_sync::<StatementList>();
        assert_send_sync::<SessionContext>();
        assert_send_sync::<Error>();
    }
}
