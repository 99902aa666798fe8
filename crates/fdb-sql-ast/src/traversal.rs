//! Tree traversal utilities.
//!
//! [`NodeRef`] is a borrowed view of any node, including nodes nested inside
//! other nodes that are not stored as a [`Node`] themselves (the columns of an
//! index, the elements of a table). Child order matches rendering order.
//!
//! # Traversal
//!
//! - [`DfsIter`]: pre-order depth-first iterator
//! - [`NodeWalk`]: search helpers over a tree
//!
//! ```rust
//! use fdb_sql_ast::nodes::{DropTable, ExistenceCheck, Node, NodeKind, TableName};
//! use fdb_sql_ast::traversal::NodeWalk;
//!
//! let name = TableName::parse("s.t").unwrap();
//! let drop = DropTable::new(name, ExistenceCheck::NoCondition, None).unwrap();
//! let node = Node::from(drop);
//! assert_eq!(node.count(|n| n.kind() == NodeKind::TableName), 1);
//! ```

use crate::nodes::{
    AlterTable, AlterTableAction, ColumnDefinition, ColumnList, ConstraintBody,
    ConstraintDefinition, CreateIndex, CreateTable, DropIndex, DropTable, IndexColumn,
    IndexColumnList, IndexConstraint, IndexDefinition, Node, NodeKind, Span, StorageFormat,
    TableElement, TableName, ValueExpr,
};

/// Borrowed view of one node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    TableName(&'a TableName),
    Value(&'a ValueExpr),
    ColumnList(&'a ColumnList),
    IndexColumn(&'a IndexColumn),
    IndexColumnList(&'a IndexColumnList),
    StorageFormat(&'a StorageFormat),
    ColumnDefinition(&'a ColumnDefinition),
    Constraint(&'a ConstraintDefinition),
    IndexConstraint(&'a IndexConstraint),
    CreateIndex(&'a CreateIndex),
    DropIndex(&'a DropIndex),
    CreateTable(&'a CreateTable),
    DropTable(&'a DropTable),
    AlterTable(&'a AlterTable),
}

impl<'a> From<&'a Node> for NodeRef<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::TableName(n) => NodeRef::TableName(n),
            Node::Value(n) => NodeRef::Value(n),
            Node::ColumnList(n) => NodeRef::ColumnList(n),
            Node::IndexColumn(n) => NodeRef::IndexColumn(n),
            Node::IndexColumnList(n) => NodeRef::IndexColumnList(n),
            Node::StorageFormat(n) => NodeRef::StorageFormat(n),
            Node::ColumnDefinition(n) => NodeRef::ColumnDefinition(n),
            Node::Constraint(n) => NodeRef::Constraint(n),
            Node::IndexConstraint(n) => NodeRef::IndexConstraint(n),
            Node::CreateIndex(n) => NodeRef::CreateIndex(n),
            Node::DropIndex(n) => NodeRef::DropIndex(n),
            Node::CreateTable(n) => NodeRef::CreateTable(n),
            Node::DropTable(n) => NodeRef::DropTable(n),
            Node::AlterTable(n) => NodeRef::AlterTable(n),
        }
    }
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::TableName(_) => NodeKind::TableName,
            NodeRef::Value(v) => v.kind(),
            NodeRef::ColumnList(_) => NodeKind::ColumnList,
            NodeRef::IndexColumn(_) => NodeKind::IndexColumn,
            NodeRef::IndexColumnList(_) => NodeKind::IndexColumnList,
            NodeRef::StorageFormat(_) => NodeKind::StorageFormat,
            NodeRef::ColumnDefinition(_) => NodeKind::ColumnDefinition,
            NodeRef::Constraint(_) => NodeKind::ConstraintDefinition,
            NodeRef::IndexConstraint(_) => NodeKind::IndexConstraint,
            NodeRef::CreateIndex(_) => NodeKind::CreateIndex,
            NodeRef::DropIndex(_) => NodeKind::DropIndex,
            NodeRef::CreateTable(_) => NodeKind::CreateTable,
            NodeRef::DropTable(_) => NodeKind::DropTable,
            NodeRef::AlterTable(_) => NodeKind::AlterTable,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            NodeRef::TableName(n) => n.span(),
            NodeRef::Value(n) => n.span(),
            NodeRef::ColumnList(n) => n.span(),
            NodeRef::IndexColumn(n) => n.span(),
            NodeRef::IndexColumnList(n) => n.span(),
            NodeRef::StorageFormat(n) => n.span(),
            NodeRef::ColumnDefinition(n) => n.span(),
            NodeRef::Constraint(n) => n.span(),
            NodeRef::IndexConstraint(n) => n.span(),
            NodeRef::CreateIndex(n) => n.span(),
            NodeRef::DropIndex(n) => n.span(),
            NodeRef::CreateTable(n) => n.span(),
            NodeRef::DropTable(n) => n.span(),
            NodeRef::AlterTable(n) => n.span(),
        }
    }

    /// Direct children in stored order. Leaves return an empty vector.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        match *self {
            NodeRef::TableName(_) | NodeRef::ColumnList(_) | NodeRef::StorageFormat(_) => {}
            NodeRef::Value(v) => match v {
                ValueExpr::Column(c) => out.extend(c.table().map(NodeRef::TableName)),
                ValueExpr::Binary(e) => {
                    out.push(NodeRef::Value(e.left()));
                    out.push(NodeRef::Value(e.right()));
                }
                ValueExpr::Not(e) => out.push(NodeRef::Value(e.operand())),
                ValueExpr::IsNull(e) => out.push(NodeRef::Value(e.operand())),
                ValueExpr::Number(_)
                | ValueExpr::String(_)
                | ValueExpr::Boolean(_)
                | ValueExpr::Null(_) => {}
            },
            NodeRef::IndexColumn(c) => out.extend(c.table().map(NodeRef::TableName)),
            NodeRef::IndexColumnList(l) => out.extend(l.iter().map(NodeRef::IndexColumn)),
            NodeRef::ColumnDefinition(c) => out.extend(c.default_value().map(NodeRef::Value)),
            NodeRef::Constraint(c) => {
                out.extend(c.name().map(NodeRef::TableName));
                match c.body() {
                    ConstraintBody::PrimaryKey { columns } | ConstraintBody::Unique { columns } => {
                        out.push(NodeRef::ColumnList(columns));
                    }
                    ConstraintBody::Check { condition } => out.push(NodeRef::Value(condition)),
                    ConstraintBody::ForeignKey(fk) => {
                        out.push(NodeRef::ColumnList(&fk.columns));
                        out.push(NodeRef::TableName(&fk.ref_table));
                        out.extend(fk.ref_columns.as_ref().map(NodeRef::ColumnList));
                    }
                    ConstraintBody::Drop(_) => {}
                }
            }
            NodeRef::IndexConstraint(i) => {
                out.push(NodeRef::IndexColumnList(i.index_columns()));
                out.extend(i.storage_format().map(NodeRef::StorageFormat));
            }
            NodeRef::CreateIndex(i) => {
                out.push(NodeRef::TableName(i.index_name()));
                out.push(NodeRef::TableName(i.table_name()));
                out.push(NodeRef::IndexColumnList(i.index_columns()));
                out.extend(i.storage_format().map(NodeRef::StorageFormat));
            }
            NodeRef::DropIndex(d) => out.push(NodeRef::TableName(d.index_name())),
            NodeRef::CreateTable(t) => {
                out.push(NodeRef::TableName(t.name()));
                out.extend(t.elements().iter().map(|e| match e {
                    TableElement::Column(c) => NodeRef::ColumnDefinition(c),
                    TableElement::Constraint(c) => NodeRef::Constraint(c),
                    TableElement::Index(i) => NodeRef::IndexConstraint(i),
                }));
                out.extend(t.storage_format().map(NodeRef::StorageFormat));
            }
            NodeRef::DropTable(d) => out.push(NodeRef::TableName(d.name())),
            NodeRef::AlterTable(a) => {
                out.push(NodeRef::TableName(a.name()));
                for action in a.actions() {
                    match action {
                        AlterTableAction::AddConstraint(c)
                        | AlterTableAction::DropConstraint(c) => {
                            out.push(NodeRef::Constraint(c));
                        }
                        AlterTableAction::AddColumn(c) => out.push(NodeRef::ColumnDefinition(c)),
                        AlterTableAction::DropColumn { .. } => {}
                    }
                }
            }
        }
        out
    }
}

/// Pre-order depth-first iterator over a tree.
///
/// The root is yielded first, then each child subtree from left to right.
pub struct DfsIter<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> DfsIter<'a> {
    pub fn new(root: impl Into<NodeRef<'a>>) -> Self {
        Self {
            stack: vec![root.into()],
        }
    }
}

impl<'a> Iterator for DfsIter<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push in reverse so children come out in forward order
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

/// Search helpers over a tree.
pub trait NodeWalk {
    /// Depth-first (pre-order) iterator over this node and all descendants.
    fn dfs(&self) -> DfsIter<'_>;

    /// First node matching `predicate` in depth-first order.
    fn find<F>(&self, predicate: F) -> Option<NodeRef<'_>>
    where
        F: Fn(&NodeRef<'_>) -> bool,
    {
        self.dfs().find(|n| predicate(n))
    }

    /// All nodes matching `predicate` in depth-first order.
    fn find_all<F>(&self, predicate: F) -> Vec<NodeRef<'_>>
    where
        F: Fn(&NodeRef<'_>) -> bool,
    {
        self.dfs().filter(|n| predicate(n)).collect()
    }

    fn contains<F>(&self, predicate: F) -> bool
    where
        F: Fn(&NodeRef<'_>) -> bool,
    {
        self.dfs().any(|n| predicate(&n))
    }

    /// Number of nodes, this one included, matching `predicate`.
    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&NodeRef<'_>) -> bool,
    {
        self.dfs().filter(|n| predicate(n)).count()
    }

    /// Maximum nesting below this node; a leaf has depth 0.
    fn tree_depth(&self) -> usize;
}

fn depth_of(node: NodeRef<'_>) -> usize {
    node.children()
        .into_iter()
        .map(|child| depth_of(child) + 1)
        .max()
        .unwrap_or(0)
}

impl NodeWalk for Node {
    fn dfs(&self) -> DfsIter<'_> {
        DfsIter::new(self)
    }

    fn tree_depth(&self) -> usize {
        depth_of(NodeRef::from(self))
    }
}

impl<'a> NodeWalk for NodeRef<'a> {
    fn dfs(&self) -> DfsIter<'_> {
        DfsIter::new(*self)
    }

    fn tree_depth(&self) -> usize {
        depth_of(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionContext;
    use crate::features::Feature;
    use crate::nodes::{
        BinaryOperator, DataType, ExistenceCheck, ForeignKeyDefinition, Identifier,
    };

    fn orders_table() -> Node {
        let ctx = SessionContext::new();
        let column = |name: &str| {
            TableElement::Column(
                ColumnDefinition::new(Identifier::new(name), DataType::Int, true, None).unwrap(),
            )
        };
        let check = ConstraintDefinition::check(
            None,
            ValueExpr::binary(
                BinaryOperator::Gt,
                ValueExpr::column("qty").unwrap(),
                ValueExpr::number("0").unwrap(),
            ),
        );
        let fk = ConstraintDefinition::foreign_key(
            &ctx,
            None,
            ForeignKeyDefinition::new(
                ColumnList::from_names(["cid"]).unwrap(),
                TableName::parse("customers").unwrap(),
                None,
            ),
        )
        .unwrap();
        CreateTable::new(
            TableName::parse("orders").unwrap(),
            ExistenceCheck::NoCondition,
            vec![
                column("qty"),
                column("cid"),
                TableElement::Constraint(check),
                TableElement::Constraint(fk),
            ],
            None,
        )
        .unwrap()
        .into()
    }

    #[test]
    fn test_dfs_order() {
        let node = orders_table();
        let kinds: Vec<_> = node.dfs().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::CreateTable,
                NodeKind::TableName,
                NodeKind::ColumnDefinition,
                NodeKind::ColumnDefinition,
                NodeKind::ConstraintDefinition,
                NodeKind::BinaryOperator,
                NodeKind::ColumnReference,
                NodeKind::NumericConstant,
                NodeKind::ConstraintDefinition,
                NodeKind::ColumnList,
                NodeKind::TableName,
            ]
        );
    }

    #[test]
    fn test_find_and_count() {
        let node = orders_table();
        assert_eq!(node.count(|n| n.kind() == NodeKind::TableName), 2);
        assert!(node.contains(|n| n.kind() == NodeKind::NumericConstant));
        assert!(!node.contains(|n| n.kind() == NodeKind::StorageFormat));

        let fk = node
            .find(|n| matches!(n, NodeRef::Constraint(c) if c.ref_table_name().is_ok()))
            .unwrap();
        assert_eq!(fk.children().len(), 2);
        assert_eq!(node.find_all(|n| n.kind() == NodeKind::ColumnDefinition).len(), 2);
    }

    #[test]
    fn test_tree_depth() {
        let node = orders_table();
        // CreateTable > Constraint > Binary > ColumnReference
        assert_eq!(node.tree_depth(), 3);

        let leaf = Node::from(TableName::parse("t").unwrap());
        assert_eq!(leaf.tree_depth(), 0);
    }

    #[test]
    fn test_group_index_children_include_column_tables() {
        let ctx = SessionContext::with_features([Feature::TableGrouping]);
        let columns = IndexColumnList::new(vec![
            IndexColumn::new(Some(TableName::parse("c").unwrap()), Identifier::new("name"), true)
                .unwrap(),
            IndexColumn::new(Some(TableName::parse("o").unwrap()), Identifier::new("date"), true)
                .unwrap(),
        ])
        .unwrap();
        let node: Node = CreateIndex::builder(
            TableName::parse("gi").unwrap(),
            TableName::parse("c").unwrap(),
            columns,
        )
        .join_type(Some(crate::nodes::JoinType::Inner))
        .build(&ctx)
        .unwrap()
        .into();
        assert_eq!(node.count(|n| n.kind() == NodeKind::TableName), 4);
    }
}
