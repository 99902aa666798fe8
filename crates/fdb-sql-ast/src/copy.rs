//! Deep copy of syntax trees.
//!
//! A copy is rebuilt node by node through the same validating constructors
//! the factory uses, under the session of the [`CopyContext`]. The result is
//! structurally equal to the source and owns every child; only interned
//! numeric constant text is shared. Option bags are copied by value.
//!
//! Copying is all or nothing: any failure discards the partial copy and
//! surfaces as [`Error::CopyFailure`] naming the innermost node that could not
//! be rebuilt. The source tree is only ever borrowed.

use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::nodes::{
    AlterTable, AlterTableAction, BinaryExpr, BooleanConstant, ColumnDefinition, ColumnList,
    ColumnReference, ConstraintBody, ConstraintDefinition, CreateIndex, CreateTable, DropIndex,
    DropTable, ForeignKeyDefinition, IndexColumn, IndexColumnList, IndexConstraint,
    IndexDefinition, IsNullExpr, Node, NodeKind, NotExpr, NumericConstant, StatementList,
    StorageFormat, StringConstant, TableElement, TableName, ValueExpr,
};
use tracing::{debug, trace};

/// State threaded through one copy operation.
#[derive(Debug)]
pub struct CopyContext<'a> {
    session: &'a SessionContext,
    depth: usize,
    max_depth: Option<usize>,
    copied: usize,
}

impl<'a> CopyContext<'a> {
    pub fn new(session: &'a SessionContext) -> Self {
        Self {
            session,
            depth: 0,
            max_depth: session.max_copy_depth(),
            copied: 0,
        }
    }

    pub fn session(&self) -> &'a SessionContext {
        self.session
    }

    /// Number of nodes rebuilt so far.
    pub fn copied(&self) -> usize {
        self.copied
    }

    /// Rebuild one node of `kind` one level deeper in the tree.
    fn enter<T>(
        &mut self,
        kind: NodeKind,
        build: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if let Some(max_depth) = self.max_depth.filter(|max| self.depth >= *max) {
            debug!(%kind, max_depth, "copy exceeded depth limit");
            return Err(Error::copy_failure(
                kind,
                format!("tree is deeper than the copy limit of {max_depth}"),
            ));
        }
        self.depth += 1;
        let result = build(self);
        self.depth -= 1;
        match result {
            Ok(value) => {
                self.copied += 1;
                trace!(%kind, depth = self.depth, "copied node");
                Ok(value)
            }
            Err(err @ Error::CopyFailure { .. }) => Err(err),
            Err(err) => Err(Error::copy_failure(kind, err.to_string())),
        }
    }
}

/// A node that can be rebuilt as an independent copy.
pub trait DeepCopy: Sized {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self>;
}

impl<T: DeepCopy> DeepCopy for Option<T> {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        self.as_ref().map(|value| value.deep_copy(cx)).transpose()
    }
}

impl<T: DeepCopy> DeepCopy for Box<T> {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        self.as_ref().deep_copy(cx).map(Box::new)
    }
}

impl DeepCopy for TableName {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::TableName, |_| {
            Ok(TableName::new(self.schema().cloned(), self.name().clone())?.with_span(self.span()))
        })
    }
}

impl DeepCopy for ColumnList {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::ColumnList, |_| {
            Ok(ColumnList::new(self.columns().to_vec())?.with_span(self.span()))
        })
    }
}

impl DeepCopy for ValueExpr {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(self.kind(), |cx| {
            let copy = match self {
                ValueExpr::Column(c) => ValueExpr::Column(ColumnReference::new(
                    c.table().map(|t| t.deep_copy(cx)).transpose()?,
                    c.column().clone(),
                )?),
                ValueExpr::Number(n) => {
                    ValueExpr::Number(NumericConstant::shared(n.interned(), n.span()))
                }
                ValueExpr::String(s) => ValueExpr::String(StringConstant::new(s.value())),
                ValueExpr::Boolean(b) => ValueExpr::Boolean(BooleanConstant::new(b.value())),
                ValueExpr::Null(_) => ValueExpr::null(),
                ValueExpr::Binary(e) => ValueExpr::Binary(Box::new(BinaryExpr::new(
                    e.op(),
                    e.left().deep_copy(cx)?,
                    e.right().deep_copy(cx)?,
                ))),
                ValueExpr::Not(e) => {
                    ValueExpr::Not(Box::new(NotExpr::new(e.operand().deep_copy(cx)?)))
                }
                ValueExpr::IsNull(e) => ValueExpr::IsNull(Box::new(IsNullExpr::new(
                    e.operand().deep_copy(cx)?,
                    e.is_negated(),
                ))),
            };
            Ok(copy.with_span(self.span()))
        })
    }
}

impl DeepCopy for IndexColumn {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::IndexColumn, |cx| {
            let table = self.table().map(|t| t.deep_copy(cx)).transpose()?;
            let copy = IndexColumn::new(table, self.column().clone(), self.is_ascending())?;
            Ok(copy.with_span(self.span()))
        })
    }
}

impl DeepCopy for IndexColumnList {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::IndexColumnList, |cx| {
            let columns = self
                .iter()
                .map(|column| column.deep_copy(cx))
                .collect::<Result<Vec<_>>>()?;
            Ok(IndexColumnList::new(columns)?.with_span(self.span()))
        })
    }
}

impl DeepCopy for StorageFormat {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::StorageFormat, |cx| {
            let copy =
                StorageFormat::new(cx.session(), self.format().clone(), self.options().clone())?;
            Ok(copy.with_span(self.span()))
        })
    }
}

impl DeepCopy for ColumnDefinition {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::ColumnDefinition, |cx| {
            let default = self.default_value().map(|d| d.deep_copy(cx)).transpose()?;
            let copy = ColumnDefinition::new(
                self.name().clone(),
                self.data_type(),
                self.is_not_null(),
                default,
            )?;
            Ok(copy.with_span(self.span()))
        })
    }
}

impl DeepCopy for ConstraintDefinition {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::ConstraintDefinition, |cx| {
            let name = self.name().map(|n| n.deep_copy(cx)).transpose()?;
            let copy = match self.body() {
                ConstraintBody::PrimaryKey { columns } => {
                    ConstraintDefinition::primary_key(name, columns.deep_copy(cx)?)
                }
                ConstraintBody::Unique { columns } => {
                    ConstraintDefinition::unique(name, columns.deep_copy(cx)?)
                }
                ConstraintBody::Check { condition } => {
                    ConstraintDefinition::check(name, condition.deep_copy(cx)?)
                }
                ConstraintBody::ForeignKey(fk) => {
                    let fk = ForeignKeyDefinition {
                        columns: fk.columns.deep_copy(cx)?,
                        ref_table: fk.ref_table.deep_copy(cx)?,
                        ref_columns: fk.ref_columns.deep_copy(cx)?,
                        delete_rule: fk.delete_rule,
                        update_rule: fk.update_rule,
                        match_type: fk.match_type,
                        grouping: fk.grouping,
                        deferrable: fk.deferrable,
                        initially_deferred: fk.initially_deferred,
                    };
                    ConstraintDefinition::foreign_key(cx.session(), name, fk)?
                }
                ConstraintBody::Drop(drop) => {
                    ConstraintDefinition::drop_constraint(cx.session(), name, drop.clone())?
                }
            };
            Ok(copy.with_span(self.span()))
        })
    }
}

impl DeepCopy for IndexConstraint {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::IndexConstraint, |cx| {
            let columns = self.index_columns().deep_copy(cx)?;
            let storage = self.storage_format().map(|s| s.deep_copy(cx)).transpose()?;
            let copy = IndexConstraint::new(
                cx.session(),
                self.name().clone(),
                self.is_unique(),
                columns,
                self.join_type(),
                storage,
            )?;
            Ok(copy.with_span(self.span()))
        })
    }
}

impl DeepCopy for CreateIndex {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::CreateIndex, |cx| {
            let index_name = self.index_name().deep_copy(cx)?;
            let table_name = self.table_name().deep_copy(cx)?;
            let columns = self.index_columns().deep_copy(cx)?;
            let storage = self.storage_format().map(|s| s.deep_copy(cx)).transpose()?;
            CreateIndex::builder(index_name, table_name, columns)
                .unique(self.is_unique())
                .join_type(self.join_type())
                .options(self.options().clone())
                .existence_check(self.existence_check())
                .storage_format(storage)
                .span(self.span())
                .build(cx.session())
        })
    }
}

impl DeepCopy for DropIndex {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::DropIndex, |cx| {
            let name = self.index_name().deep_copy(cx)?;
            Ok(DropIndex::new(name, self.existence_check())?.with_span(self.span()))
        })
    }
}

impl DeepCopy for TableElement {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        Ok(match self {
            TableElement::Column(c) => TableElement::Column(c.deep_copy(cx)?),
            TableElement::Constraint(c) => TableElement::Constraint(c.deep_copy(cx)?),
            TableElement::Index(i) => TableElement::Index(i.deep_copy(cx)?),
        })
    }
}

impl DeepCopy for CreateTable {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::CreateTable, |cx| {
            let name = self.name().deep_copy(cx)?;
            let elements = self
                .elements()
                .iter()
                .map(|e| e.deep_copy(cx))
                .collect::<Result<Vec<_>>>()?;
            let storage = self.storage_format().map(|s| s.deep_copy(cx)).transpose()?;
            let copy = CreateTable::new(name, self.existence_check(), elements, storage)?;
            Ok(copy.with_span(self.span()))
        })
    }
}

impl DeepCopy for DropTable {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::DropTable, |cx| {
            let name = self.name().deep_copy(cx)?;
            let copy = DropTable::new(name, self.existence_check(), self.behavior())?;
            Ok(copy.with_span(self.span()))
        })
    }
}

impl DeepCopy for AlterTableAction {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        Ok(match self {
            AlterTableAction::AddConstraint(c) => {
                AlterTableAction::AddConstraint(c.deep_copy(cx)?)
            }
            AlterTableAction::DropConstraint(c) => {
                AlterTableAction::DropConstraint(c.deep_copy(cx)?)
            }
            AlterTableAction::AddColumn(c) => AlterTableAction::AddColumn(c.deep_copy(cx)?),
            AlterTableAction::DropColumn {
                column,
                existence_check,
            } => AlterTableAction::DropColumn {
                column: column.clone(),
                existence_check: *existence_check,
            },
        })
    }
}

impl DeepCopy for AlterTable {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        cx.enter(NodeKind::AlterTable, |cx| {
            let name = self.name().deep_copy(cx)?;
            let actions = self
                .actions()
                .iter()
                .map(|a| a.deep_copy(cx))
                .collect::<Result<Vec<_>>>()?;
            Ok(AlterTable::new(name, actions)?.with_span(self.span()))
        })
    }
}

impl DeepCopy for Node {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        Ok(match self {
            Node::TableName(n) => Node::TableName(n.deep_copy(cx)?),
            Node::Value(n) => Node::Value(n.deep_copy(cx)?),
            Node::ColumnList(n) => Node::ColumnList(n.deep_copy(cx)?),
            Node::IndexColumn(n) => Node::IndexColumn(n.deep_copy(cx)?),
            Node::IndexColumnList(n) => Node::IndexColumnList(n.deep_copy(cx)?),
            Node::StorageFormat(n) => Node::StorageFormat(n.deep_copy(cx)?),
            Node::ColumnDefinition(n) => Node::ColumnDefinition(n.deep_copy(cx)?),
            Node::Constraint(n) => Node::Constraint(n.deep_copy(cx)?),
            Node::IndexConstraint(n) => Node::IndexConstraint(n.deep_copy(cx)?),
            Node::CreateIndex(n) => Node::CreateIndex(n.deep_copy(cx)?),
            Node::DropIndex(n) => Node::DropIndex(n.deep_copy(cx)?),
            Node::CreateTable(n) => Node::CreateTable(n.deep_copy(cx)?),
            Node::DropTable(n) => Node::DropTable(n.deep_copy(cx)?),
            Node::AlterTable(n) => Node::AlterTable(n.deep_copy(cx)?),
        })
    }
}

impl DeepCopy for StatementList {
    fn deep_copy(&self, cx: &mut CopyContext<'_>) -> Result<Self> {
        let statements = self
            .iter()
            .map(|statement| statement.deep_copy(cx))
            .collect::<Result<Vec<_>>>()?;
        StatementList::new(statements)
    }
}

/// Copy `node` into an independent tree valid under `session`.
pub fn deep_copy(node: &Node, session: &SessionContext) -> Result<Node> {
    let mut cx = CopyContext::new(session);
    let copy = node.deep_copy(&mut cx)?;
    debug!(kind = %node.kind(), nodes = cx.copied(), "deep copy finished");
    Ok(copy)
}

/// Copy every statement of `statements`.
pub fn deep_copy_statements(
    statements: &StatementList,
    session: &SessionContext,
) -> Result<StatementList> {
    let mut cx = CopyContext::new(session);
    let copy = statements.deep_copy(&mut cx)?;
    debug!(statements = copy.len(), nodes = cx.copied(), "deep copy finished");
    Ok(copy)
}
