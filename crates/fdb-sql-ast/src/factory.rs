//! Grammar boundary: builds typed nodes from untyped production values.
//!
//! The grammar front-end reduces a production to a [`NodeKind`] plus a flat
//! list of [`RawValue`]s and hands both to [`NodeFactory::make_node`]. The
//! factory checks arity and argument types against the kind's schema and then
//! calls the typed constructor, so every domain rule lives in exactly one
//! place.
//!
//! Argument schemas, in order (`?` marks arguments that accept
//! [`RawValue::Null`]). An `ident` is a [`RawValue::Str`] for a regular
//! identifier or a [`RawValue::Delimited`] for a delimited one:
//!
//! | Kind | Arguments |
//! |---|---|
//! | `TableName` | schema: ident?, name: ident |
//! | `ColumnReference` | table: TableName?, column: ident |
//! | `NumericConstant` | value: str or int |
//! | `StringConstant` | value: str |
//! | `BooleanConstant` | value: bool |
//! | `NullConstant` | |
//! | `BinaryOperator` | operator: tag, left: value, right: value |
//! | `Not` | operand: value |
//! | `IsNull` | operand: value, negated: bool |
//! | `ColumnList` | columns: list of unqualified ColumnReference |
//! | `IndexColumn` | table: TableName?, column: ident, ascending: bool |
//! | `IndexColumnList` | columns: list of IndexColumn |
//! | `StorageFormat` | format: ident, options: options? |
//! | `ColumnDefinition` | see below |
//! | `ConstraintDefinition` | sub-kind: tag, then per sub-kind (below) |
//! | `IndexConstraint` | see below |
//! | `CreateIndex` | see below |
//! | `DropIndex` | name: TableName, existence: tag? |
//! | `CreateTable` | name: TableName, existence: tag?, elements: list, storage: StorageFormat? |
//! | `DropTable` | name: TableName, existence: tag?, behavior: tag? |
//! | `AlterTable` | name: TableName, actions: list |
//!
//! Longer schemas:
//!
//! * `ColumnDefinition`: name: ident, type: tag, length: int?, scale: int?,
//!   not_null: bool, default: value?
//! * `IndexConstraint`: name: ident, unique: bool, columns: IndexColumnList,
//!   join: tag?, storage: StorageFormat?
//! * `CreateIndex`: unique: bool, name: TableName, table: TableName,
//!   columns: IndexColumnList, join: tag?, options: options?, existence: tag?,
//!   storage: StorageFormat?
//!
//! `ConstraintDefinition` sub-kinds:
//!
//! * `PRIMARY_KEY` / `UNIQUE`: name: TableName?, columns: ColumnList
//! * `CHECK`: name: TableName?, condition: value
//! * `FOREIGN_KEY`: name: TableName?, ref_table: TableName, columns: ColumnList,
//!   ref_columns: ColumnList?, delete: int, update: int, match: tag?,
//!   grouping: bool, deferrable: bool, initially_deferred: bool
//! * `DROP`: name: TableName?, constraint_type: tag, behavior: tag?,
//!   grouping: bool, existence: tag?
//!
//! `AlterTable` actions come as a node list or as a [`RawValue::List`]. Each
//! action is a constraint definition (ADD), a constraint drop (DROP), a column
//! definition (ADD COLUMN) or an unqualified column reference (DROP COLUMN).
//! In a `List`, a DROP COLUMN with an existence check is the pair
//! `[existence: tag?, column: ColumnReference]`.

use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::nodes::{
    AlterTable, AlterTableAction, BinaryOperator, BooleanConstant, ColumnDefinition, ColumnList,
    ColumnReference, ConstraintDefinition, ConstraintDrop, CreateIndex, CreateTable, DataType,
    DropIndex, DropTable, ExistenceCheck, ForeignKeyDefinition, Identifier, IndexColumn,
    IndexColumnList, IndexConstraint, Node, NodeKind, NullConstant, NumericConstant, Options,
    ReferentialAction, Span, StorageFormat, StringConstant, TableElement, TableName, ValueExpr,
};
use std::str::FromStr;
use tracing::debug;

/// An untyped value produced by a reduced grammar production.
#[derive(Debug, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Enumeration tag such as `"CASCADE"` or `"LEFT_OUTER"`
    Tag(String),
    /// Delimited (quoted) identifier text, without the quotes
    Delimited(String),
    Node(Node),
    NodeList(Vec<Node>),
    List(Vec<RawValue>),
    Options(Options),
}

impl RawValue {
    pub fn tag(tag: impl Into<String>) -> Self {
        RawValue::Tag(tag.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        RawValue::Str(value.into())
    }

    pub fn delimited(name: impl Into<String>) -> Self {
        RawValue::Delimited(name.into())
    }

    pub fn node(node: impl Into<Node>) -> Self {
        RawValue::Node(node.into())
    }

    fn describe(&self) -> String {
        match self {
            RawValue::Null => "null".to_string(),
            RawValue::Bool(_) => "bool".to_string(),
            RawValue::Int(_) => "int".to_string(),
            RawValue::Str(_) => "str".to_string(),
            RawValue::Tag(tag) => format!("tag {tag}"),
            RawValue::Delimited(_) => "delimited identifier".to_string(),
            RawValue::Node(node) => format!("{} node", node.kind()),
            RawValue::NodeList(_) => "node list".to_string(),
            RawValue::List(_) => "list".to_string(),
            RawValue::Options(_) => "options".to_string(),
        }
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<Node> for RawValue {
    fn from(node: Node) -> Self {
        RawValue::Node(node)
    }
}

impl From<Vec<Node>> for RawValue {
    fn from(nodes: Vec<Node>) -> Self {
        RawValue::NodeList(nodes)
    }
}

impl From<Options> for RawValue {
    fn from(options: Options) -> Self {
        RawValue::Options(options)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

/// Cursor over the arguments of one construction call.
struct Args {
    kind: NodeKind,
    values: std::vec::IntoIter<RawValue>,
    position: usize,
}

impl Args {
    fn new(kind: NodeKind, values: Vec<RawValue>, arity: usize) -> Result<Self> {
        if values.len() != arity {
            return Err(Error::malformed(
                kind,
                format!("expected {arity} arguments, got {}", values.len()),
            ));
        }
        Ok(Self {
            kind,
            values: values.into_iter(),
            position: 0,
        })
    }

    fn next(&mut self, field: &str) -> Result<RawValue> {
        self.position += 1;
        self.values.next().ok_or_else(|| {
            Error::malformed(self.kind, format!("missing argument {field}"))
        })
    }

    fn mismatch(&self, field: &str, expected: &str, got: &RawValue) -> Error {
        Error::malformed(
            self.kind,
            format!(
                "argument {} ({field}) must be {expected}, got {}",
                self.position,
                got.describe()
            ),
        )
    }

    fn bool(&mut self, field: &str) -> Result<bool> {
        match self.next(field)? {
            RawValue::Bool(value) => Ok(value),
            other => Err(self.mismatch(field, "a bool", &other)),
        }
    }

    fn int(&mut self, field: &str) -> Result<i64> {
        match self.next(field)? {
            RawValue::Int(value) => Ok(value),
            other => Err(self.mismatch(field, "an int", &other)),
        }
    }

    fn opt_int(&mut self, field: &str) -> Result<Option<i64>> {
        match self.next(field)? {
            RawValue::Null => Ok(None),
            RawValue::Int(value) => Ok(Some(value)),
            other => Err(self.mismatch(field, "an int or null", &other)),
        }
    }

    fn str(&mut self, field: &str) -> Result<String> {
        match self.next(field)? {
            RawValue::Str(value) => Ok(value),
            other => Err(self.mismatch(field, "a str", &other)),
        }
    }

    fn ident(&mut self, field: &str) -> Result<Identifier> {
        match self.next(field)? {
            RawValue::Str(name) => Ok(Identifier::new(name)),
            RawValue::Delimited(name) => Ok(Identifier::quoted(name)),
            other => Err(self.mismatch(field, "an identifier", &other)),
        }
    }

    fn opt_ident(&mut self, field: &str) -> Result<Option<Identifier>> {
        match self.next(field)? {
            RawValue::Null => Ok(None),
            RawValue::Str(name) => Ok(Some(Identifier::new(name))),
            RawValue::Delimited(name) => Ok(Some(Identifier::quoted(name))),
            other => Err(self.mismatch(field, "an identifier or null", &other)),
        }
    }

    fn parse_tag<T>(&self, field: &str, tag: &str) -> Result<T>
    where
        T: FromStr<Err = String>,
    {
        tag.parse()
            .map_err(|message: String| Error::malformed(self.kind, format!("{field}: {message}")))
    }

    fn tag<T>(&mut self, field: &str) -> Result<T>
    where
        T: FromStr<Err = String>,
    {
        match self.next(field)? {
            RawValue::Tag(tag) => self.parse_tag(field, &tag),
            other => Err(self.mismatch(field, "a tag", &other)),
        }
    }

    fn opt_tag<T>(&mut self, field: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = String>,
    {
        match self.next(field)? {
            RawValue::Null => Ok(None),
            RawValue::Tag(tag) => self.parse_tag(field, &tag).map(Some),
            other => Err(self.mismatch(field, "a tag or null", &other)),
        }
    }

    fn existence(&mut self) -> Result<ExistenceCheck> {
        Ok(self.opt_tag("existence_check")?.unwrap_or_default())
    }

    fn expect_node<T>(&self, field: &str, expected: NodeKind, node: Node) -> Result<T>
    where
        T: TryFrom<Node, Error = Node>,
    {
        T::try_from(node).map_err(|other| {
            self.mismatch(field, &format!("a {expected} node"), &RawValue::Node(other))
        })
    }

    fn node<T>(&mut self, field: &str, expected: NodeKind) -> Result<T>
    where
        T: TryFrom<Node, Error = Node>,
    {
        match self.next(field)? {
            RawValue::Node(node) => self.expect_node(field, expected, node),
            other => Err(self.mismatch(field, &format!("a {expected} node"), &other)),
        }
    }

    fn opt_node<T>(&mut self, field: &str, expected: NodeKind) -> Result<Option<T>>
    where
        T: TryFrom<Node, Error = Node>,
    {
        match self.next(field)? {
            RawValue::Null => Ok(None),
            RawValue::Node(node) => self.expect_node(field, expected, node).map(Some),
            other => Err(self.mismatch(field, &format!("a {expected} node or null"), &other)),
        }
    }

    fn value(&mut self, field: &str) -> Result<ValueExpr> {
        match self.next(field)? {
            RawValue::Node(Node::Value(value)) => Ok(value),
            other => Err(self.mismatch(field, "a value expression", &other)),
        }
    }

    fn opt_value(&mut self, field: &str) -> Result<Option<ValueExpr>> {
        match self.next(field)? {
            RawValue::Null => Ok(None),
            RawValue::Node(Node::Value(value)) => Ok(Some(value)),
            other => Err(self.mismatch(field, "a value expression or null", &other)),
        }
    }

    fn node_list(&mut self, field: &str) -> Result<Vec<Node>> {
        match self.next(field)? {
            RawValue::NodeList(nodes) => Ok(nodes),
            other => Err(self.mismatch(field, "a node list", &other)),
        }
    }

    fn opt_options(&mut self, field: &str) -> Result<Options> {
        match self.next(field)? {
            RawValue::Null => Ok(Options::new()),
            RawValue::Options(options) => Ok(options),
            other => Err(self.mismatch(field, "options or null", &other)),
        }
    }

    fn referential_action(&mut self, field: &str) -> Result<ReferentialAction> {
        let code = self.int(field)?;
        ReferentialAction::try_from(code)
            .map_err(|message| Error::malformed(self.kind, format!("{field}: {message}")))
    }
}

/// Builds nodes for one parse session.
#[derive(Debug, Clone, Copy)]
pub struct NodeFactory<'a> {
    ctx: &'a SessionContext,
}

impl<'a> NodeFactory<'a> {
    pub fn new(ctx: &'a SessionContext) -> Self {
        Self { ctx }
    }

    pub fn session(&self) -> &'a SessionContext {
        self.ctx
    }

    /// Build a node of `kind` from raw production values.
    pub fn make_node(&self, kind: NodeKind, args: Vec<RawValue>) -> Result<Node> {
        self.build(kind, args).map_err(|err| {
            debug!(%kind, error = %err, "node construction rejected");
            err
        })
    }

    /// [`make_node`](Self::make_node), recording the source position.
    pub fn make_node_at(&self, kind: NodeKind, span: Span, args: Vec<RawValue>) -> Result<Node> {
        self.make_node(kind, args).map(|node| node.with_span(span))
    }

    fn build(&self, kind: NodeKind, args: Vec<RawValue>) -> Result<Node> {
        let node = match kind {
            NodeKind::TableName => {
                let mut a = Args::new(kind, args, 2)?;
                let schema = a.opt_ident("schema")?;
                let name = a.ident("name")?;
                TableName::new(schema, name)?.into()
            }
            NodeKind::ColumnReference => {
                let mut a = Args::new(kind, args, 2)?;
                let table = a.opt_node("table", NodeKind::TableName)?;
                let column = a.ident("column")?;
                ValueExpr::Column(ColumnReference::new(table, column)?).into()
            }
            NodeKind::NumericConstant => {
                let mut a = Args::new(kind, args, 1)?;
                let text = match a.next("value")? {
                    RawValue::Str(text) => text,
                    RawValue::Int(value) => value.to_string(),
                    other => return Err(a.mismatch("value", "a str or int", &other)),
                };
                ValueExpr::Number(NumericConstant::new(&text)?).into()
            }
            NodeKind::StringConstant => {
                let mut a = Args::new(kind, args, 1)?;
                ValueExpr::String(StringConstant::new(a.str("value")?)).into()
            }
            NodeKind::BooleanConstant => {
                let mut a = Args::new(kind, args, 1)?;
                ValueExpr::Boolean(BooleanConstant::new(a.bool("value")?)).into()
            }
            NodeKind::NullConstant => {
                Args::new(kind, args, 0)?;
                ValueExpr::Null(NullConstant::default()).into()
            }
            NodeKind::BinaryOperator => {
                let mut a = Args::new(kind, args, 3)?;
                let op: BinaryOperator = a.tag("operator")?;
                let left = a.value("left")?;
                let right = a.value("right")?;
                ValueExpr::binary(op, left, right).into()
            }
            NodeKind::Not => {
                let mut a = Args::new(kind, args, 1)?;
                ValueExpr::not(a.value("operand")?).into()
            }
            NodeKind::IsNull => {
                let mut a = Args::new(kind, args, 2)?;
                let operand = a.value("operand")?;
                ValueExpr::is_null(operand, a.bool("negated")?).into()
            }
            NodeKind::ColumnList => {
                let mut a = Args::new(kind, args, 1)?;
                let mut columns = Vec::new();
                for node in a.node_list("columns")? {
                    let column = match node {
                        Node::Value(ValueExpr::Column(column)) => column,
                        other => {
                            return Err(Error::malformed(
                                kind,
                                format!("expected a column reference, got {}", other.kind()),
                            ))
                        }
                    };
                    if let Some(table) = column.table() {
                        return Err(Error::malformed(
                            kind,
                            format!("column {}.{} must not be qualified", table, column.column()),
                        ));
                    }
                    columns.push(column.column().clone());
                }
                ColumnList::new(columns)?.into()
            }
            NodeKind::IndexColumn => {
                let mut a = Args::new(kind, args, 3)?;
                let table = a.opt_node("table", NodeKind::TableName)?;
                let column = a.ident("column")?;
                IndexColumn::new(table, column, a.bool("ascending")?)?.into()
            }
            NodeKind::IndexColumnList => {
                let mut a = Args::new(kind, args, 1)?;
                let columns = a
                    .node_list("columns")?
                    .into_iter()
                    .map(|node| a.expect_node("columns", NodeKind::IndexColumn, node))
                    .collect::<Result<Vec<IndexColumn>>>()?;
                IndexColumnList::new(columns)?.into()
            }
            NodeKind::StorageFormat => {
                let mut a = Args::new(kind, args, 2)?;
                let format = a.ident("format")?;
                let options = a.opt_options("options")?;
                StorageFormat::new(self.ctx, format, options)?.into()
            }
            NodeKind::ColumnDefinition => {
                let mut a = Args::new(kind, args, 6)?;
                let name = a.ident("name")?;
                let tag = match a.next("data_type")? {
                    RawValue::Tag(tag) => tag,
                    other => return Err(a.mismatch("data_type", "a tag", &other)),
                };
                let length = a.opt_int("length")?;
                let scale = a.opt_int("scale")?;
                let data_type = DataType::from_parts(&tag, length, scale)?;
                let not_null = a.bool("not_null")?;
                let default = a.opt_value("default")?;
                ColumnDefinition::new(name, data_type, not_null, default)?.into()
            }
            NodeKind::ConstraintDefinition => self.constraint(args)?.into(),
            NodeKind::IndexConstraint => {
                let mut a = Args::new(kind, args, 5)?;
                let name = a.ident("name")?;
                let unique = a.bool("unique")?;
                let columns = a.node("columns", NodeKind::IndexColumnList)?;
                let join_type = a.opt_tag("join_type")?;
                let storage = a.opt_node("storage_format", NodeKind::StorageFormat)?;
                IndexConstraint::new(self.ctx, name, unique, columns, join_type, storage)?.into()
            }
            NodeKind::CreateIndex => {
                let mut a = Args::new(kind, args, 8)?;
                let unique = a.bool("unique")?;
                let index_name = a.node("index_name", NodeKind::TableName)?;
                let table_name = a.node("table_name", NodeKind::TableName)?;
                let columns = a.node("columns", NodeKind::IndexColumnList)?;
                let join_type = a.opt_tag("join_type")?;
                let options = a.opt_options("options")?;
                let existence_check = a.existence()?;
                let storage = a.opt_node("storage_format", NodeKind::StorageFormat)?;
                CreateIndex::builder(index_name, table_name, columns)
                    .unique(unique)
                    .join_type(join_type)
                    .options(options)
                    .existence_check(existence_check)
                    .storage_format(storage)
                    .build(self.ctx)?
                    .into()
            }
            NodeKind::DropIndex => {
                let mut a = Args::new(kind, args, 2)?;
                let name = a.node("index_name", NodeKind::TableName)?;
                DropIndex::new(name, a.existence()?)?.into()
            }
            NodeKind::CreateTable => {
                let mut a = Args::new(kind, args, 4)?;
                let name = a.node("name", NodeKind::TableName)?;
                let existence_check = a.existence()?;
                let elements = a
                    .node_list("elements")?
                    .into_iter()
                    .map(|node| match node {
                        Node::ColumnDefinition(c) => Ok(TableElement::Column(c)),
                        Node::Constraint(c) => Ok(TableElement::Constraint(*c)),
                        Node::IndexConstraint(i) => Ok(TableElement::Index(*i)),
                        other => Err(Error::malformed(
                            kind,
                            format!("{} cannot appear in a table definition", other.kind()),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                let storage = a.opt_node("storage_format", NodeKind::StorageFormat)?;
                CreateTable::new(name, existence_check, elements, storage)?.into()
            }
            NodeKind::DropTable => {
                let mut a = Args::new(kind, args, 3)?;
                let name = a.node("name", NodeKind::TableName)?;
                let existence_check = a.existence()?;
                DropTable::new(name, existence_check, a.opt_tag("behavior")?)?.into()
            }
            NodeKind::AlterTable => {
                let mut a = Args::new(kind, args, 2)?;
                let name = a.node("name", NodeKind::TableName)?;
                let items = match a.next("actions")? {
                    RawValue::NodeList(nodes) => nodes.into_iter().map(RawValue::Node).collect(),
                    RawValue::List(items) => items,
                    other => return Err(a.mismatch("actions", "a list", &other)),
                };
                let actions = items
                    .into_iter()
                    .map(alter_table_action)
                    .collect::<Result<Vec<_>>>()?;
                AlterTable::new(name, actions)?.into()
            }
        };
        Ok(node)
    }

    fn constraint(&self, mut args: Vec<RawValue>) -> Result<ConstraintDefinition> {
        let kind = NodeKind::ConstraintDefinition;
        if args.is_empty() {
            return Err(Error::malformed(kind, "missing constraint sub-kind"));
        }
        let sub_kind = match args.remove(0) {
            RawValue::Tag(tag) => tag,
            other => {
                return Err(Error::malformed(
                    kind,
                    format!("argument 1 (sub_kind) must be a tag, got {}", other.describe()),
                ))
            }
        };
        match sub_kind.as_str() {
            "PRIMARY_KEY" | "UNIQUE" => {
                let mut a = Args::new(kind, args, 2)?;
                let name = a.opt_node("name", NodeKind::TableName)?;
                let columns = a.node("columns", NodeKind::ColumnList)?;
                Ok(if sub_kind == "UNIQUE" {
                    ConstraintDefinition::unique(name, columns)
                } else {
                    ConstraintDefinition::primary_key(name, columns)
                })
            }
            "CHECK" => {
                let mut a = Args::new(kind, args, 2)?;
                let name = a.opt_node("name", NodeKind::TableName)?;
                Ok(ConstraintDefinition::check(name, a.value("condition")?))
            }
            "FOREIGN_KEY" => {
                let mut a = Args::new(kind, args, 10)?;
                let name = a.opt_node("name", NodeKind::TableName)?;
                let ref_table = a.node("ref_table", NodeKind::TableName)?;
                let columns = a.node("columns", NodeKind::ColumnList)?;
                let ref_columns = a.opt_node("ref_columns", NodeKind::ColumnList)?;
                let mut fk = ForeignKeyDefinition::new(columns, ref_table, ref_columns);
                fk.delete_rule = a.referential_action("delete_rule")?;
                fk.update_rule = a.referential_action("update_rule")?;
                fk.match_type = a.opt_tag("match_type")?;
                fk.grouping = a.bool("grouping")?;
                fk.deferrable = a.bool("deferrable")?;
                fk.initially_deferred = a.bool("initially_deferred")?;
                ConstraintDefinition::foreign_key(self.ctx, name, fk)
            }
            "DROP" => {
                let mut a = Args::new(kind, args, 5)?;
                let name = a.opt_node("name", NodeKind::TableName)?;
                let mut drop = ConstraintDrop::new(a.tag("constraint_type")?);
                drop.behavior = a.opt_tag("behavior")?;
                drop.grouping = a.bool("grouping")?;
                drop.existence_check = a.existence()?;
                ConstraintDefinition::drop_constraint(self.ctx, name, drop)
            }
            other => Err(Error::malformed(
                kind,
                format!("unknown constraint sub-kind {other}"),
            )),
        }
    }
}

fn alter_table_action(item: RawValue) -> Result<AlterTableAction> {
    let kind = NodeKind::AlterTable;
    match item {
        RawValue::Node(Node::Constraint(c)) => Ok(AlterTableAction::constraint(*c)),
        RawValue::Node(Node::ColumnDefinition(c)) => Ok(AlterTableAction::AddColumn(c)),
        RawValue::Node(Node::Value(ValueExpr::Column(c))) => {
            drop_column(c, ExistenceCheck::NoCondition)
        }
        RawValue::List(pair) => {
            let mut a = Args::new(kind, pair, 2)?;
            let existence_check = a.existence()?;
            match a.value("column")? {
                ValueExpr::Column(c) => drop_column(c, existence_check),
                other => Err(Error::malformed(
                    kind,
                    format!("DROP COLUMN needs a column reference, got {}", other.kind()),
                )),
            }
        }
        RawValue::Node(other) => Err(Error::malformed(
            kind,
            format!("{} is not an ALTER TABLE action", other.kind()),
        )),
        other => Err(Error::malformed(
            kind,
            format!("{} is not an ALTER TABLE action", other.describe()),
        )),
    }
}

fn drop_column(
    column: ColumnReference,
    existence_check: ExistenceCheck,
) -> Result<AlterTableAction> {
    if let Some(table) = column.table() {
        return Err(Error::malformed(
            NodeKind::AlterTable,
            format!("DROP COLUMN {}.{} must not be qualified", table, column.column()),
        ));
    }
    Ok(AlterTableAction::DropColumn {
        column: column.column().clone(),
        existence_check,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;
    use crate::nodes::{ConstraintType, IndexDefinition, MatchType};

    fn table(name: &str) -> RawValue {
        RawValue::node(TableName::parse(name).unwrap())
    }

    fn columns(factory: &NodeFactory<'_>, names: &[&str]) -> RawValue {
        let refs = names
            .iter()
            .map(|n| {
                factory
                    .make_node(NodeKind::ColumnReference, vec![RawValue::Null, RawValue::str(*n)])
                    .unwrap()
            })
            .collect::<Vec<_>>();
        factory
            .make_node(NodeKind::ColumnList, vec![refs.into()])
            .unwrap()
            .into()
    }

    fn index_columns(factory: &NodeFactory<'_>) -> RawValue {
        let c1 = factory
            .make_node(
                NodeKind::IndexColumn,
                vec![RawValue::Null, RawValue::str("c1"), true.into()],
            )
            .unwrap();
        factory
            .make_node(NodeKind::IndexColumnList, vec![vec![c1].into()])
            .unwrap()
            .into()
    }

    fn fk_args(factory: &NodeFactory<'_>, delete: i64, grouping: bool) -> Vec<RawValue> {
        vec![
            RawValue::tag("FOREIGN_KEY"),
            RawValue::Null,
            table("parent"),
            columns(factory, &["pid"]),
            columns(factory, &["id"]),
            RawValue::Int(delete),
            RawValue::Int(2),
            RawValue::tag("FULL"),
            grouping.into(),
            false.into(),
            false.into(),
        ]
    }

    #[test]
    fn test_create_index_from_raw_values() {
        let ctx = SessionContext::new();
        let factory = NodeFactory::new(&ctx);
        let args = vec![
            true.into(),
            table("idx1"),
            table("t1"),
            index_columns(&factory),
            RawValue::Null,
            RawValue::Null,
            RawValue::Null,
            RawValue::Null,
        ];
        let node = factory.make_node(NodeKind::CreateIndex, args).unwrap();
        assert!(node.as_index_definition().unwrap().is_unique());
    }

    #[test]
    fn test_non_bool_unique_is_malformed() {
        let ctx = SessionContext::new();
        let factory = NodeFactory::new(&ctx);
        let args = vec![
            RawValue::str("yes"),
            table("idx1"),
            table("t1"),
            index_columns(&factory),
            RawValue::Null,
            RawValue::Null,
            RawValue::Null,
            RawValue::Null,
        ];
        let err = factory.make_node(NodeKind::CreateIndex, args).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedConstruction { kind: NodeKind::CreateIndex, .. }
        ));
    }

    #[test]
    fn test_arity_is_checked() {
        let ctx = SessionContext::new();
        let factory = NodeFactory::new(&ctx);
        let err = factory
            .make_node(NodeKind::TableName, vec![RawValue::str("t1")])
            .unwrap_err();
        assert_eq!(
            err,
            Error::malformed(NodeKind::TableName, "expected 2 arguments, got 1")
        );
    }

    #[test]
    fn test_foreign_key_action_codes() {
        let ctx = SessionContext::new();
        let factory = NodeFactory::new(&ctx);
        let node = factory
            .make_node(NodeKind::ConstraintDefinition, fk_args(&factory, 0, false))
            .unwrap();
        let Node::Constraint(fk) = node else {
            panic!("expected a constraint");
        };
        assert_eq!(fk.delete_rule(), Ok(ReferentialAction::Cascade));
        assert_eq!(fk.update_rule(), Ok(ReferentialAction::NoAction));
        assert_eq!(fk.match_type(), Ok(Some(MatchType::Full)));

        let err = factory
            .make_node(NodeKind::ConstraintDefinition, fk_args(&factory, 7, false))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedConstruction { .. }));
    }

    #[test]
    fn test_grouping_surfaces_feature_error() {
        let mut ctx = SessionContext::new();
        let err = NodeFactory::new(&ctx)
            .make_node(NodeKind::ConstraintDefinition, fk_args(&NodeFactory::new(&ctx), 2, true))
            .unwrap_err();
        assert_eq!(err, Error::FeatureDisabled(Feature::TableGrouping));

        ctx.features_mut().enable_feature(Feature::TableGrouping);
        let factory = NodeFactory::new(&ctx);
        let node = factory
            .make_node(NodeKind::ConstraintDefinition, fk_args(&factory, 2, true))
            .unwrap();
        let Node::Constraint(fk) = node else {
            panic!("expected a constraint");
        };
        assert_eq!(fk.is_grouping(), Ok(true));
    }

    #[test]
    fn test_drop_constraint_sub_kind() {
        let ctx = SessionContext::new();
        let factory = NodeFactory::new(&ctx);
        let node = factory
            .make_node(
                NodeKind::ConstraintDefinition,
                vec![
                    RawValue::tag("DROP"),
                    table("fk1"),
                    RawValue::tag("FOREIGN_KEY"),
                    RawValue::tag("CASCADE"),
                    false.into(),
                    RawValue::tag("IF_EXISTS"),
                ],
            )
            .unwrap();
        let Node::Constraint(drop) = node else {
            panic!("expected a constraint");
        };
        assert_eq!(drop.constraint_type(), ConstraintType::ForeignKey);
        assert!(drop.ref_table_name().is_err());
    }

    #[test]
    fn test_qualified_column_rejected_in_column_list() {
        let ctx = SessionContext::new();
        let factory = NodeFactory::new(&ctx);
        let qualified = factory
            .make_node(NodeKind::ColumnReference, vec![table("t"), RawValue::str("a")])
            .unwrap();
        let err = factory
            .make_node(NodeKind::ColumnList, vec![vec![qualified].into()])
            .unwrap_err();
        assert_eq!(err.kind(), Some(NodeKind::ColumnList));
    }

    #[test]
    fn test_unknown_tag_is_malformed() {
        let ctx = SessionContext::new();
        let factory = NodeFactory::new(&ctx);
        let err = factory
            .make_node(
                NodeKind::DropTable,
                vec![table("t"), RawValue::Null, RawValue::tag("SOMETIMES")],
            )
            .unwrap_err();
        assert!(matches!(err, Error::MalformedConstruction { kind: NodeKind::DropTable, .. }));
    }

    #[test]
    fn test_make_node_at_records_span() {
        let ctx = SessionContext::new();
        let node = NodeFactory::new(&ctx)
            .make_node_at(NodeKind::NullConstant, Span::new(3, 7), vec![])
            .unwrap();
        assert_eq!(node.span(), Span::new(3, 7));
    }

    #[test]
    fn test_delimited_identifiers_keep_quoting() {
        let ctx = SessionContext::new();
        let node = NodeFactory::new(&ctx)
            .make_node(
                NodeKind::TableName,
                vec![RawValue::Null, RawValue::delimited("orders")],
            )
            .unwrap();
        let name = TableName::try_from(node).unwrap();
        assert!(name.name().is_quoted());
        assert_eq!(name.to_string(), "\"orders\"");
    }

    #[test]
    fn test_drop_column_with_existence_check() {
        let ctx = SessionContext::new();
        let factory = NodeFactory::new(&ctx);
        let column = |table: RawValue| {
            factory
                .make_node(NodeKind::ColumnReference, vec![table, RawValue::str("legacy")])
                .unwrap()
        };
        let actions = RawValue::List(vec![RawValue::List(vec![
            RawValue::tag("IF_EXISTS"),
            column(RawValue::Null).into(),
        ])]);
        let node = factory
            .make_node(NodeKind::AlterTable, vec![table("t1"), actions])
            .unwrap();
        let alter = AlterTable::try_from(node).unwrap();
        assert_eq!(
            alter.actions(),
            &[AlterTableAction::DropColumn {
                column: Identifier::new("legacy"),
                existence_check: ExistenceCheck::IfExists,
            }]
        );

        let err = factory
            .make_node(
                NodeKind::AlterTable,
                vec![table("t1"), vec![column(table("t2"))].into()],
            )
            .unwrap_err();
        assert!(err.to_string().contains("must not be qualified"), "{err}");

        let err = factory
            .make_node(
                NodeKind::AlterTable,
                vec![
                    table("t1"),
                    RawValue::List(vec![RawValue::List(vec![
                        RawValue::tag("IF_NOT_EXISTS"),
                        column(RawValue::Null).into(),
                    ])]),
                ],
            )
            .unwrap_err();
        assert_eq!(err.kind(), Some(NodeKind::AlterTable));
    }
}
