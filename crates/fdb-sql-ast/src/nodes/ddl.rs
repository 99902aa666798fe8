//! DDL statements and the table elements they contain.

use super::index::check_index_shape;
use super::{
    ConstraintDefinition, DropBehavior, ExistenceCheck, Identifier, IndexColumnList,
    IndexConstraint, IndexDefinition, JoinType, NodeKind, Options, Span, StorageFormat, TableName,
    ValueExpr,
};
use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::features::Feature;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A statement that names exactly one schema object.
pub trait DdlStatement {
    /// The object the statement creates, drops or alters.
    fn object_name(&self) -> &TableName;

    /// Statement keywords, e.g. `"CREATE INDEX"`.
    fn statement_name(&self) -> &'static str;
}

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Int,
    BigInt,
    SmallInt,
    Boolean,
    Double,
    Real,
    Decimal { precision: u32, scale: u32 },
    Varchar(u32),
    Char(u32),
    Date,
    Time,
    Timestamp,
    Clob,
    Blob,
}

impl DataType {
    /// Build a type from its grammar tag and optional length/scale.
    pub fn from_parts(tag: &str, length: Option<i64>, scale: Option<i64>) -> Result<Self> {
        let kind = NodeKind::ColumnDefinition;
        let positive = |value: Option<i64>, what: &str| -> Result<u32> {
            let value =
                value.ok_or_else(|| Error::malformed(kind, format!("{tag} needs a {what}")))?;
            u32::try_from(value).ok().filter(|v| *v > 0).ok_or_else(|| {
                Error::malformed(kind, format!("{tag} {what} must be positive, got {value}"))
            })
        };
        let no_params = |ty: DataType| -> Result<DataType> {
            if length.is_some() || scale.is_some() {
                return Err(Error::malformed(kind, format!("{tag} takes no parameters")));
            }
            Ok(ty)
        };
        match tag {
            "INT" | "INTEGER" => no_params(DataType::Int),
            "BIGINT" => no_params(DataType::BigInt),
            "SMALLINT" => no_params(DataType::SmallInt),
            "BOOLEAN" => no_params(DataType::Boolean),
            "DOUBLE" => no_params(DataType::Double),
            "REAL" => no_params(DataType::Real),
            "DATE" => no_params(DataType::Date),
            "TIME" => no_params(DataType::Time),
            "TIMESTAMP" => no_params(DataType::Timestamp),
            "CLOB" => no_params(DataType::Clob),
            "BLOB" => no_params(DataType::Blob),
            "VARCHAR" => {
                if scale.is_some() {
                    return Err(Error::malformed(kind, "VARCHAR takes no scale"));
                }
                Ok(DataType::Varchar(positive(length, "length")?))
            }
            "CHAR" => {
                if scale.is_some() {
                    return Err(Error::malformed(kind, "CHAR takes no scale"));
                }
                Ok(DataType::Char(positive(length, "length")?))
            }
            "DECIMAL" => {
                let precision = positive(length, "precision")?;
                let scale = match scale {
                    None => 0,
                    Some(s) => u32::try_from(s).map_err(|_| {
                        Error::malformed(
                            kind,
                            format!("DECIMAL scale must not be negative, got {s}"),
                        )
                    })?,
                };
                DataType::decimal(precision, scale)
            }
            other => Err(Error::malformed(kind, format!("unknown data type {other}"))),
        }
    }

    pub fn decimal(precision: u32, scale: u32) -> Result<Self> {
        if precision == 0 || scale > precision {
            return Err(Error::malformed(
                NodeKind::ColumnDefinition,
                format!("invalid DECIMAL({precision}, {scale})"),
            ));
        }
        Ok(DataType::Decimal { precision, scale })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => f.write_str("INT"),
            DataType::BigInt => f.write_str("BIGINT"),
            DataType::SmallInt => f.write_str("SMALLINT"),
            DataType::Boolean => f.write_str("BOOLEAN"),
            DataType::Double => f.write_str("DOUBLE"),
            DataType::Real => f.write_str("REAL"),
            DataType::Decimal { precision, scale } => write!(f, "DECIMAL({precision}, {scale})"),
            DataType::Varchar(n) => write!(f, "VARCHAR({n})"),
            DataType::Char(n) => write!(f, "CHAR({n})"),
            DataType::Date => f.write_str("DATE"),
            DataType::Time => f.write_str("TIME"),
            DataType::Timestamp => f.write_str("TIMESTAMP"),
            DataType::Clob => f.write_str("CLOB"),
            DataType::Blob => f.write_str("BLOB"),
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Parameterless types only; use [`DataType::from_parts`] for the rest.
    fn from_str(s: &str) -> Result<Self> {
        DataType::from_parts(s, None, None)
    }
}

/// `<name> <type> [DEFAULT <expr>] [NOT NULL]`
#[derive(Debug, PartialEq, Serialize)]
pub struct ColumnDefinition {
    name: Identifier,
    data_type: DataType,
    not_null: bool,
    default: Option<ValueExpr>,
    #[serde(skip)]
    span: Span,
}

impl ColumnDefinition {
    pub fn new(
        name: Identifier,
        data_type: DataType,
        not_null: bool,
        default: Option<ValueExpr>,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::malformed(
                NodeKind::ColumnDefinition,
                "column name must not be empty",
            ));
        }
        Ok(Self {
            name,
            data_type,
            not_null,
            default,
            span: Span::default(),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    pub fn default_value(&self) -> Option<&ValueExpr> {
        self.default.as_ref()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_not_null(&mut self, not_null: bool) {
        self.not_null = not_null;
    }
}

/// CREATE INDEX statement
#[derive(Debug, PartialEq, Serialize)]
pub struct CreateIndex {
    unique: bool,
    index_name: TableName,
    table_name: TableName,
    columns: IndexColumnList,
    join_type: Option<JoinType>,
    options: Options,
    existence_check: ExistenceCheck,
    storage_format: Option<StorageFormat>,
    #[serde(skip)]
    span: Span,
}

/// Collects the fields of a [`CreateIndex`] and validates them in one
/// [`build`](CreateIndexBuilder::build) call.
#[derive(Debug)]
pub struct CreateIndexBuilder {
    unique: bool,
    index_name: TableName,
    table_name: TableName,
    columns: IndexColumnList,
    join_type: Option<JoinType>,
    options: Options,
    existence_check: ExistenceCheck,
    storage_format: Option<StorageFormat>,
    span: Span,
}

impl CreateIndexBuilder {
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn join_type(mut self, join_type: Option<JoinType>) -> Self {
        self.join_type = join_type;
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn existence_check(mut self, existence_check: ExistenceCheck) -> Self {
        self.existence_check = existence_check;
        self
    }

    pub fn storage_format(mut self, storage_format: Option<StorageFormat>) -> Self {
        self.storage_format = storage_format;
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn build(self, ctx: &SessionContext) -> Result<CreateIndex> {
        let kind = NodeKind::CreateIndex;
        self.existence_check.check_create(kind)?;
        check_index_shape(ctx, kind, &self.columns, self.join_type)?;
        if !self.options.is_empty() {
            ctx.require(kind, Feature::IndexOptions)?;
            self.options.check_keys(kind)?;
        }
        if self.join_type.is_none() {
            if let Some(other) = self
                .columns
                .iter()
                .filter_map(|c| c.table())
                .find(|t| !t.same_object(&self.table_name))
            {
                return Err(Error::malformed(
                    kind,
                    format!("column of table {other} in an index on {}", self.table_name),
                ));
            }
        }
        Ok(CreateIndex {
            unique: self.unique,
            index_name: self.index_name,
            table_name: self.table_name,
            columns: self.columns,
            join_type: self.join_type,
            options: self.options,
            existence_check: self.existence_check,
            storage_format: self.storage_format,
            span: self.span,
        })
    }
}

impl CreateIndex {
    /// Start building an index on `table_name`.
    pub fn builder(
        index_name: TableName,
        table_name: TableName,
        columns: IndexColumnList,
    ) -> CreateIndexBuilder {
        CreateIndexBuilder {
            unique: false,
            index_name,
            table_name,
            columns,
            join_type: None,
            options: Options::new(),
            existence_check: ExistenceCheck::NoCondition,
            storage_format: None,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn index_name(&self) -> &TableName {
        &self.index_name
    }

    pub fn table_name(&self) -> &TableName {
        &self.table_name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable access for rewrite passes.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn existence_check(&self) -> ExistenceCheck {
        self.existence_check
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    pub fn set_index_name(&mut self, index_name: TableName) {
        self.index_name = index_name;
    }

    pub fn index_columns_mut(&mut self) -> &mut IndexColumnList {
        &mut self.columns
    }
}

impl IndexDefinition for CreateIndex {
    fn is_unique(&self) -> bool {
        self.unique
    }

    fn index_columns(&self) -> &IndexColumnList {
        &self.columns
    }

    fn join_type(&self) -> Option<JoinType> {
        self.join_type
    }

    fn storage_format(&self) -> Option<&StorageFormat> {
        self.storage_format.as_ref()
    }
}

impl DdlStatement for CreateIndex {
    fn object_name(&self) -> &TableName {
        &self.index_name
    }

    fn statement_name(&self) -> &'static str {
        "CREATE INDEX"
    }
}

/// DROP INDEX statement
#[derive(Debug, PartialEq, Serialize)]
pub struct DropIndex {
    index_name: TableName,
    existence_check: ExistenceCheck,
    #[serde(skip)]
    span: Span,
}

impl DropIndex {
    pub fn new(index_name: TableName, existence_check: ExistenceCheck) -> Result<Self> {
        existence_check.check_drop(NodeKind::DropIndex)?;
        Ok(Self {
            index_name,
            existence_check,
            span: Span::default(),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn index_name(&self) -> &TableName {
        &self.index_name
    }

    pub fn existence_check(&self) -> ExistenceCheck {
        self.existence_check
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl DdlStatement for DropIndex {
    fn object_name(&self) -> &TableName {
        &self.index_name
    }

    fn statement_name(&self) -> &'static str {
        "DROP INDEX"
    }
}

/// An element between the parentheses of a CREATE TABLE.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableElement {
    Column(ColumnDefinition),
    Constraint(ConstraintDefinition),
    Index(IndexConstraint),
}

impl TableElement {
    pub fn kind(&self) -> NodeKind {
        match self {
            TableElement::Column(_) => NodeKind::ColumnDefinition,
            TableElement::Constraint(_) => NodeKind::ConstraintDefinition,
            TableElement::Index(_) => NodeKind::IndexConstraint,
        }
    }
}

/// CREATE TABLE statement
#[derive(Debug, PartialEq, Serialize)]
pub struct CreateTable {
    name: TableName,
    existence_check: ExistenceCheck,
    elements: Vec<TableElement>,
    storage_format: Option<StorageFormat>,
    #[serde(skip)]
    span: Span,
}

impl CreateTable {
    pub fn new(
        name: TableName,
        existence_check: ExistenceCheck,
        elements: Vec<TableElement>,
        storage_format: Option<StorageFormat>,
    ) -> Result<Self> {
        let kind = NodeKind::CreateTable;
        existence_check.check_create(kind)?;
        let mut columns = HashSet::new();
        for element in &elements {
            match element {
                TableElement::Column(column) => {
                    if !columns.insert(column.name().name()) {
                        return Err(Error::malformed(
                            kind,
                            format!("column {} is defined twice", column.name()),
                        ));
                    }
                }
                TableElement::Constraint(constraint) if constraint.is_drop() => {
                    return Err(Error::malformed(
                        kind,
                        "a constraint drop cannot appear in CREATE TABLE",
                    ));
                }
                _ => {}
            }
        }
        if columns.is_empty() {
            return Err(Error::malformed(kind, "a table needs at least one column"));
        }
        Ok(Self {
            name,
            existence_check,
            elements,
            storage_format,
            span: Span::default(),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn existence_check(&self) -> ExistenceCheck {
        self.existence_check
    }

    pub fn elements(&self) -> &[TableElement] {
        &self.elements
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.elements.iter().filter_map(|e| match e {
            TableElement::Column(c) => Some(c),
            _ => None,
        })
    }

    pub fn constraints(&self) -> impl Iterator<Item = &ConstraintDefinition> {
        self.elements.iter().filter_map(|e| match e {
            TableElement::Constraint(c) => Some(c),
            _ => None,
        })
    }

    pub fn storage_format(&self) -> Option<&StorageFormat> {
        self.storage_format.as_ref()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_name(&mut self, name: TableName) {
        self.name = name;
    }
}

impl DdlStatement for CreateTable {
    fn object_name(&self) -> &TableName {
        &self.name
    }

    fn statement_name(&self) -> &'static str {
        "CREATE TABLE"
    }
}

/// DROP TABLE statement
#[derive(Debug, PartialEq, Serialize)]
pub struct DropTable {
    name: TableName,
    existence_check: ExistenceCheck,
    behavior: Option<DropBehavior>,
    #[serde(skip)]
    span: Span,
}

impl DropTable {
    pub fn new(
        name: TableName,
        existence_check: ExistenceCheck,
        behavior: Option<DropBehavior>,
    ) -> Result<Self> {
        existence_check.check_drop(NodeKind::DropTable)?;
        Ok(Self {
            name,
            existence_check,
            behavior,
            span: Span::default(),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn existence_check(&self) -> ExistenceCheck {
        self.existence_check
    }

    pub fn behavior(&self) -> Option<DropBehavior> {
        self.behavior
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl DdlStatement for DropTable {
    fn object_name(&self) -> &TableName {
        &self.name
    }

    fn statement_name(&self) -> &'static str {
        "DROP TABLE"
    }
}

/// One change applied by an ALTER TABLE.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlterTableAction {
    AddConstraint(ConstraintDefinition),
    DropConstraint(ConstraintDefinition),
    AddColumn(ColumnDefinition),
    DropColumn {
        column: Identifier,
        existence_check: ExistenceCheck,
    },
}

impl AlterTableAction {
    /// Wrap a constraint as ADD or DROP depending on its sub-kind.
    pub fn constraint(constraint: ConstraintDefinition) -> Self {
        if constraint.is_drop() {
            AlterTableAction::DropConstraint(constraint)
        } else {
            AlterTableAction::AddConstraint(constraint)
        }
    }
}

/// ALTER TABLE statement
#[derive(Debug, PartialEq, Serialize)]
pub struct AlterTable {
    name: TableName,
    actions: Vec<AlterTableAction>,
    #[serde(skip)]
    span: Span,
}

impl AlterTable {
    pub fn new(name: TableName, actions: Vec<AlterTableAction>) -> Result<Self> {
        let kind = NodeKind::AlterTable;
        if actions.is_empty() {
            return Err(Error::malformed(kind, "ALTER TABLE needs at least one action"));
        }
        for action in &actions {
            match action {
                AlterTableAction::AddConstraint(c) if c.is_drop() => {
                    return Err(Error::malformed(kind, "cannot ADD a constraint drop"));
                }
                AlterTableAction::DropConstraint(c) if !c.is_drop() => {
                    return Err(Error::malformed(kind, "cannot DROP a constraint definition"));
                }
                AlterTableAction::DropColumn {
                    column,
                    existence_check,
                } => {
                    existence_check.check_drop(kind)?;
                    if column.is_empty() {
                        return Err(Error::malformed(kind, "column name must not be empty"));
                    }
                }
                _ => {}
            }
        }
        Ok(Self {
            name,
            actions,
            span: Span::default(),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn actions(&self) -> &[AlterTableAction] {
        &self.actions
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl DdlStatement for AlterTable {
    fn object_name(&self) -> &TableName {
        &self.name
    }

    fn statement_name(&self) -> &'static str {
        "ALTER TABLE"
    }
}
