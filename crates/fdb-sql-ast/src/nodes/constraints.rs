//! Constraint definitions.
//!
//! A [`ConstraintDefinition`] is either a definition (primary key, unique,
//! check, foreign key) or a drop of an existing constraint. The sub-kind is
//! fixed when the node is built; accessors for fields the sub-kind does not
//! carry return [`Error::FieldNotApplicable`].

use super::{ColumnList, NodeKind, Span, TableName, ValueExpr};
use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::features::Feature;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const KIND: NodeKind = NodeKind::ConstraintDefinition;

/// Which kind of constraint a node defines or drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstraintType {
    PrimaryKey,
    Unique,
    Check,
    ForeignKey,
    /// `DROP CONSTRAINT name` without saying which kind
    Unspecified,
}

impl ConstraintType {
    pub fn tag(self) -> &'static str {
        match self {
            ConstraintType::PrimaryKey => "PRIMARY_KEY",
            ConstraintType::Unique => "UNIQUE",
            ConstraintType::Check => "CHECK",
            ConstraintType::ForeignKey => "FOREIGN_KEY",
            ConstraintType::Unspecified => "UNSPECIFIED",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ConstraintType::PrimaryKey => "PRIMARY KEY",
            ConstraintType::Unique => "UNIQUE",
            ConstraintType::Check => "CHECK",
            ConstraintType::ForeignKey => "FOREIGN KEY",
            ConstraintType::Unspecified => "CONSTRAINT",
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ConstraintType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "PRIMARY_KEY" => Ok(ConstraintType::PrimaryKey),
            "UNIQUE" => Ok(ConstraintType::Unique),
            "CHECK" => Ok(ConstraintType::Check),
            "FOREIGN_KEY" => Ok(ConstraintType::ForeignKey),
            "UNSPECIFIED" => Ok(ConstraintType::Unspecified),
            other => Err(format!("unknown constraint type {other}")),
        }
    }
}

/// What happens to dependents when the object is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DropBehavior {
    Cascade,
    Restrict,
}

impl DropBehavior {
    pub fn keyword(self) -> &'static str {
        match self {
            DropBehavior::Cascade => "CASCADE",
            DropBehavior::Restrict => "RESTRICT",
        }
    }
}

impl FromStr for DropBehavior {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "CASCADE" => Ok(DropBehavior::Cascade),
            "RESTRICT" => Ok(DropBehavior::Restrict),
            other => Err(format!("unknown drop behavior {other}")),
        }
    }
}

/// `IF EXISTS` / `IF NOT EXISTS` policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ExistenceCheck {
    #[default]
    NoCondition,
    IfExists,
    IfNotExists,
}

impl ExistenceCheck {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            ExistenceCheck::NoCondition => None,
            ExistenceCheck::IfExists => Some("IF EXISTS"),
            ExistenceCheck::IfNotExists => Some("IF NOT EXISTS"),
        }
    }

    /// Reject `IF EXISTS` on create statements.
    pub(crate) fn check_create(self, kind: NodeKind) -> Result<()> {
        if self == ExistenceCheck::IfExists {
            return Err(Error::malformed(kind, "IF EXISTS is not valid on a create"));
        }
        Ok(())
    }

    /// Reject `IF NOT EXISTS` on drop statements.
    pub(crate) fn check_drop(self, kind: NodeKind) -> Result<()> {
        if self == ExistenceCheck::IfNotExists {
            return Err(Error::malformed(kind, "IF NOT EXISTS is not valid on a drop"));
        }
        Ok(())
    }
}

impl FromStr for ExistenceCheck {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "NO_CONDITION" => Ok(ExistenceCheck::NoCondition),
            "IF_EXISTS" => Ok(ExistenceCheck::IfExists),
            "IF_NOT_EXISTS" => Ok(ExistenceCheck::IfNotExists),
            other => Err(format!("unknown existence check {other}")),
        }
    }
}

/// Referential action on delete/update of a referenced row.
///
/// The integer codes are the grammar's legacy encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    NoAction,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ReferentialAction::Cascade),
            1 => Some(ReferentialAction::Restrict),
            2 => Some(ReferentialAction::NoAction),
            3 => Some(ReferentialAction::SetNull),
            4 => Some(ReferentialAction::SetDefault),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ReferentialAction::Cascade => 0,
            ReferentialAction::Restrict => 1,
            ReferentialAction::NoAction => 2,
            ReferentialAction::SetNull => 3,
            ReferentialAction::SetDefault => 4,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl TryFrom<i64> for ReferentialAction {
    type Error = String;

    fn try_from(code: i64) -> std::result::Result<Self, String> {
        ReferentialAction::from_code(code)
            .ok_or_else(|| format!("referential action code {code} is outside 0..=4"))
    }
}

/// `MATCH SIMPLE | FULL | PARTIAL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchType {
    Simple,
    Full,
    Partial,
}

impl MatchType {
    pub fn keyword(self) -> &'static str {
        match self {
            MatchType::Simple => "SIMPLE",
            MatchType::Full => "FULL",
            MatchType::Partial => "PARTIAL",
        }
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "SIMPLE" => Ok(MatchType::Simple),
            "FULL" => Ok(MatchType::Full),
            "PARTIAL" => Ok(MatchType::Partial),
            other => Err(format!("unknown match type {other}")),
        }
    }
}

/// Fields of a `FOREIGN KEY ... REFERENCES ...` definition.
///
/// Built by the caller and validated by [`ConstraintDefinition::foreign_key`].
#[derive(Debug, PartialEq, Serialize)]
pub struct ForeignKeyDefinition {
    pub columns: ColumnList,
    pub ref_table: TableName,
    /// Omitted when referencing the primary key
    pub ref_columns: Option<ColumnList>,
    pub delete_rule: ReferentialAction,
    pub update_rule: ReferentialAction,
    pub match_type: Option<MatchType>,
    /// Part of a table-group parent/child relationship
    pub grouping: bool,
    pub deferrable: bool,
    pub initially_deferred: bool,
}

impl ForeignKeyDefinition {
    /// A plain foreign key with `NO ACTION` rules and no modifiers.
    pub fn new(columns: ColumnList, ref_table: TableName, ref_columns: Option<ColumnList>) -> Self {
        Self {
            columns,
            ref_table,
            ref_columns,
            delete_rule: ReferentialAction::NoAction,
            update_rule: ReferentialAction::NoAction,
            match_type: None,
            grouping: false,
            deferrable: false,
            initially_deferred: false,
        }
    }
}

/// Fields of a constraint drop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintDrop {
    pub constraint_type: ConstraintType,
    pub behavior: Option<DropBehavior>,
    pub existence_check: ExistenceCheck,
    pub grouping: bool,
}

impl ConstraintDrop {
    pub fn new(constraint_type: ConstraintType) -> Self {
        Self {
            constraint_type,
            behavior: None,
            existence_check: ExistenceCheck::NoCondition,
            grouping: false,
        }
    }
}

/// The sub-kind specific part of a constraint.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintBody {
    PrimaryKey { columns: ColumnList },
    Unique { columns: ColumnList },
    Check { condition: ValueExpr },
    ForeignKey(Box<ForeignKeyDefinition>),
    Drop(ConstraintDrop),
}

/// A named or anonymous table constraint, or the drop of one.
#[derive(Debug, PartialEq, Serialize)]
pub struct ConstraintDefinition {
    name: Option<TableName>,
    body: ConstraintBody,
    #[serde(skip)]
    span: Span,
}

impl ConstraintDefinition {
    fn build(name: Option<TableName>, body: ConstraintBody) -> Self {
        Self {
            name,
            body,
            span: Span::default(),
        }
    }

    pub fn primary_key(name: Option<TableName>, columns: ColumnList) -> Self {
        Self::build(name, ConstraintBody::PrimaryKey { columns })
    }

    pub fn unique(name: Option<TableName>, columns: ColumnList) -> Self {
        Self::build(name, ConstraintBody::Unique { columns })
    }

    pub fn check(name: Option<TableName>, condition: ValueExpr) -> Self {
        Self::build(name, ConstraintBody::Check { condition })
    }

    /// Define a foreign key.
    pub fn foreign_key(
        ctx: &SessionContext,
        name: Option<TableName>,
        fk: ForeignKeyDefinition,
    ) -> Result<Self> {
        if fk.grouping {
            ctx.require(KIND, Feature::TableGrouping)?;
        }
        if fk.deferrable {
            ctx.require(KIND, Feature::DeferrableConstraints)?;
        }
        if fk.initially_deferred && !fk.deferrable {
            return Err(Error::malformed(
                KIND,
                "INITIALLY DEFERRED requires a DEFERRABLE constraint",
            ));
        }
        if let Some(ref_columns) = &fk.ref_columns {
            if ref_columns.len() != fk.columns.len() {
                return Err(Error::malformed(
                    KIND,
                    format!(
                        "foreign key has {} columns but references {}",
                        fk.columns.len(),
                        ref_columns.len()
                    ),
                ));
            }
        }
        Ok(Self::build(name, ConstraintBody::ForeignKey(Box::new(fk))))
    }

    /// Drop an existing constraint.
    pub fn drop_constraint(
        ctx: &SessionContext,
        name: Option<TableName>,
        drop: ConstraintDrop,
    ) -> Result<Self> {
        drop.existence_check.check_drop(KIND)?;
        if name.is_none() && drop.constraint_type != ConstraintType::PrimaryKey {
            return Err(Error::malformed(
                KIND,
                format!("dropping a {} constraint requires its name", drop.constraint_type),
            ));
        }
        if drop.grouping {
            if drop.constraint_type != ConstraintType::ForeignKey {
                return Err(Error::malformed(
                    KIND,
                    "only foreign keys can be dropped as GROUPING",
                ));
            }
            ctx.require(KIND, Feature::TableGrouping)?;
        }
        Ok(Self::build(name, ConstraintBody::Drop(drop)))
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn name(&self) -> Option<&TableName> {
        self.name.as_ref()
    }

    pub fn body(&self) -> &ConstraintBody {
        &self.body
    }

    pub fn is_drop(&self) -> bool {
        matches!(self.body, ConstraintBody::Drop(_))
    }

    pub fn constraint_type(&self) -> ConstraintType {
        match &self.body {
            ConstraintBody::PrimaryKey { .. } => ConstraintType::PrimaryKey,
            ConstraintBody::Unique { .. } => ConstraintType::Unique,
            ConstraintBody::Check { .. } => ConstraintType::Check,
            ConstraintBody::ForeignKey(_) => ConstraintType::ForeignKey,
            ConstraintBody::Drop(drop) => drop.constraint_type,
        }
    }

    pub fn existence_check(&self) -> Result<ExistenceCheck> {
        match &self.body {
            ConstraintBody::Drop(drop) => Ok(drop.existence_check),
            _ => Err(Error::not_applicable(KIND, "existence_check")),
        }
    }

    pub fn drop_behavior(&self) -> Result<Option<DropBehavior>> {
        match &self.body {
            ConstraintBody::Drop(drop) => Ok(drop.behavior),
            _ => Err(Error::not_applicable(KIND, "drop_behavior")),
        }
    }

    /// Key columns of a primary key, unique or foreign key definition.
    pub fn columns(&self) -> Result<&ColumnList> {
        match &self.body {
            ConstraintBody::PrimaryKey { columns } | ConstraintBody::Unique { columns } => {
                Ok(columns)
            }
            ConstraintBody::ForeignKey(fk) => Ok(&fk.columns),
            _ => Err(Error::not_applicable(KIND, "columns")),
        }
    }

    pub fn check_condition(&self) -> Result<&ValueExpr> {
        match &self.body {
            ConstraintBody::Check { condition } => Ok(condition),
            _ => Err(Error::not_applicable(KIND, "check_condition")),
        }
    }

    fn fk(&self, field: &'static str) -> Result<&ForeignKeyDefinition> {
        match &self.body {
            ConstraintBody::ForeignKey(fk) => Ok(fk),
            _ => Err(Error::not_applicable(KIND, field)),
        }
    }

    pub fn foreign_key_definition(&self) -> Result<&ForeignKeyDefinition> {
        self.fk("foreign_key_definition")
    }

    pub fn ref_table_name(&self) -> Result<&TableName> {
        self.fk("ref_table_name").map(|fk| &fk.ref_table)
    }

    pub fn ref_columns(&self) -> Result<Option<&ColumnList>> {
        self.fk("ref_columns").map(|fk| fk.ref_columns.as_ref())
    }

    pub fn delete_rule(&self) -> Result<ReferentialAction> {
        self.fk("delete_rule").map(|fk| fk.delete_rule)
    }

    pub fn update_rule(&self) -> Result<ReferentialAction> {
        self.fk("update_rule").map(|fk| fk.update_rule)
    }

    pub fn match_type(&self) -> Result<Option<MatchType>> {
        self.fk("match_type").map(|fk| fk.match_type)
    }

    pub fn is_deferrable(&self) -> Result<bool> {
        self.fk("deferrable").map(|fk| fk.deferrable)
    }

    pub fn is_initially_deferred(&self) -> Result<bool> {
        self.fk("initially_deferred").map(|fk| fk.initially_deferred)
    }

    /// Grouping flag of a foreign key definition or foreign key drop.
    pub fn is_grouping(&self) -> Result<bool> {
        match &self.body {
            ConstraintBody::ForeignKey(fk) => Ok(fk.grouping),
            ConstraintBody::Drop(drop) if drop.constraint_type == ConstraintType::ForeignKey => {
                Ok(drop.grouping)
            }
            _ => Err(Error::not_applicable(KIND, "grouping")),
        }
    }

    /// Rename the constraint in place.
    pub fn set_name(&mut self, name: Option<TableName>) -> Result<()> {
        let primary_key = self.constraint_type() == ConstraintType::PrimaryKey;
        if name.is_none() && self.is_drop() && !primary_key {
            return Err(Error::malformed(KIND, "a dropped constraint must stay named"));
        }
        self.name = name;
        Ok(())
    }
}
