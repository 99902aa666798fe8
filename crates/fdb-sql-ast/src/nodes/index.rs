//! Index columns, storage formats, option bags and the index-defining facet.

use super::{Identifier, NodeKind, Span, TableName};
use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::features::Feature;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Join used by a group index that spans several tables of a table group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinType {
    /// Keyword in `USING <keyword> JOIN`.
    pub fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::LeftOuter => "LEFT",
            JoinType::RightOuter => "RIGHT",
            JoinType::FullOuter => "FULL",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::LeftOuter => "LEFT_OUTER",
            JoinType::RightOuter => "RIGHT_OUTER",
            JoinType::FullOuter => "FULL_OUTER",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for JoinType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "INNER" => Ok(JoinType::Inner),
            "LEFT_OUTER" => Ok(JoinType::LeftOuter),
            "RIGHT_OUTER" => Ok(JoinType::RightOuter),
            "FULL_OUTER" => Ok(JoinType::FullOuter),
            other => Err(format!("unknown join type {other}")),
        }
    }
}

/// String-keyed vendor options. Iteration and rendering follow key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Options {
    entries: BTreeMap<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Option keys are bare words: `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn is_valid_key(key: &str) -> bool {
        let mut chars = key.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// The first key that cannot be written as a bare word.
    pub fn invalid_key(&self) -> Option<&str> {
        self.entries
            .keys()
            .map(String::as_str)
            .find(|key| !Options::is_valid_key(key))
    }

    pub(crate) fn check_keys(&self, kind: NodeKind) -> Result<()> {
        match self.invalid_key() {
            Some(key) => Err(Error::malformed(kind, format!("invalid option key {key:?}"))),
            None => Ok(()),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One indexed column with its sort direction. Group index columns carry the
/// table they come from.
#[derive(Debug, PartialEq, Serialize)]
pub struct IndexColumn {
    table: Option<TableName>,
    column: Identifier,
    ascending: bool,
    #[serde(skip)]
    span: Span,
}

impl IndexColumn {
    pub fn new(table: Option<TableName>, column: Identifier, ascending: bool) -> Result<Self> {
        if column.is_empty() {
            return Err(Error::malformed(
                NodeKind::IndexColumn,
                "column name must not be empty",
            ));
        }
        Ok(Self {
            table,
            column,
            ascending,
            span: Span::default(),
        })
    }

    pub fn asc(column: &str) -> Result<Self> {
        Self::new(None, Identifier::new(column), true)
    }

    pub fn desc(column: &str) -> Result<Self> {
        Self::new(None, Identifier::new(column), false)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn table(&self) -> Option<&TableName> {
        self.table.as_ref()
    }

    pub fn column(&self) -> &Identifier {
        &self.column
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    pub fn span(&self) -> Span {
        self.span
    }

    fn same_column(&self, other: &IndexColumn) -> bool {
        self.column == other.column
            && match (&self.table, &other.table) {
                (Some(a), Some(b)) => a.same_object(b),
                (None, None) => true,
                _ => false,
            }
    }
}

/// Ordered, non-empty list of index columns.
#[derive(Debug, PartialEq, Serialize)]
pub struct IndexColumnList {
    columns: Vec<IndexColumn>,
    #[serde(skip)]
    span: Span,
}

impl IndexColumnList {
    pub fn new(columns: Vec<IndexColumn>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::malformed(
                NodeKind::IndexColumnList,
                "an index needs at least one column",
            ));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|prev| prev.same_column(column)) {
                return Err(Error::malformed(
                    NodeKind::IndexColumnList,
                    format!("column {} is indexed twice", column.column),
                ));
            }
        }
        Ok(Self {
            columns,
            span: Span::default(),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false for a constructed list.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexColumn> {
        self.columns.iter()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn all_qualified(&self) -> bool {
        self.columns.iter().all(|c| c.table.is_some())
    }

    /// Flip the sort direction of one column.
    pub fn set_ascending(&mut self, index: usize, ascending: bool) -> Result<()> {
        let column = self.columns.get_mut(index).ok_or_else(|| {
            Error::malformed(
                NodeKind::IndexColumnList,
                format!("no column at position {index}"),
            )
        })?;
        column.ascending = ascending;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a IndexColumnList {
    type Item = &'a IndexColumn;
    type IntoIter = std::slice::Iter<'a, IndexColumn>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// `STORAGE_FORMAT <format>[(<option> = '<value>', ...)]`
#[derive(Debug, PartialEq, Serialize)]
pub struct StorageFormat {
    format: Identifier,
    options: Options,
    #[serde(skip)]
    span: Span,
}

impl StorageFormat {
    pub fn new(ctx: &SessionContext, format: Identifier, options: Options) -> Result<Self> {
        ctx.require(NodeKind::StorageFormat, Feature::StorageFormat)?;
        if format.is_empty() {
            return Err(Error::malformed(
                NodeKind::StorageFormat,
                "format name must not be empty",
            ));
        }
        options.check_keys(NodeKind::StorageFormat)?;
        Ok(Self {
            format,
            options,
            span: Span::default(),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn format(&self) -> &Identifier {
        &self.format
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Capability shared by every node that defines an index.
pub trait IndexDefinition {
    fn is_unique(&self) -> bool;

    fn index_columns(&self) -> &IndexColumnList;

    /// Set only for group indexes spanning joined tables.
    fn join_type(&self) -> Option<JoinType>;

    fn storage_format(&self) -> Option<&StorageFormat>;
}

/// Shared validation for index-defining nodes.
pub(crate) fn check_index_shape(
    ctx: &SessionContext,
    kind: NodeKind,
    columns: &IndexColumnList,
    join_type: Option<JoinType>,
) -> Result<()> {
    if columns.is_empty() {
        return Err(Error::malformed(kind, "an index needs at least one column"));
    }
    if join_type.is_some() {
        ctx.require(kind, Feature::TableGrouping)?;
        if !columns.all_qualified() {
            return Err(Error::malformed(
                kind,
                "every column of a group index must be qualified by its table",
            ));
        }
    }
    Ok(())
}

/// `[UNIQUE] INDEX <name> (<columns>)` element of a CREATE TABLE.
#[derive(Debug, PartialEq, Serialize)]
pub struct IndexConstraint {
    name: Identifier,
    unique: bool,
    columns: IndexColumnList,
    join_type: Option<JoinType>,
    storage_format: Option<StorageFormat>,
    #[serde(skip)]
    span: Span,
}

impl IndexConstraint {
    pub fn new(
        ctx: &SessionContext,
        name: Identifier,
        unique: bool,
        columns: IndexColumnList,
        join_type: Option<JoinType>,
        storage_format: Option<StorageFormat>,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::malformed(
                NodeKind::IndexConstraint,
                "index name must not be empty",
            ));
        }
        check_index_shape(ctx, NodeKind::IndexConstraint, &columns, join_type)?;
        Ok(Self {
            name,
            unique,
            columns,
            join_type,
            storage_format,
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

    pub fn span(&self) -> Span {
        self.span
    }
}

impl IndexDefinition for IndexConstraint {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_column_list_rejects_empty_and_duplicates() {
        assert!(matches!(
            IndexColumnList::new(Vec::new()),
            Err(Error::MalformedConstruction { kind: NodeKind::IndexColumnList, .. })
        ));
        let dup = vec![IndexColumn::asc("a").unwrap(), IndexColumn::desc("a").unwrap()];
        assert!(IndexColumnList::new(dup).is_err());
    }

    #[test]
    fn test_same_column_in_different_tables_is_allowed() {
        let cols = vec![
            IndexColumn::new(Some(TableName::parse("c").unwrap()), "id".into(), true).unwrap(),
            IndexColumn::new(Some(TableName::parse("o").unwrap()), "id".into(), true).unwrap(),
        ];
        assert_eq!(IndexColumnList::new(cols).unwrap().len(), 2);
    }

    #[test]
    fn test_join_type_tags() {
        assert_eq!("LEFT_OUTER".parse::<JoinType>(), Ok(JoinType::LeftOuter));
        assert_eq!(JoinType::LeftOuter.keyword(), "LEFT");
        assert!("LEFT".parse::<JoinType>().is_err());
    }

    #[test]
    fn test_storage_format_is_gated() {
        let ctx = SessionContext::new();
        assert_eq!(
            StorageFormat::new(&ctx, Identifier::new("protobuf"), Options::new()),
            Err(Error::FeatureDisabled(Feature::StorageFormat))
        );
        let ctx = SessionContext::with_features([Feature::StorageFormat]);
        assert!(StorageFormat::new(&ctx, Identifier::new("protobuf"), Options::new()).is_ok());
    }

    #[test]
    fn test_group_index_constraint_needs_qualified_columns() {
        let ctx = SessionContext::with_features([Feature::TableGrouping]);
        let cols = IndexColumnList::new(vec![IndexColumn::asc("name").unwrap()]).unwrap();
        let err = IndexConstraint::new(
            &ctx,
            "idx".into(),
            false,
            cols,
            Some(JoinType::LeftOuter),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedConstruction { .. }));
    }
}
