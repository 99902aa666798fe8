//! Identifiers, qualified table names and plain column lists.

use super::{NodeKind, Span};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A SQL identifier (table name, column name, constraint name, ...).
///
/// The `quoted` flag records whether the identifier was delimited in the
/// source; the unparser uses it to decide whether to emit quote characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier {
    name: String,
    quoted: bool,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: false,
        }
    }

    pub fn quoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.name.replace('"', "\"\""))
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::new(name)
    }
}

/// A possibly schema-qualified object name: `[schema.]name`.
///
/// Used for tables, indexes and constraint names. Immutable once built, so
/// copies share nothing mutable and `Clone` is a full copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableName {
    schema: Option<Identifier>,
    name: Identifier,
    #[serde(skip)]
    span: Span,
}

impl TableName {
    pub fn new(schema: Option<Identifier>, name: Identifier) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::malformed(NodeKind::TableName, "name must not be empty"));
        }
        if schema.as_ref().is_some_and(Identifier::is_empty) {
            return Err(Error::malformed(
                NodeKind::TableName,
                "schema qualifier must not be empty",
            ));
        }
        Ok(Self {
            schema,
            name,
            span: Span::default(),
        })
    }

    /// Build from dotted text such as `"t1"` or `"test.t1"`.
    pub fn parse(text: &str) -> Result<Self> {
        match text.split_once('.') {
            Some((schema, name)) if !name.contains('.') => {
                Self::new(Some(Identifier::new(schema)), Identifier::new(name))
            }
            Some(_) => Err(Error::malformed(
                NodeKind::TableName,
                format!("too many qualifiers in {text}"),
            )),
            None => Self::new(None, Identifier::new(text)),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn schema(&self) -> Option<&Identifier> {
        self.schema.as_ref()
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_qualified(&self) -> bool {
        self.schema.is_some()
    }

    /// Same table, ignoring source positions.
    pub fn same_object(&self, other: &TableName) -> bool {
        self.schema == other.schema && self.name == other.name
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// An ordered, non-empty list of unqualified column names, as used by key
/// constraints.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ColumnList {
    columns: Vec<Identifier>,
    #[serde(skip)]
    span: Span,
}

impl ColumnList {
    pub fn new(columns: Vec<Identifier>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::malformed(
                NodeKind::ColumnList,
                "column list must not be empty",
            ));
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.is_empty() {
                return Err(Error::malformed(
                    NodeKind::ColumnList,
                    "column name must not be empty",
                ));
            }
            if !seen.insert(column.name()) {
                return Err(Error::malformed(
                    NodeKind::ColumnList,
                    format!("duplicate column {}", column),
                ));
            }
        }
        Ok(Self {
            columns,
            span: Span::default(),
        })
    }

    /// Convenience constructor from plain names.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Identifier::new).collect())
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn columns(&self) -> &[Identifier] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false for a constructed list.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.columns.iter()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Rename a column in place. Fails if the new name is empty or already
    /// present.
    pub fn rename(&mut self, index: usize, name: Identifier) -> Result<()> {
        if name.is_empty() {
            return Err(Error::malformed(
                NodeKind::ColumnList,
                "column name must not be empty",
            ));
        }
        if self
            .columns
            .iter()
            .enumerate()
            .any(|(i, c)| i != index && c.name() == name.name())
        {
            return Err(Error::malformed(
                NodeKind::ColumnList,
                format!("duplicate column {}", name),
            ));
        }
        let slot = self.columns.get_mut(index).ok_or_else(|| {
            Error::malformed(NodeKind::ColumnList, format!("no column at position {index}"))
        })?;
        *slot = name;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a Identifier;
    type IntoIter = std::slice::Iter<'a, Identifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
