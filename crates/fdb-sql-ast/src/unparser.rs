//! SQL generation from syntax trees.
//!
//! The unparser walks a node and writes canonical SQL: upper-case keywords,
//! single spaces, children in stored order. Output depends only on the tree
//! and the [`UnparserConfig`], so rendering the same tree twice yields the same
//! text.

use crate::error::{Error, Result};
use crate::nodes::{
    AlterTable, AlterTableAction, ColumnDefinition, ColumnList, ConstraintBody,
    ConstraintDefinition, ConstraintDrop, ConstraintType, CreateIndex, CreateTable, DropIndex,
    DropTable, ExistenceCheck, Identifier, IndexColumn, IndexColumnList, IndexConstraint,
    IndexDefinition, JoinType, Node, NodeKind, Options, StatementList, StorageFormat,
    TableElement, TableName, ValueExpr,
};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Words that must be quoted when used as identifiers.
static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASCADE", "CASE", "CHECK",
        "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DEFAULT", "DEFERRABLE", "DELETE", "DESC",
        "DISTINCT", "DROP", "ELSE", "END", "EXISTS", "FALSE", "FOR", "FOREIGN", "FROM", "FULL",
        "GROUP", "GROUPING", "HAVING", "IF", "IN", "INDEX", "INNER", "INSERT", "INTO", "IS",
        "JOIN", "KEY", "LEFT", "LIKE", "MATCH", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER",
        "PRIMARY", "REFERENCES", "RESTRICT", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TO",
        "TRUE", "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHERE", "WITH",
    ]
    .into_iter()
    .collect()
});

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparserConfig {
    /// Character used to delimit identifiers
    pub identifier_quote: char,
    /// Quote every identifier, not only those that need it
    pub always_quote_identifiers: bool,
    /// Written between the `;`-terminated statements of a list
    pub statement_separator: &'static str,
    /// Deepest expression nesting rendered; unbounded when `None`
    pub max_depth: Option<usize>,
}

impl Default for UnparserConfig {
    fn default() -> Self {
        Self {
            identifier_quote: '"',
            always_quote_identifiers: false,
            statement_separator: "\n",
            max_depth: None,
        }
    }
}

/// SQL writer for syntax trees.
///
/// ```
/// use fdb_sql_ast::nodes::{DropIndex, ExistenceCheck, Node, TableName};
/// use fdb_sql_ast::Unparser;
///
/// let drop = DropIndex::new(TableName::parse("idx1").unwrap(), ExistenceCheck::IfExists).unwrap();
/// assert_eq!(Unparser::sql(&Node::from(drop)).unwrap(), "DROP INDEX IF EXISTS idx1");
/// ```
#[derive(Debug, Default)]
pub struct Unparser {
    config: UnparserConfig,
    output: String,
    depth: usize,
}

impl Unparser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: UnparserConfig) -> Self {
        Self {
            config,
            output: String::new(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &UnparserConfig {
        &self.config
    }

    /// Render with the default configuration.
    pub fn sql(node: &Node) -> Result<String> {
        Unparser::new().generate(node)
    }

    /// Render one node.
    pub fn generate(&mut self, node: &Node) -> Result<String> {
        self.output.clear();
        self.depth = 0;
        self.node(node)?;
        Ok(std::mem::take(&mut self.output))
    }

    /// Render a statement list: each statement terminated by `;`.
    pub fn generate_statements(&mut self, statements: &StatementList) -> Result<String> {
        self.output.clear();
        self.depth = 0;
        for (i, statement) in statements.iter().enumerate() {
            if !statement.is_statement() {
                return Err(Error::unrenderable(
                    statement.kind(),
                    "statement list holds a non-statement node",
                ));
            }
            if i > 0 {
                self.output.push_str(self.config.statement_separator);
            }
            self.node(statement)?;
            self.output.push(';');
        }
        Ok(std::mem::take(&mut self.output))
    }

    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn node(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::TableName(n) => self.table_name(n),
            Node::Value(n) => self.value(n),
            Node::ColumnList(n) => self.column_list(n),
            Node::IndexColumn(n) => self.index_column(n),
            Node::IndexColumnList(n) => self.index_column_list(n),
            Node::StorageFormat(n) => self.storage_format(n),
            Node::ColumnDefinition(n) => self.column_definition(n),
            Node::Constraint(n) => self.constraint(n),
            Node::IndexConstraint(n) => self.index_constraint(n),
            Node::CreateIndex(n) => self.create_index(n),
            Node::DropIndex(n) => self.drop_index(n),
            Node::CreateTable(n) => self.create_table(n),
            Node::DropTable(n) => self.drop_table(n),
            Node::AlterTable(n) => self.alter_table(n),
        }
    }

    fn needs_quotes(&self, ident: &Identifier) -> bool {
        if self.config.always_quote_identifiers || ident.is_quoted() {
            return true;
        }
        let name = ident.name();
        let mut chars = name.chars();
        let simple = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        let mixed_case = name.chars().any(|c| c.is_ascii_uppercase())
            && name.chars().any(|c| c.is_ascii_lowercase());
        !simple || mixed_case || RESERVED_WORDS.contains(name.to_ascii_uppercase().as_str())
    }

    fn identifier(&mut self, ident: &Identifier, kind: NodeKind) -> Result<()> {
        if ident.is_empty() {
            return Err(Error::unrenderable(kind, "empty identifier"));
        }
        if self.needs_quotes(ident) {
            let quote = self.config.identifier_quote;
            self.output.push(quote);
            for c in ident.name().chars() {
                if c == quote {
                    self.output.push(quote);
                }
                self.output.push(c);
            }
            self.output.push(quote);
        } else {
            self.write(ident.name());
        }
        Ok(())
    }

    fn table_name(&mut self, name: &TableName) -> Result<()> {
        if let Some(schema) = name.schema() {
            self.identifier(schema, NodeKind::TableName)?;
            self.write(".");
        }
        self.identifier(name.name(), NodeKind::TableName)
    }

    fn string_literal(&mut self, text: &str) {
        self.output.push('\'');
        self.output.push_str(&text.replace('\'', "''"));
        self.output.push('\'');
    }

    fn comma_separated<T>(
        &mut self,
        items: &[T],
        mut item: impl FnMut(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        for (i, value) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            item(self, value)?;
        }
        Ok(())
    }

    fn value(&mut self, expr: &ValueExpr) -> Result<()> {
        if let Some(max_depth) = self.config.max_depth.filter(|max| self.depth >= *max) {
            return Err(Error::unrenderable(
                expr.kind(),
                format!("expression is nested deeper than {max_depth}"),
            ));
        }
        self.depth += 1;
        let result = self.expression(expr);
        self.depth -= 1;
        result
    }

    fn expression(&mut self, expr: &ValueExpr) -> Result<()> {
        match expr {
            ValueExpr::Column(c) => {
                if let Some(table) = c.table() {
                    self.table_name(table)?;
                    self.write(".");
                }
                self.identifier(c.column(), NodeKind::ColumnReference)
            }
            ValueExpr::Number(n) => {
                self.write(n.value());
                Ok(())
            }
            ValueExpr::String(s) => {
                self.string_literal(s.value());
                Ok(())
            }
            ValueExpr::Boolean(b) => {
                self.write(if b.value() { "TRUE" } else { "FALSE" });
                Ok(())
            }
            ValueExpr::Null(_) => {
                self.write("NULL");
                Ok(())
            }
            ValueExpr::Binary(e) => {
                let precedence = e.op().precedence();
                self.operand(e.left(), precedence > binding(e.left()))?;
                self.write(" ");
                self.write(e.op().symbol());
                self.write(" ");
                self.operand(e.right(), precedence >= binding(e.right()))
            }
            ValueExpr::Not(e) => {
                self.write("NOT ");
                self.operand(e.operand(), binding(e.operand()) < NOT_PRECEDENCE)
            }
            ValueExpr::IsNull(e) => {
                self.operand(e.operand(), binding(e.operand()) <= IS_NULL_PRECEDENCE)?;
                self.write(if e.is_negated() { " IS NOT NULL" } else { " IS NULL" });
                Ok(())
            }
        }
    }

    fn operand(&mut self, expr: &ValueExpr, parenthesize: bool) -> Result<()> {
        if parenthesize {
            self.write("(");
            self.value(expr)?;
            self.write(")");
            Ok(())
        } else {
            self.value(expr)
        }
    }

    fn column_names(&mut self, columns: &ColumnList) -> Result<()> {
        if columns.is_empty() {
            return Err(Error::unrenderable(NodeKind::ColumnList, "empty column list"));
        }
        self.comma_separated(columns.columns(), |u, c| u.identifier(c, NodeKind::ColumnList))
    }

    fn column_list(&mut self, columns: &ColumnList) -> Result<()> {
        self.column_names(columns)
    }

    fn parenthesized_columns(&mut self, columns: &ColumnList) -> Result<()> {
        self.write("(");
        self.column_names(columns)?;
        self.write(")");
        Ok(())
    }

    fn index_column(&mut self, column: &IndexColumn) -> Result<()> {
        if let Some(table) = column.table() {
            self.table_name(table)?;
            self.write(".");
        }
        self.identifier(column.column(), NodeKind::IndexColumn)?;
        if !column.is_ascending() {
            self.write(" DESC");
        }
        Ok(())
    }

    fn index_column_list(&mut self, columns: &IndexColumnList) -> Result<()> {
        if columns.is_empty() {
            return Err(Error::unrenderable(
                NodeKind::IndexColumnList,
                "index without columns",
            ));
        }
        self.comma_separated(columns.columns(), Self::index_column)
    }

    /// `k = 'v', ...` in key order.
    fn option_entries(&mut self, options: &Options, kind: NodeKind) -> Result<()> {
        if let Some(key) = options.invalid_key() {
            return Err(Error::unrenderable(kind, format!("invalid option key {key:?}")));
        }
        for (i, (key, value)) in options.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(key);
            self.write(" = ");
            self.string_literal(value);
        }
        Ok(())
    }

    fn storage_format(&mut self, storage: &StorageFormat) -> Result<()> {
        self.write("STORAGE_FORMAT ");
        self.identifier(storage.format(), NodeKind::StorageFormat)?;
        if !storage.options().is_empty() {
            self.write("(");
            self.option_entries(storage.options(), NodeKind::StorageFormat)?;
            self.write(")");
        }
        Ok(())
    }

    fn trailing_storage_format(&mut self, storage: Option<&StorageFormat>) -> Result<()> {
        if let Some(storage) = storage {
            self.write(" ");
            self.storage_format(storage)?;
        }
        Ok(())
    }

    fn join_clause(&mut self, join_type: Option<JoinType>) {
        if let Some(join_type) = join_type {
            self.write(" USING ");
            self.write(join_type.keyword());
            self.write(" JOIN");
        }
    }

    fn existence(&mut self, check: ExistenceCheck) {
        if let Some(keyword) = check.keyword() {
            self.write(keyword);
            self.write(" ");
        }
    }

    fn column_definition(&mut self, column: &ColumnDefinition) -> Result<()> {
        self.identifier(column.name(), NodeKind::ColumnDefinition)?;
        self.write(" ");
        self.write(&column.data_type().to_string());
        if let Some(default) = column.default_value() {
            self.write(" DEFAULT ");
            self.value(default)?;
        }
        if column.is_not_null() {
            self.write(" NOT NULL");
        }
        Ok(())
    }

    fn constraint(&mut self, constraint: &ConstraintDefinition) -> Result<()> {
        match constraint.body() {
            ConstraintBody::Drop(drop) => self.constraint_drop(constraint.name(), drop),
            body => {
                if let Some(name) = constraint.name() {
                    self.write("CONSTRAINT ");
                    self.table_name(name)?;
                    self.write(" ");
                }
                self.constraint_body(body)
            }
        }
    }

    fn constraint_drop(&mut self, name: Option<&TableName>, drop: &ConstraintDrop) -> Result<()> {
        self.write("DROP ");
        if drop.grouping {
            self.write("GROUPING ");
        }
        self.write(drop.constraint_type.keyword());
        if let Some(keyword) = drop.existence_check.keyword() {
            self.write(" ");
            self.write(keyword);
        }
        match name {
            Some(name) => {
                self.write(" ");
                self.table_name(name)?;
            }
            None if drop.constraint_type == ConstraintType::PrimaryKey => {}
            None => {
                return Err(Error::unrenderable(
                    NodeKind::ConstraintDefinition,
                    "constraint drop without a name",
                ))
            }
        }
        if let Some(behavior) = drop.behavior {
            self.write(" ");
            self.write(behavior.keyword());
        }
        Ok(())
    }

    fn constraint_body(&mut self, body: &ConstraintBody) -> Result<()> {
        match body {
            ConstraintBody::PrimaryKey { columns } => {
                self.write("PRIMARY KEY ");
                self.parenthesized_columns(columns)
            }
            ConstraintBody::Unique { columns } => {
                self.write("UNIQUE ");
                self.parenthesized_columns(columns)
            }
            ConstraintBody::Check { condition } => {
                self.write("CHECK (");
                self.value(condition)?;
                self.write(")");
                Ok(())
            }
            ConstraintBody::ForeignKey(fk) => {
                if fk.grouping {
                    self.write("GROUPING ");
                }
                self.write("FOREIGN KEY ");
                self.parenthesized_columns(&fk.columns)?;
                self.write(" REFERENCES ");
                self.table_name(&fk.ref_table)?;
                if let Some(ref_columns) = &fk.ref_columns {
                    self.write(" ");
                    self.parenthesized_columns(ref_columns)?;
                }
                if let Some(match_type) = fk.match_type {
                    self.write(" MATCH ");
                    self.write(match_type.keyword());
                }
                self.write(" ON DELETE ");
                self.write(fk.delete_rule.keyword());
                self.write(" ON UPDATE ");
                self.write(fk.update_rule.keyword());
                if fk.deferrable {
                    self.write(" DEFERRABLE");
                    if fk.initially_deferred {
                        self.write(" INITIALLY DEFERRED");
                    }
                }
                Ok(())
            }
            ConstraintBody::Drop(_) => Err(Error::unrenderable(
                NodeKind::ConstraintDefinition,
                "constraint drop in a definition position",
            )),
        }
    }

    fn index_constraint(&mut self, index: &IndexConstraint) -> Result<()> {
        if index.is_unique() {
            self.write("UNIQUE ");
        }
        self.write("INDEX ");
        self.identifier(index.name(), NodeKind::IndexConstraint)?;
        self.write(" (");
        self.index_column_list(index.index_columns())?;
        self.write(")");
        self.join_clause(index.join_type());
        self.trailing_storage_format(index.storage_format())
    }

    fn create_index(&mut self, index: &CreateIndex) -> Result<()> {
        self.write("CREATE ");
        if index.is_unique() {
            self.write("UNIQUE ");
        }
        self.write("INDEX ");
        self.existence(index.existence_check());
        self.table_name(index.index_name())?;
        self.write(" ON ");
        self.table_name(index.table_name())?;
        self.write(" (");
        self.index_column_list(index.index_columns())?;
        self.write(")");
        self.join_clause(index.join_type());
        if !index.options().is_empty() {
            self.write(" WITH (");
            self.option_entries(index.options(), NodeKind::CreateIndex)?;
            self.write(")");
        }
        self.trailing_storage_format(index.storage_format())
    }

    fn drop_index(&mut self, drop: &DropIndex) -> Result<()> {
        self.write("DROP INDEX ");
        self.existence(drop.existence_check());
        self.table_name(drop.index_name())
    }

    fn create_table(&mut self, table: &CreateTable) -> Result<()> {
        if table.elements().is_empty() {
            return Err(Error::unrenderable(NodeKind::CreateTable, "table without elements"));
        }
        self.write("CREATE TABLE ");
        self.existence(table.existence_check());
        self.table_name(table.name())?;
        self.write(" (");
        self.comma_separated(table.elements(), |u, element| match element {
            TableElement::Column(c) => u.column_definition(c),
            TableElement::Constraint(c) => u.constraint(c),
            TableElement::Index(i) => u.index_constraint(i),
        })?;
        self.write(")");
        self.trailing_storage_format(table.storage_format())
    }

    fn drop_table(&mut self, drop: &DropTable) -> Result<()> {
        self.write("DROP TABLE ");
        self.existence(drop.existence_check());
        self.table_name(drop.name())?;
        if let Some(behavior) = drop.behavior() {
            self.write(" ");
            self.write(behavior.keyword());
        }
        Ok(())
    }

    fn alter_table(&mut self, alter: &AlterTable) -> Result<()> {
        if alter.actions().is_empty() {
            return Err(Error::unrenderable(NodeKind::AlterTable, "no actions"));
        }
        self.write("ALTER TABLE ");
        self.table_name(alter.name())?;
        self.write(" ");
        self.comma_separated(alter.actions(), |u, action| match action {
            AlterTableAction::AddConstraint(c) => {
                u.write("ADD ");
                u.constraint(c)
            }
            AlterTableAction::DropConstraint(c) => u.constraint(c),
            AlterTableAction::AddColumn(c) => {
                u.write("ADD COLUMN ");
                u.column_definition(c)
            }
            AlterTableAction::DropColumn {
                column,
                existence_check,
            } => {
                u.write("DROP COLUMN ");
                u.existence(*existence_check);
                u.identifier(column, NodeKind::AlterTable)
            }
        })
    }
}

const NOT_PRECEDENCE: u8 = 3;
const IS_NULL_PRECEDENCE: u8 = 4;

/// How tightly an expression binds when it appears as an operand.
fn binding(expr: &ValueExpr) -> u8 {
    match expr {
        ValueExpr::Binary(e) => e.op().precedence(),
        ValueExpr::Not(_) => NOT_PRECEDENCE,
        ValueExpr::IsNull(_) => IS_NULL_PRECEDENCE,
        _ => u8::MAX,
    }
}
