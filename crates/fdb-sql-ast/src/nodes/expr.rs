//! Value expressions used by CHECK constraints and column defaults.

use super::{NodeKind, Span, TableName};
use crate::error::{Error, Result};
use crate::nodes::names::Identifier;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A scalar expression.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExpr {
    Column(ColumnReference),
    Number(NumericConstant),
    String(StringConstant),
    Boolean(BooleanConstant),
    Null(NullConstant),
    Binary(Box<BinaryExpr>),
    Not(Box<NotExpr>),
    IsNull(Box<IsNullExpr>),
}

impl ValueExpr {
    pub fn kind(&self) -> NodeKind {
        match self {
            ValueExpr::Column(_) => NodeKind::ColumnReference,
            ValueExpr::Number(_) => NodeKind::NumericConstant,
            ValueExpr::String(_) => NodeKind::StringConstant,
            ValueExpr::Boolean(_) => NodeKind::BooleanConstant,
            ValueExpr::Null(_) => NodeKind::NullConstant,
            ValueExpr::Binary(_) => NodeKind::BinaryOperator,
            ValueExpr::Not(_) => NodeKind::Not,
            ValueExpr::IsNull(_) => NodeKind::IsNull,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ValueExpr::Column(e) => e.span,
            ValueExpr::Number(e) => e.span,
            ValueExpr::String(e) => e.span,
            ValueExpr::Boolean(e) => e.span,
            ValueExpr::Null(e) => e.span,
            ValueExpr::Binary(e) => e.span,
            ValueExpr::Not(e) => e.span,
            ValueExpr::IsNull(e) => e.span,
        }
    }

    pub fn with_span(self, span: Span) -> Self {
        match self {
            ValueExpr::Column(e) => ValueExpr::Column(ColumnReference { span, ..e }),
            ValueExpr::Number(e) => ValueExpr::Number(NumericConstant { span, ..e }),
            ValueExpr::String(e) => ValueExpr::String(StringConstant { span, ..e }),
            ValueExpr::Boolean(e) => ValueExpr::Boolean(BooleanConstant { span, ..e }),
            ValueExpr::Null(_) => ValueExpr::Null(NullConstant { span }),
            ValueExpr::Binary(mut e) => {
                e.span = span;
                ValueExpr::Binary(e)
            }
            ValueExpr::Not(mut e) => {
                e.span = span;
                ValueExpr::Not(e)
            }
            ValueExpr::IsNull(mut e) => {
                e.span = span;
                ValueExpr::IsNull(e)
            }
        }
    }

    /// Unqualified column reference.
    pub fn column(name: impl Into<String>) -> Result<Self> {
        ColumnReference::new(None, Identifier::new(name)).map(ValueExpr::Column)
    }

    pub fn number(text: &str) -> Result<Self> {
        NumericConstant::new(text).map(ValueExpr::Number)
    }

    pub fn string(value: impl Into<String>) -> Self {
        ValueExpr::String(StringConstant::new(value))
    }

    pub fn boolean(value: bool) -> Self {
        ValueExpr::Boolean(BooleanConstant::new(value))
    }

    pub fn null() -> Self {
        ValueExpr::Null(NullConstant::default())
    }

    pub fn binary(op: BinaryOperator, left: ValueExpr, right: ValueExpr) -> Self {
        ValueExpr::Binary(Box::new(BinaryExpr::new(op, left, right)))
    }

    pub fn not(operand: ValueExpr) -> Self {
        ValueExpr::Not(Box::new(NotExpr::new(operand)))
    }

    pub fn is_null(operand: ValueExpr, negated: bool) -> Self {
        ValueExpr::IsNull(Box::new(IsNullExpr::new(operand, negated)))
    }
}

/// `[table.]column`
#[derive(Debug, PartialEq, Serialize)]
pub struct ColumnReference {
    table: Option<TableName>,
    column: Identifier,
    #[serde(skip)]
    span: Span,
}

impl ColumnReference {
    pub fn new(table: Option<TableName>, column: Identifier) -> Result<Self> {
        if column.is_empty() {
            return Err(Error::malformed(
                NodeKind::ColumnReference,
                "column name must not be empty",
            ));
        }
        Ok(Self {
            table,
            column,
            span: Span::default(),
        })
    }

    pub fn table(&self) -> Option<&TableName> {
        self.table.as_ref()
    }

    pub fn column(&self) -> &Identifier {
        &self.column
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Numeric literal text. The text is interned behind an `Arc` and shared
/// between copies of a tree.
#[derive(Debug, PartialEq, Serialize)]
pub struct NumericConstant {
    value: Arc<str>,
    #[serde(skip)]
    span: Span,
}

impl NumericConstant {
    pub fn new(text: &str) -> Result<Self> {
        if !is_numeric_literal(text) {
            return Err(Error::malformed(
                NodeKind::NumericConstant,
                format!("not a numeric literal: {text}"),
            ));
        }
        Ok(Self {
            value: Arc::from(text),
            span: Span::default(),
        })
    }

    /// Share an existing interned value.
    pub(crate) fn shared(value: &Arc<str>, span: Span) -> Self {
        Self {
            value: Arc::clone(value),
            span,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn interned(&self) -> &Arc<str> {
        &self.value
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// `-?digits[.digits][e[+-]digits]`, also `.5` and `5.`
fn is_numeric_literal(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let mut parts = mantissa.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next().unwrap_or("");
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return false;
    }
    if !digits(whole) || !digits(fraction) {
        return false;
    }
    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && digits(exp)
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct StringConstant {
    value: String,
    #[serde(skip)]
    span: Span,
}

impl StringConstant {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            span: Span::default(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct BooleanConstant {
    value: bool,
    #[serde(skip)]
    span: Span,
}

impl BooleanConstant {
    pub fn new(value: bool) -> Self {
        Self {
            value,
            span: Span::default(),
        }
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct NullConstant {
    #[serde(skip)]
    span: Span,
}

impl NullConstant {
    pub fn span(&self) -> Span {
        self.span
    }
}

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "OR",
            BinaryOperator::And => "AND",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }

    /// Binding strength; `NOT` sits at 3.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq => 4,
            BinaryOperator::Plus | BinaryOperator::Minus => 5,
            BinaryOperator::Multiply | BinaryOperator::Divide => 6,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for BinaryOperator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        Ok(match s {
            "OR" => BinaryOperator::Or,
            "AND" => BinaryOperator::And,
            "=" => BinaryOperator::Eq,
            "<>" | "!=" => BinaryOperator::NotEq,
            "<" => BinaryOperator::Lt,
            "<=" => BinaryOperator::LtEq,
            ">" => BinaryOperator::Gt,
            ">=" => BinaryOperator::GtEq,
            "+" => BinaryOperator::Plus,
            "-" => BinaryOperator::Minus,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            other => return Err(format!("unknown operator {other}")),
        })
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct BinaryExpr {
    op: BinaryOperator,
    left: ValueExpr,
    right: ValueExpr,
    #[serde(skip)]
    span: Span,
}

impl BinaryExpr {
    pub fn new(op: BinaryOperator, left: ValueExpr, right: ValueExpr) -> Self {
        Self {
            op,
            left,
            right,
            span: Span::default(),
        }
    }

    pub fn op(&self) -> BinaryOperator {
        self.op
    }

    pub fn left(&self) -> &ValueExpr {
        &self.left
    }

    pub fn right(&self) -> &ValueExpr {
        &self.right
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct NotExpr {
    operand: ValueExpr,
    #[serde(skip)]
    span: Span,
}

impl NotExpr {
    pub fn new(operand: ValueExpr) -> Self {
        Self {
            operand,
            span: Span::default(),
        }
    }

    pub fn operand(&self) -> &ValueExpr {
        &self.operand
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// `operand IS [NOT] NULL`
#[derive(Debug, PartialEq, Serialize)]
pub struct IsNullExpr {
    operand: ValueExpr,
    negated: bool,
    #[serde(skip)]
    span: Span,
}

impl IsNullExpr {
    pub fn new(operand: ValueExpr, negated: bool) -> Self {
        Self {
            operand,
            negated,
            span: Span::default(),
        }
    }

    pub fn operand(&self) -> &ValueExpr {
        &self.operand
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_literals() {
        for ok in ["1", "-12", "3.25", ".5", "5.", "1e10", "2.5E-3"] {
            assert!(NumericConstant::new(ok).is_ok(), "{ok}");
        }
        for bad in ["", "-", ".", "1.2.3", "abc", "1e", "1e+", "--1"] {
            assert!(NumericConstant::new(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_operator_tags() {
        assert_eq!("<>".parse::<BinaryOperator>().unwrap(), BinaryOperator::NotEq);
        assert_eq!("AND".parse::<BinaryOperator>().unwrap(), BinaryOperator::And);
        assert!("LIKE".parse::<BinaryOperator>().is_err());
    }

    #[test]
    fn test_expression_kinds() {
        let expr = ValueExpr::binary(
            BinaryOperator::And,
            ValueExpr::is_null(ValueExpr::column("a").unwrap(), true),
            ValueExpr::not(ValueExpr::boolean(false)),
        );
        assert_eq!(expr.kind(), NodeKind::BinaryOperator);
        assert_eq!(ValueExpr::null().kind(), NodeKind::NullConstant);
    }

    #[test]
    fn test_empty_column_reference_rejected() {
        let err = ValueExpr::column("").unwrap_err();
        assert_eq!(err.kind(), Some(NodeKind::ColumnReference));
        assert!(ColumnReference::new(Some(TableName::parse("t").unwrap()), Identifier::new(""))
            .is_err());
    }
}
