//! Indented debug dump of a syntax tree.
//!
//! One line per node: the kind, then its scalar fields as `key=value`, then
//! its children indented by two spaces. Intended for test failure output and
//! debugging rewrite passes.
//!
//! ```text
//! CreateIndex unique=true existence=NoCondition
//!   TableName name=idx1
//!   TableName name=t1
//!   IndexColumnList
//!     IndexColumn column=c1 ascending=true
//! ```

use crate::nodes::{AlterTableAction, ConstraintBody, ExistenceCheck, Node, Options, ValueExpr};
use crate::traversal::NodeRef;
use crate::nodes::IndexDefinition;

/// Dump `node` and every descendant.
pub fn tree_print(node: &Node) -> String {
    let mut out = String::new();
    print_node(&mut out, NodeRef::from(node), 0);
    out
}

fn print_node(out: &mut String, node: NodeRef<'_>, indent: usize) {
    for _ in 0..indent {
        out.push_str("  ");
    }
    out.push_str(node.kind().name());
    fields(out, node);
    out.push('\n');
    for child in node.children() {
        print_node(out, child, indent + 1);
    }
}

fn options(options: &Options) -> String {
    let entries: Vec<String> = options.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    format!("{{{}}}", entries.join(", "))
}

fn fields(out: &mut String, node: NodeRef<'_>) {
    match node {
        NodeRef::TableName(n) => {
            out.push_str(&format!(" name={n}"));
        }
        NodeRef::Value(v) => match v {
            ValueExpr::Column(c) => {
                out.push_str(&format!(" column={}", c.column()));
            }
            ValueExpr::Number(n) => {
                out.push_str(&format!(" value={}", n.value()));
            }
            ValueExpr::String(s) => {
                out.push_str(&format!(" value={:?}", s.value()));
            }
            ValueExpr::Boolean(b) => {
                out.push_str(&format!(" value={}", b.value()));
            }
            ValueExpr::Binary(e) => {
                out.push_str(&format!(" op={}", e.op()));
            }
            ValueExpr::IsNull(e) => {
                out.push_str(&format!(" negated={}", e.is_negated()));
            }
            ValueExpr::Null(_) | ValueExpr::Not(_) => {}
        },
        NodeRef::ColumnList(l) => {
            let names: Vec<String> = l.iter().map(ToString::to_string).collect();
            out.push_str(&format!(" columns=[{}]", names.join(", ")));
        }
        NodeRef::IndexColumn(c) => {
            out.push_str(&format!(" column={} ascending={}", c.column(), c.is_ascending()));
        }
        NodeRef::IndexColumnList(_) => {}
        NodeRef::StorageFormat(s) => {
            out.push_str(&format!(" format={}", s.format()));
            if !s.options().is_empty() {
                out.push_str(&format!(" options={}", options(s.options())));
            }
        }
        NodeRef::ColumnDefinition(c) => {
            out.push_str(&format!(
                " name={} type={} not_null={}",
                c.name(),
                c.data_type(),
                c.is_not_null()
            ));
        }
        NodeRef::Constraint(c) => {
            out.push_str(&format!(" type={}", c.constraint_type().tag()));
            match c.body() {
                ConstraintBody::ForeignKey(fk) => {
                    out.push_str(&format!(
                        " delete={:?} update={:?} match={:?} grouping={}",
                        fk.delete_rule, fk.update_rule, fk.match_type, fk.grouping
                    ));
                    out.push_str(&format!(
                        " deferrable={} initially_deferred={}",
                        fk.deferrable, fk.initially_deferred
                    ));
                }
                ConstraintBody::Drop(drop) => {
                    out.push_str(&format!(
                        " drop behavior={:?} existence={:?} grouping={}",
                        drop.behavior, drop.existence_check, drop.grouping
                    ));
                }
                _ => {}
            }
        }
        NodeRef::IndexConstraint(i) => {
            out.push_str(&format!(" name={} unique={}", i.name(), i.is_unique()));
            if let Some(join) = i.join_type() {
                out.push_str(&format!(" join={}", join.tag()));
            }
        }
        NodeRef::CreateIndex(i) => {
            out.push_str(&format!(
                " unique={} existence={:?}",
                i.is_unique(),
                i.existence_check()
            ));
            if let Some(join) = i.join_type() {
                out.push_str(&format!(" join={}", join.tag()));
            }
            if !i.options().is_empty() {
                out.push_str(&format!(" options={}", options(i.options())));
            }
        }
        NodeRef::DropIndex(d) => {
            out.push_str(&format!(" existence={:?}", d.existence_check()));
        }
        NodeRef::CreateTable(t) => {
            out.push_str(&format!(" existence={:?}", t.existence_check()));
        }
        NodeRef::DropTable(d) => {
            out.push_str(&format!(
                " existence={:?} behavior={:?}",
                d.existence_check(),
                d.behavior()
            ));
        }
        NodeRef::AlterTable(a) => {
            let dropped: Vec<String> = a
                .actions()
                .iter()
                .filter_map(|action| match action {
                    AlterTableAction::DropColumn {
                        column,
                        existence_check: ExistenceCheck::NoCondition,
                    } => Some(column.to_string()),
                    AlterTableAction::DropColumn {
                        column,
                        existence_check,
                    } => Some(format!("{column} ({existence_check:?})")),
                    _ => None,
                })
                .collect();
            if !dropped.is_empty() {
                out.push_str(&format!(" drop_columns=[{}]", dropped.join(", ")));
            }
        }
    }
}
