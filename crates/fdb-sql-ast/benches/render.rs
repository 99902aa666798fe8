use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fdb_sql_ast::nodes::{
    BinaryOperator, ColumnDefinition, ColumnList, ConstraintDefinition, CreateIndex, CreateTable,
    DataType, ExistenceCheck, ForeignKeyDefinition, Identifier, IndexColumn, IndexColumnList,
    Node, TableElement, TableName, ValueExpr,
};
use fdb_sql_ast::{deep_copy, render, SessionContext};

fn simple_index(ctx: &SessionContext) -> Node {
    CreateIndex::builder(
        TableName::parse("idx1").unwrap(),
        TableName::parse("t1").unwrap(),
        IndexColumnList::new(vec![
            IndexColumn::asc("c1").unwrap(),
            IndexColumn::desc("c2").unwrap(),
        ])
        .unwrap(),
    )
    .unique(true)
    .build(ctx)
    .unwrap()
    .into()
}

/// A table with `width` columns, a primary key, a foreign key and a check.
fn wide_table(ctx: &SessionContext, width: usize) -> Node {
    let mut elements: Vec<TableElement> = (0..width)
        .map(|i| {
            TableElement::Column(
                ColumnDefinition::new(
                    Identifier::new(format!("c{i}")),
                    DataType::Varchar(64),
                    i == 0,
                    None,
                )
                .unwrap(),
            )
        })
        .collect();
    elements.push(TableElement::Constraint(ConstraintDefinition::primary_key(
        None,
        ColumnList::from_names(["c0"]).unwrap(),
    )));
    elements.push(TableElement::Constraint(
        ConstraintDefinition::foreign_key(
            ctx,
            Some(TableName::parse("fk1").unwrap()),
            ForeignKeyDefinition::new(
                ColumnList::from_names(["c1"]).unwrap(),
                TableName::parse("parent").unwrap(),
                Some(ColumnList::from_names(["id"]).unwrap()),
            ),
        )
        .unwrap(),
    ));
    let first = ValueExpr::is_null(ValueExpr::column("c0").unwrap(), true);
    let condition = (1..width).fold(first, |acc, i| {
        ValueExpr::binary(
            BinaryOperator::Or,
            acc,
            ValueExpr::is_null(ValueExpr::column(format!("c{i}")).unwrap(), true),
        )
    });
    elements.push(TableElement::Constraint(ConstraintDefinition::check(None, condition)));

    CreateTable::new(
        TableName::parse("app.wide").unwrap(),
        ExistenceCheck::IfNotExists,
        elements,
        None,
    )
    .unwrap()
    .into()
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let ctx = SessionContext::new();

    let index = simple_index(&ctx);
    group.bench_function("create_index", |b| b.iter(|| render(black_box(&index))));

    for width in [8, 64, 256] {
        let table = wide_table(&ctx, width);
        group.bench_with_input(BenchmarkId::new("create_table", width), &table, |b, node| {
            b.iter(|| render(black_box(node)))
        });
    }

    group.finish();
}

fn bench_deep_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_copy");
    let ctx = SessionContext::new();

    let index = simple_index(&ctx);
    group.bench_function("create_index", |b| {
        b.iter(|| deep_copy(black_box(&index), &ctx))
    });

    for width in [8, 64] {
        let table = wide_table(&ctx, width);
        group.bench_with_input(BenchmarkId::new("create_table", width), &table, |b, node| {
            b.iter(|| deep_copy(black_box(node), &ctx))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_deep_copy);
criterion_main!(benches);
