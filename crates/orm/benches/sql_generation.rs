//! SQL Generation Performance Benchmarks
//!
//! Measures compilation of SELECT statements with growing condition lists

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quarry_orm::query::{QueryBuilder, Row};
use quarry_orm::security::count_placeholders;

fn bench_basic_sql_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("basic_sql_generation");

    group.bench_function("simple_select", |b| {
        let query: QueryBuilder<Row> = QueryBuilder::detached()
            .table("users")
            .select(["id", "name", "email"]);

        b.iter(|| black_box(query.to_sql()))
    });

    group.bench_function("select_with_where", |b| {
        let query: QueryBuilder<Row> = QueryBuilder::detached()
            .table("users")
            .select(["id", "name", "email"])
            .where_eq("active", true)
            .where_("created_at", ">", "2023-01-01");

        b.iter(|| black_box(query.to_sql()))
    });

    group.bench_function("select_with_nested_groups", |b| {
        let query: QueryBuilder<Row> = QueryBuilder::detached()
            .table("users")
            .where_eq("active", true)
            .where_nested(|q| {
                q.where_in("role", ["admin", "editor", "author"])
                    .or_where_nested(|q| q.where_between("age", 18, 30).where_not_null("email"))
            })
            .or_where_raw("lower(name) LIKE ?", vec!["%ann%".into()])
            .order_by_desc("created_at")
            .limit(50)
            .offset(100);

        b.iter(|| black_box(query.to_sql()))
    });

    group.finish();
}

fn bench_condition_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("condition_scaling");

    for conditions in [1usize, 10, 50, 200] {
        let mut query: QueryBuilder<Row> = QueryBuilder::detached().table("events");
        for i in 0..conditions {
            query = if i % 2 == 0 {
                query.where_("score", ">", i as i64)
            } else {
                query.or_where_in("kind", [i as i64, i as i64 + 1])
            };
        }

        group.bench_with_input(BenchmarkId::new("where_conditions", conditions), &query, |b, query| {
            b.iter(|| black_box(query.to_sql()))
        });
    }

    group.finish();
}

fn bench_placeholder_scan(c: &mut Criterion) {
    let sql = "SELECT * FROM t WHERE a = ? AND b = 'what?' AND c IN (?, ?, ?) OR d = \"x?\"".repeat(20);

    c.bench_function("count_placeholders", |b| {
        b.iter(|| black_box(count_placeholders(black_box(&sql))))
    });
}

criterion_group!(
    benches,
    bench_basic_sql_generation,
    bench_condition_scaling,
    bench_placeholder_scan
);
criterion_main!(benches);
