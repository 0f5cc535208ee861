//! Tree container benchmarks.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quarry_cache::CacheManager;
use quarry_common::config::CacheConfig;
use quarry_common::types::{ColumnId, DatabaseId, RowId, SchemaId, TableId, TreeAddress};
use quarry_storage::{ColumnSchema, DataType, Row, TableSchema, Value, ValueComparison};

fn tree() -> TreeAddress {
    TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1))
}

fn schema() -> TableSchema {
    TableSchema::new(
        tree(),
        "bench",
        vec![
            ColumnSchema::new(ColumnId::new(1), "id", DataType::Int, false, 0),
            ColumnSchema::new(ColumnId::new(2), "body", DataType::Varchar(200), false, 1),
        ],
    )
}

fn row(id: u64, body: &str) -> Row {
    Row::new(
        RowId::new(id),
        vec![Value::Int(id as i32), Value::Text(body.to_string())],
    )
}

fn add_row_benchmark(c: &mut Criterion) {
    c.bench_function("tree_add_1000_rows", |b| {
        b.iter(|| {
            let manager = CacheManager::in_memory(CacheConfig::default());
            manager.register_tree(schema());
            for i in 1..=1000 {
                manager.try_add_row(tree(), &row(i, "a body of modest size")).unwrap();
            }
            black_box(manager.data().loaded_trees().len())
        })
    });
}

fn get_row_benchmark(c: &mut Criterion) {
    let manager = CacheManager::in_memory(CacheConfig::default());
    manager.register_tree(schema());
    for i in 1..=1000 {
        manager.try_add_row(tree(), &row(i, "a body of modest size")).unwrap();
    }

    c.bench_function("tree_get_1000_rows", |b| {
        b.iter(|| {
            for i in 1..=1000 {
                black_box(manager.get_row(tree(), RowId::new(i)).unwrap());
            }
        })
    });
}

fn update_with_forwarding_benchmark(c: &mut Criterion) {
    c.bench_function("tree_update_growing_100_rows", |b| {
        b.iter(|| {
            let manager = CacheManager::in_memory(CacheConfig::with_page_size(1024));
            manager.register_tree(schema());
            for i in 1..=100 {
                manager.try_add_row(tree(), &row(i, "seed")).unwrap();
            }
            // Growing updates force relocations and stub retargeting.
            for i in 1..=100 {
                manager
                    .update_row(tree(), &row(i, &"x".repeat(120)))
                    .unwrap();
            }
            black_box(manager.get_row(tree(), RowId::new(100)).unwrap())
        })
    });
}

fn scan_benchmark(c: &mut Criterion) {
    let manager = CacheManager::in_memory(CacheConfig::default());
    let container = manager.register_tree(schema());
    for i in 1..=1000 {
        manager.try_add_row(tree(), &row(i, "a body of modest size")).unwrap();
    }
    let container = Arc::clone(&container);

    c.bench_function("tree_scan_1000_rows", |b| {
        b.iter(|| {
            black_box(
                container
                    .count_rows_with_value(
                        ColumnId::new(1),
                        ValueComparison::GreaterThan,
                        &Value::Int(500),
                    )
                    .unwrap(),
            )
        })
    });
}

criterion_group!(
    benches,
    add_row_benchmark,
    get_row_benchmark,
    update_with_forwarding_benchmark,
    scan_benchmark
);
criterion_main!(benches);
