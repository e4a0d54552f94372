//! Eager Loading Benchmarks
//!
//! Measures batched relation resolution against the in-memory executor for
//! growing parent sets. Query count stays constant; the cost that grows is
//! key collection, dictionary building and assignment.

use std::sync::Arc;

use criterion::measurement::WallTime;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkGroup, BenchmarkId, Criterion};
use linkage_orm::{
    Collection, EagerLoader, MemoryDatabase, Model, RawRow, Record, RelationRegistry, Schema, Session,
};
use serde_json::{json, Value};
use tokio::runtime::Runtime;

struct Owner;

impl Model for Owner {
    fn model_name() -> &'static str {
        "Owner"
    }

    fn table_name() -> &'static str {
        "owners"
    }

    fn relations(registry: &mut RelationRegistry) {
        registry.define("items", |r| r.has_many::<Item>());
    }
}

struct Item;

impl Model for Item {
    fn model_name() -> &'static str {
        "Item"
    }

    fn table_name() -> &'static str {
        "items"
    }

    fn relations(registry: &mut RelationRegistry) {
        registry.define("owner", |r| r.belongs_to::<Owner>());
    }
}

struct Fixture {
    session: Session,
    owners: Vec<RawRow>,
    items: Vec<RawRow>,
}

fn generate_fixture(owners: usize) -> Fixture {
    let owner_rows: Vec<Value> = (1..=owners).map(|id| json!({"id": id, "name": format!("owner_{}", id)})).collect();
    let item_rows: Vec<Value> = (1..=owners * 3)
        .map(|id| json!({"id": id, "owner_id": (id % owners) + 1, "label": format!("item_{}", id)}))
        .collect();

    let db = MemoryDatabase::new()
        .table("owners", owner_rows.clone())
        .table("items", item_rows.clone());
    let schema = Schema::new().register::<Owner>().register::<Item>();
    Fixture {
        session: Session::new(schema, Arc::new(db)),
        owners: owner_rows.into_iter().filter_map(|row| row.as_object().cloned()).collect(),
        items: item_rows.into_iter().filter_map(|row| row.as_object().cloned()).collect(),
    }
}

// Resolved relations cannot be replaced, so every iteration loads onto
// freshly hydrated parents.
fn bench_load(group: &mut BenchmarkGroup<'_, WallTime>, rt: &Runtime, fixture: &Fixture, name: &str, model: &str, path: &str) {
    let size = fixture.owners.len();
    let rows = if model == "Owner" { &fixture.owners } else { &fixture.items };
    let loader = EagerLoader::from_paths(&[path]);
    let session = &fixture.session;
    let loader = &loader;

    group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
        b.to_async(rt).iter_batched(
            || session.hydrate(model, rows.clone()).unwrap(),
            |parents: Collection| async move {
                let refs: Vec<&Record> = parents.iter().map(|r| r.as_ref()).collect();
                loader.load(session, &refs).await.unwrap();
                black_box(parents)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_batched_relations(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("batched_relations");

    for &size in &[10usize, 100, 1000] {
        let fixture = generate_fixture(size);
        bench_load(&mut group, &rt, &fixture, "has_many", "Owner", "items");
        bench_load(&mut group, &rt, &fixture, "belongs_to", "Item", "owner");
        bench_load(&mut group, &rt, &fixture, "nested_round_trip", "Owner", "items.owner");
    }

    group.finish();
}

criterion_group!(benches, bench_batched_relations);
criterion_main!(benches);
