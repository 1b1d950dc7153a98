//! Performance benchmarks for the live mirror.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use live_mirror::{
    to_field_map, RemoteDb, SlotValue, StateShape, StateStore, SyncPlugin, SyncedStore,
};
use serde_json::json;

#[derive(Default)]
struct BenchState {
    slot: SlotValue,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum BenchKey {
    Slot,
}

impl StateShape for BenchState {
    type Key = BenchKey;

    fn slot(&self, _key: BenchKey) -> &SlotValue {
        &self.slot
    }

    fn slot_mut(&mut self, _key: BenchKey) -> &mut SlotValue {
        &mut self.slot
    }
}

fn bench_app(db: &RemoteDb) -> SyncedStore<BenchState> {
    SyncPlugin::new(db.clone()).install(StateStore::new("bench", BenchState::default()))
}

/// Benchmark document delivery with varying numbers of mirrors on one doc
fn bench_document_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_fanout");

    for mirrors in [1, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("mirrors", mirrors),
            &mirrors,
            |b, &mirrors| {
                let db = RemoteDb::new();
                let doc = db.collection("animals").unwrap().doc("wombat").unwrap();

                let apps: Vec<_> = (0..mirrors)
                    .map(|_| {
                        let app = bench_app(&db);
                        app.sync(BenchKey::Slot, doc.clone()).unwrap();
                        app
                    })
                    .collect();

                let fields = to_field_map(&json!({"name": "wombat", "age": 3})).unwrap();
                b.iter(|| {
                    db.set(&doc, black_box(fields.clone())).unwrap();
                });

                drop(apps);
            },
        );
    }

    group.finish();
}

/// Benchmark result-set delivery with varying collection sizes
fn bench_collection_delivery(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection_delivery");

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("docs", size), &size, |b, &size| {
            let db = RemoteDb::new();
            let animals = db.collection("animals").unwrap();

            for i in 0..size {
                db.set(
                    &animals.doc(&format!("doc-{i:05}")).unwrap(),
                    to_field_map(&json!({"n": i})).unwrap(),
                )
                .unwrap();
            }

            let app = bench_app(&db);
            app.sync(BenchKey::Slot, animals.clone()).unwrap();

            let touched = animals.doc("doc-00000").unwrap();
            let fields = to_field_map(&json!({"n": -1})).unwrap();
            b.iter(|| {
                // Each write re-delivers the whole result set to the mirror
                db.set(&touched, black_box(fields.clone())).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_document_fanout, bench_collection_delivery);
criterion_main!(benches);
