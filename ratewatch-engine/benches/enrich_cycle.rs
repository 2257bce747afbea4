use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ratewatch_engine::{node_index_shard_rules, DeltaEngine, NodeIndexShards, Preset, SnapshotStore};
use ratewatch_types::{CounterSnapshot, EntityId, Millis};

fn counter_poll(entities: usize, step: u64) -> BTreeMap<EntityId, CounterSnapshot> {
    (0..entities)
        .map(|i| {
            let base = i as u64 * 100 + step * 10;
            let snapshot = CounterSnapshot::builder()
                .counter("get_missing_doc_total", base)
                .counter("indexing_index_total", base + 1)
                .counter("indexing_index_total_time", base + 2)
                .counter("indexing_failed_index_total", base + 3)
                .counter("merges_total", base + 4)
                .counter("merges_total_time", base + 5)
                .counter("search_query_total", base + 6)
                .counter("search_query_time", base + 7)
                .build();
            (EntityId::from(format!("index-node_id-node{}", i)), snapshot)
        })
        .collect()
}

fn shard_poll(entities: usize, step: u64) -> BTreeMap<EntityId, NodeIndexShards> {
    (0..entities)
        .map(|i| {
            let base = i as u64 * 100 + step * 10;
            let shards = NodeIndexShards {
                get_missing_doc_total: Some(base),
                indexing_index_total: Some(base + 1),
                indexing_index_total_time: Some(base + 2),
                indexing_failed_index_total: Some(base + 3),
                merges_total: Some(base + 4),
                merges_total_time: Some(base + 5),
                search_query_total: Some(base + 6),
                search_query_time: Some(base + 7),
                ..NodeIndexShards::new("index", format!("node{}", i))
            };
            (EntityId::from(shards.index_node.clone()), shards)
        })
        .collect()
}

/// Benchmark enrich_all over map-shaped snapshots with varying entity counts
fn bench_enrich_all_counter_snapshots(c: &mut Criterion) {
    let mut group = c.benchmark_group("enrich_all_counter_snapshots");
    let engine = DeltaEngine::new(Preset::NodeIndex.rule_set().unwrap());

    for entity_count in [1, 10, 100, 1000].iter() {
        let mut store = SnapshotStore::new();
        store.begin_cycle_at(Millis(1_000));
        store.commit(counter_poll(*entity_count, 0));
        store.begin_cycle_at(Millis(11_000));

        let next = counter_poll(*entity_count, 1);

        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            entity_count,
            |b, _| {
                b.iter(|| {
                    let mut entities = next.clone();
                    black_box(engine.enrich_all(&mut entities, &store));
                });
            },
        );
    }
    group.finish();
}

/// Benchmark enrich_all over typed snapshots with varying entity counts
fn bench_enrich_all_typed_shards(c: &mut Criterion) {
    let mut group = c.benchmark_group("enrich_all_typed_shards");
    let engine = DeltaEngine::new(node_index_shard_rules());

    for entity_count in [1, 10, 100, 1000].iter() {
        let mut store = SnapshotStore::new();
        store.begin_cycle_at(Millis(1_000));
        store.commit(shard_poll(*entity_count, 0));
        store.begin_cycle_at(Millis(11_000));

        let next = shard_poll(*entity_count, 1);

        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            entity_count,
            |b, _| {
                b.iter(|| {
                    let mut entities = next.clone();
                    black_box(engine.enrich_all(&mut entities, &store));
                });
            },
        );
    }
    group.finish();
}

/// Benchmark a full begin/enrich/commit cycle
fn bench_run_cycle(c: &mut Criterion) {
    let engine = DeltaEngine::new(Preset::NodeIndex.rule_set().unwrap());
    let polls = [counter_poll(100, 0), counter_poll(100, 1)];

    c.bench_function("run_cycle_100_entities", |b| {
        let mut store = SnapshotStore::new();
        let mut ts = 0u64;
        b.iter(|| {
            ts += 10_000;
            let poll = polls[(ts / 10_000 % 2) as usize].clone();
            black_box(engine.run_cycle(&mut store, Some(Millis(ts)), poll));
        });
    });
}

criterion_group!(
    benches,
    bench_enrich_all_counter_snapshots,
    bench_enrich_all_typed_shards,
    bench_run_cycle,
);

criterion_main!(benches);
