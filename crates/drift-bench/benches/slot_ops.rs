//! Criterion micro-benchmarks for slot-store churn and iteration.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use drift_arena::Arena;
use drift_bench::{churn_ops, run_churn};
use drift_core::PAGE_SIZE;
use drift_slots::SlotStore;

/// Benchmark: replay 10K insert/remove steps from an empty store.
fn bench_churn_10k(c: &mut Criterion) {
    let ops = churn_ops(42, 10_000, 55);
    let mut arena = Arena::with_label("bench", 4 << 20);
    c.bench_function("slot_churn_10k", |b| {
        b.iter(|| {
            let mut store = SlotStore::<u64>::new();
            black_box(run_churn(&mut arena, &mut store, &ops).unwrap());
            arena.reset();
        });
    });
}

/// Benchmark: iterate a half-empty store of 10K slots.
fn bench_iter_sparse(c: &mut Criterion) {
    let mut arena = Arena::with_label("bench", 4 << 20);
    let mut store = SlotStore::<u64>::new();
    let handles: Vec<_> = (0..10_000)
        .map(|_| store.insert(&mut arena).unwrap().0)
        .collect();
    for h in handles.iter().step_by(2) {
        store.remove(h.locator()).unwrap();
    }
    c.bench_function("slot_iter_sparse_10k", |b| {
        b.iter(|| {
            let sum: u64 = store.iter(&arena).unwrap().map(|(_, v)| *v).sum();
            black_box(sum);
        });
    });
}

/// Benchmark: checked lookups through handles.
fn bench_get_live(c: &mut Criterion) {
    let mut arena = Arena::with_label("bench", 1 << 20);
    let mut store = SlotStore::<u64>::new();
    let handles: Vec<_> = (0..PAGE_SIZE * 16)
        .map(|_| store.insert(&mut arena).unwrap().0)
        .collect();
    c.bench_function("slot_get_live_1k", |b| {
        b.iter(|| {
            for h in &handles {
                black_box(store.get_live(&arena, *h).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_churn_10k, bench_iter_sparse, bench_get_live);
criterion_main!(benches);
