//! Performance benchmarks for the hierarchy cache
//!
//! Run with: `cargo bench -p tasktree-core`
//!
//! These benchmarks measure the pure in-memory paths every mutation and
//! tree query goes through:
//! - Wholesale rebuild from (id, parent) pairs
//! - Ancestor chain walks (move validation, breadcrumbs, propagation)
//! - Subtree collection (cascading delete impact)

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tasktree_core::hierarchy::{validate_move, HierarchyCache};
use tasktree_core::models::TodoId;

/// Complete 4-ary forest as (id, parent) pairs, heap-indexed.
fn forest_pairs(node_count: i64) -> Vec<(TodoId, Option<TodoId>)> {
    let mut pairs = Vec::with_capacity(node_count as usize);
    pairs.push((1, None));
    for id in 2..=node_count {
        pairs.push((id, Some((id - 2) / 4 + 1)));
    }
    pairs
}

/// Single chain 1 -> 2 -> ... -> n, the worst case for ancestor walks.
fn chain_pairs(node_count: i64) -> Vec<(TodoId, Option<TodoId>)> {
    (1..=node_count)
        .map(|id| (id, if id == 1 { None } else { Some(id - 1) }))
        .collect()
}

fn bench_rebuild(c: &mut Criterion) {
    let pairs = forest_pairs(10_000);

    c.bench_function("rebuild_10k", |b| {
        b.iter(|| {
            let mut cache = HierarchyCache::new();
            cache.rebuild(pairs.iter().copied());
            black_box(cache.relation_count())
        })
    });
}

fn bench_ancestor_chain(c: &mut Criterion) {
    let mut shallow = HierarchyCache::new();
    shallow.rebuild(forest_pairs(10_000));

    let mut deep = HierarchyCache::new();
    deep.rebuild(chain_pairs(1_000));

    c.bench_function("ancestor_chain_forest_10k", |b| {
        b.iter(|| black_box(shallow.ancestor_chain(black_box(9_999))))
    });

    c.bench_function("ancestor_chain_depth_1k", |b| {
        b.iter(|| black_box(deep.ancestor_chain(black_box(1_000))))
    });
}

fn bench_subtree(c: &mut Criterion) {
    let mut cache = HierarchyCache::new();
    cache.rebuild(forest_pairs(10_000));

    c.bench_function("subtree_ids_full_10k", |b| {
        b.iter(|| black_box(cache.subtree_ids(black_box(1))))
    });

    c.bench_function("subtree_ids_mid_10k", |b| {
        b.iter(|| black_box(cache.subtree_ids(black_box(100))))
    });
}

fn bench_move_validation(c: &mut Criterion) {
    let mut deep = HierarchyCache::new();
    deep.rebuild(chain_pairs(1_000));

    // Moving the root under the deepest leaf walks the entire chain
    // before rejecting.
    c.bench_function("validate_move_cycle_depth_1k", |b| {
        b.iter(|| black_box(validate_move(&deep, black_box(1), Some(black_box(1_000)))))
    });
}

criterion_group!(
    benches,
    bench_rebuild,
    bench_ancestor_chain,
    bench_subtree,
    bench_move_validation
);
criterion_main!(benches);
