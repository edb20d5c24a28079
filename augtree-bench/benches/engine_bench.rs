//! Core operation benchmarks

use augtree::{LinkMode, RbTree, TreeConfig};
use augtree_bench::{keys_with_duplicates, shuffled_keys};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_insert_by_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert/By Key");

    for size in [1_000, 10_000, 100_000].iter() {
        let keys = shuffled_keys(*size, 42);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("shuffled", size), &keys, |b, keys| {
            b.iter_with_setup(
                || {
                    let cfg: TreeConfig<i32> = TreeConfig::new(LinkMode::Successor, |a, b| a.cmp(b));
                    RbTree::new(cfg)
                },
                |mut tree| {
                    for &k in keys {
                        tree.insert_by_key(k).unwrap();
                    }
                    black_box(tree.len())
                },
            );
        });
    }

    group.finish();
}

fn bench_insert_by_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert/By Rank");

    for size in [1_000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("append", size), size, |b, &size| {
            b.iter_with_setup(
                || {
                    let cfg: TreeConfig<i32> = TreeConfig::new(LinkMode::Successor, |a, b| a.cmp(b));
                    RbTree::new(cfg)
                },
                |mut tree| {
                    for i in 0..size as i32 {
                        tree.append(i).unwrap();
                    }
                    black_box(tree.len())
                },
            );
        });

        group.bench_with_input(BenchmarkId::new("middle_insert", size), size, |b, &size| {
            b.iter_with_setup(
                || {
                    let cfg: TreeConfig<i32> = TreeConfig::new(LinkMode::Successor, |a, b| a.cmp(b));
                    let mut tree = RbTree::new(cfg);
                    for i in 0..size as i32 {
                        tree.append(i).unwrap();
                    }
                    tree
                },
                |mut tree| {
                    let mid = tree.len() as u32 / 2;
                    tree.insert_by_rank(mid, -1).unwrap();
                    black_box(tree.len())
                },
            );
        });
    }

    group.finish();
}

fn bench_rank_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lookup/By Rank");

    for size in [1_000, 10_000, 100_000].iter() {
        let mut tree: RbTree<i32> = {
            let cfg = TreeConfig::new(LinkMode::Successor, |a: &i32, b: &i32| a.cmp(b));
            RbTree::new(cfg)
        };
        for i in 0..*size as i32 {
            tree.append(i).unwrap();
        }

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("value_at_rank", size), size, |b, &size| {
            b.iter(|| {
                for k in (0..size).step_by((size / 100).max(1) as usize) {
                    black_box(tree.value_at_rank(k).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_duplicate_group_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Duplicates/Group Churn");

    for &(distinct, group_size) in &[(100u32, 10u32), (1_000, 10), (100, 100)] {
        let total = distinct * group_size;
        let keys = keys_with_duplicates(distinct, group_size, 1337);

        group.throughput(Throughput::Elements(total as u64));
        group.bench_with_input(
            BenchmarkId::new("insert_then_drain", format!("{distinct}x{group_size}")),
            &keys,
            |b, keys| {
                b.iter_with_setup(
                    || {
                        let cfg: TreeConfig<i32> =
                            TreeConfig::new(LinkMode::Satellite, |a, b| a.cmp(b)).with_duplicates(true);
                        RbTree::new(cfg)
                    },
                    |mut tree| {
                        for &k in keys {
                            tree.insert_by_key(k).unwrap();
                        }
                        while !tree.is_empty() {
                            tree.remove_at_rank(tree.len() as u32 - 1).unwrap();
                        }
                        black_box(tree.len())
                    },
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_by_key,
    bench_insert_by_rank,
    bench_rank_lookup,
    bench_duplicate_group_churn
);
criterion_main!(benches);
