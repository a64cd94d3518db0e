use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mis_search::{enumerate, Combination, Combinations, FailureFrontier, Strategy};

fn keys(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{}-1", i)).collect()
}

fn bench_enumerate(c: &mut Criterion) {
    let keys = keys(14);

    for strategy in [Strategy::Bfs, Strategy::Dfs] {
        c.bench_function(&format!("enumerate_{}_14", strategy), |b| {
            b.iter(|| black_box(enumerate(black_box(&keys), strategy).count()))
        });
    }

    c.bench_function("enumerate_bfs_14_max_4", |b| {
        b.iter(|| black_box(Combinations::new(black_box(&keys), Strategy::Bfs, Some(4)).count()))
    });
}

fn bench_frontier(c: &mut Criterion) {
    let keys = keys(12);

    // Every pair containing the first key fails, so most of the lattice is pruned.
    let mut frontier = FailureFrontier::new();
    for other in &keys[1..] {
        frontier.record_failure(Combination::new([keys[0].as_str(), other.as_str()]));
    }

    c.bench_function("frontier_should_prune_12", |b| {
        b.iter(|| {
            enumerate(&keys, Strategy::Bfs)
                .filter(|combo| frontier.should_prune(black_box(combo)))
                .count()
        })
    });
}

criterion_group!(benches, bench_enumerate, bench_frontier);
criterion_main!(benches);
