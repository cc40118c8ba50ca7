//! Search benchmarks.
//!
//! Run with: `cargo bench -p mcts`
//!
//! Measures full searches at varying simulation counts and game phases,
//! the effect of worker count, and policy extraction on a grown tree.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use games_tictactoe::TicTacToe;
use mcts::{Mcts, MctsConfig, RandomOracle};

fn bench_explore_simulations(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore_simulations");

    for sims in [50u32, 200, 800] {
        group.throughput(Throughput::Elements(u64::from(sims)));
        group.bench_with_input(BenchmarkId::new("uniform", sims), &sims, |b, &sims| {
            let state = TicTacToe::new();
            b.iter_batched(
                || Mcts::new(RandomOracle::new(), MctsConfig::default()),
                |mut engine| {
                    engine.explore(&state, sims).unwrap();
                    black_box(engine.node_count())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_game_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore_game_phases");
    let sims = 200u32;

    let phases = [
        ("opening", TicTacToe::new()),
        ("midgame", TicTacToe::from_moves(&[4, 0, 2, 6]).unwrap()),
        ("near_terminal", TicTacToe::from_moves(&[0, 3, 1, 4]).unwrap()),
    ];

    for (name, state) in phases {
        group.bench_function(name, |b| {
            b.iter_batched(
                || Mcts::new(RandomOracle::new(), MctsConfig::default()),
                |mut engine| {
                    engine.explore(&state, sims).unwrap();
                    black_box(engine.node_count())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_worker_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore_workers");
    let sims = 200u32;

    for workers in [1usize, 2, 4] {
        group.bench_with_input(
            BenchmarkId::new("workers", workers),
            &workers,
            |b, &workers| {
                let state = TicTacToe::new();
                b.iter_batched(
                    || {
                        Mcts::new(
                            RandomOracle::new(),
                            MctsConfig::default().with_workers(workers),
                        )
                    },
                    |mut engine| {
                        engine.explore(&state, sims).unwrap();
                        black_box(engine.node_count())
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_policy_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy");

    let state = TicTacToe::new();
    let mut engine = Mcts::new(RandomOracle::new(), MctsConfig::default());
    engine.explore(&state, 800).unwrap();

    group.bench_function("proportional", |b| {
        b.iter(|| black_box(engine.policy(&state, 1.0).unwrap()))
    });
    group.bench_function("greedy", |b| {
        b.iter(|| black_box(engine.policy(&state, 0.0).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_explore_simulations,
    bench_game_phases,
    bench_worker_counts,
    bench_policy_extraction,
);

criterion_main!(benches);
