use contrib_metrics::{cardinal, combinatorics, game::build_games, EngineConfig, GameRow};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// Generate a dense test game over `n` players with a deterministic,
/// mildly super-additive characteristic function.
fn generate_test_game(n: u8) -> contrib_metrics::Game {
    let players: Vec<u8> = (0..n).collect();
    let rows: Vec<GameRow> = combinatorics::power_set_lex(&players)
        .into_iter()
        .map(|coalition| {
            let size = coalition.len() as f64;
            let weight: f64 = coalition.members().map(|p| f64::from(p) + 1.0).sum();
            let value = weight + 0.25 * size * size;
            GameRow::new("bench", "0", coalition, Some(value), None)
        })
        .collect();
    build_games(&rows, &EngineConfig::default()).unwrap().remove(0)
}

fn bench_shapley_exact(c: &mut Criterion) {
    let mut group = c.benchmark_group("shapley_exact");
    for n in [6u8, 8, 10] {
        let game = generate_test_game(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &game, |b, game| {
            b.iter(|| cardinal::shapley_exact(black_box(game)));
        });
    }
    group.finish();
}

fn bench_shapley_interaction_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("shapley_interaction_pairs");
    for n in [6u8, 8] {
        let game = generate_test_game(n);
        let pairs = combinatorics::subsets_sized(&game.players, 2, 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &game, |b, game| {
            b.iter(|| cardinal::shapley_interaction(black_box(game), black_box(&pairs)));
        });
    }
    group.finish();
}

fn bench_monte_carlo(c: &mut Criterion) {
    let game = generate_test_game(10);
    c.bench_function("shapley_mc_1000", |b| {
        b.iter(|| cardinal::shapley_monte_carlo(black_box(&game), 1000, 42));
    });
}

criterion_group!(
    benches,
    bench_shapley_exact,
    bench_shapley_interaction_pairs,
    bench_monte_carlo
);
criterion_main!(benches);
