//! Playout throughput on the bundled tic-tac-toe description, circuit
//! against prover.

use criterion::{criterion_group, criterion_main, Criterion};

use ggp_engine::games::tictactoe;
use ggp_engine::{CircuitMachine, GameRng, ProverMachine, StateMachine};

fn bench_depth_charges(c: &mut Criterion) {
    let game = tictactoe::game().unwrap();
    let mut group = c.benchmark_group("depth_charge");

    let mut circuit = CircuitMachine::compile(&game).unwrap();
    let initial = circuit.initial_state().unwrap();
    let mut rng = GameRng::new(42);
    group.bench_function("circuit", |b| {
        b.iter(|| circuit.depth_charge(&initial, &mut rng).unwrap())
    });

    let mut prover = ProverMachine::new(&game);
    group.bench_function("prover", |b| {
        b.iter(|| prover.depth_charge(&initial, &mut rng).unwrap())
    });

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let game = tictactoe::game().unwrap();
    c.bench_function("compile_tictactoe", |b| {
        b.iter(|| CircuitMachine::compile(&game).unwrap())
    });
}

criterion_group!(benches, bench_depth_charges, bench_compile);
criterion_main!(benches);
