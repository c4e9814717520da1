//! Benchmarks for whole boards.
//!
//! This benchmarks the frame loop with many machines: movement, sensing,
//! shots and event resolution together.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use blue::instructions::Instructions;
use blue::scenario::{Scenario, generate_scenario};
use criterion::{Criterion, criterion_group, criterion_main};

fn load_program(name: &str) -> Instructions {
    let path = format!("{}/programs/{name}.asm", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap().parse().unwrap()
}

fn create_bench_scenario(drones: usize, frames: u64) -> Scenario {
    let names = ["miner", "sentry", "wanderer"];
    let programs: Vec<Instructions> = (0..drones).map(|i| load_program(names[i % names.len()])).collect();
    let mut scenario = generate_scenario(42, 32, 32, &programs).unwrap();
    scenario.frames = frames;
    scenario
}

fn bench_small_board(c: &mut Criterion) {
    let scenario = create_bench_scenario(3, 200);

    c.bench_function("board_3_drones_200_frames", |b| {
        b.iter(|| {
            let board = scenario.run_with(black_box(42), scenario.frames, |_, _| {}).unwrap();
            black_box(board.machine_count())
        });
    });
}

fn bench_crowded_board(c: &mut Criterion) {
    let scenario = create_bench_scenario(24, 200);

    c.bench_function("board_24_drones_200_frames", |b| {
        b.iter(|| {
            let board = scenario.run_with(black_box(42), scenario.frames, |_, _| {}).unwrap();
            black_box(board.machine_count())
        });
    });
}

fn bench_seed_batch(c: &mut Criterion) {
    // Ten seeds sequentially, as one batch worker would run them
    let scenario = create_bench_scenario(6, 100);

    c.bench_function("10_seeds_sequential", |b| {
        b.iter(|| {
            for seed in 0..10u64 {
                let board = scenario.run_with(black_box(seed), scenario.frames, |_, _| {}).unwrap();
                black_box(board.frame_number());
            }
        });
    });
}

criterion_group!(benches, bench_small_board, bench_crowded_board, bench_seed_batch);
criterion_main!(benches);
