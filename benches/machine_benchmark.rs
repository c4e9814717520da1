//! Benchmarks for the machine VM.
//!
//! A single stock drone runs tight loops so that instruction dispatch
//! dominates the frame.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use blue::board::FrameEvents;
use blue::hex::{HexCoord, HexFacing};
use blue::instructions::{Instructions, compile_code};
use blue::scenario::{Placement, Scenario, drone_template};
use criterion::{Criterion, criterion_group, criterion_main};

const ARITHMETIC: &str = "[10] += 1\n[11] = [10] * 3\n[11] ^= [10]\nif [11] != 0 goto 1\ngoto 1\n\n\n\n\n0\n0";

const TRADING: &str = "[10] = get_price( 4 )\n[11] = get_credits_balance()\ngoto 1\n\n\n\n\n\n\n0\n0";

fn create_bench_scenario(code: Instructions) -> Scenario {
    let mut scenario = Scenario::empty(1, 10, 10).unwrap();
    scenario.machines.push(Placement {
        template: drone_template("Bench", code).unwrap(),
        board_xy: HexCoord::new(5, 5),
        facing: HexFacing::Tile0,
    });
    scenario
}

fn bench_program(c: &mut Criterion, name: &str, source: &str) {
    let scenario = create_bench_scenario(compile_code(source).unwrap());
    let actions = scenario.initial_actions();

    c.bench_function(name, |b| {
        b.iter(|| {
            let mut board = scenario.build_board().unwrap();
            let mut events = FrameEvents::default();
            board.advance_one_frame(&actions, &mut events);
            for _ in 0..100 {
                board.advance_one_frame(&[], &mut events);
            }
            black_box(board.frame_number())
        });
    });
}

fn bench_arithmetic(c: &mut Criterion) {
    bench_program(c, "arithmetic_100_frames", ARITHMETIC);
}

fn bench_trade_queries(c: &mut Criterion) {
    bench_program(c, "trade_queries_100_frames", TRADING);
}

fn bench_assemble(c: &mut Criterion) {
    let source = std::fs::read_to_string(format!("{}/programs/miner.asm", env!("CARGO_MANIFEST_DIR"))).unwrap();

    c.bench_function("assemble_miner", |b| {
        b.iter(|| black_box(compile_code(black_box(&source))));
    });
}

criterion_group!(benches, bench_arithmetic, bench_trade_queries, bench_assemble);
criterion_main!(benches);
