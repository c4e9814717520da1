//! Multi-frame integration tests for the board.
//!
//! These tests run whole scenarios with the stock drone and the programs in
//! `programs/`, checking that the board stays consistent and that programs
//! have the effects they ask for.
//!
//! Run with: cargo test --release board_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

#[path = "support/common.rs"]
mod common;

use blue::board::{FrameEvents, GameAction, check_invariants};
use blue::hex::{HexCoord, HexFacing};
use blue::machine::{MachineEventKind, SecondaryEvent};
use blue::scenario::drone_template;
use blue::tradables::TradableType;
use common::{create_mining_scenario, create_test_scenario, load_program, run};

#[test]
fn test_300_frame_game_stays_consistent() {
    let scenario = create_test_scenario(42, 300);
    let mut frames = 0;
    let board = run(&scenario, |board, _| {
        let violations = check_invariants(board);
        assert!(violations.is_empty(), "frame {}: {violations:?}", board.frame_number());
        frames += 1;
    });
    assert_eq!(frames, 300);
    assert_eq!(board.frame_number(), 300);
}

#[test]
fn test_every_placement_is_announced_on_frame_0() {
    let scenario = create_test_scenario(7, 1);
    let mut added = Vec::new();
    run(&scenario, |_, events| {
        for e in &events.machine_events {
            if let MachineEventKind::AddedToBoard { xy, .. } = e.kind {
                added.push(xy);
            }
        }
    });
    let expected: Vec<HexCoord> = scenario.machines.iter().map(|p| p.board_xy).collect();
    assert_eq!(added, expected);
}

#[test]
fn test_miner_fills_its_hold() {
    let scenario = create_mining_scenario();
    let mut fired = 0;
    let mut hits = 0;
    let board = run(&scenario, |_, events| {
        fired += events.machine_events.iter().filter(|e| matches!(e.kind, MachineEventKind::Fired { .. })).count();
        hits += events
            .secondary_events
            .iter()
            .filter(|e| matches!(e, SecondaryEvent::ShotFired { hardpoint, .. } if hardpoint == "miner"))
            .count();
    });

    assert!(fired > 0);
    assert!(hits > 0 && hits <= fired);
    let miner = board.machines().next().unwrap();
    assert!(miner.cargo().count_of(TradableType::Kamacite) > 0);
    let rock = board.asteroids().first().map_or(0, |a| a.volume());
    assert!(rock < 200);
}

#[test]
fn test_sentry_reports_what_it_sees() {
    let mut scenario = create_mining_scenario();
    scenario.machines[0].template = drone_template("Sentry", load_program("sentry")).unwrap();
    scenario.frames = 30;

    let mut printed = Vec::new();
    run(&scenario, |_, events| {
        for e in &events.machine_events {
            if let MachineEventKind::PrintInstruction { text } = &e.kind {
                printed.push(text.clone());
            }
        }
    });

    // Its own tile and the asteroid.
    assert!(!printed.is_empty());
    assert_eq!(printed[0], "2");
}

#[test]
fn test_actions_apply_at_the_start_of_their_frame() {
    let scenario = create_mining_scenario();
    let mut board = scenario.build_board().unwrap();
    let mut events = FrameEvents::default();

    board.advance_one_frame(&scenario.initial_actions(), &mut events);
    assert_eq!(board.machine_count(), 1);

    let newcomer = GameAction::AddMachine {
        template: drone_template("Late", load_program("sentry")).unwrap(),
        xy: HexCoord::new(2, 9),
        facing: HexFacing::Tile4,
    };
    board.advance_one_frame(&[newcomer], &mut events);
    assert_eq!(board.machine_count(), 2);
    assert!(events.machine_events.iter().any(|e| e.kind.name() == "added-to-board"));
    assert_eq!(board.machine_at(HexCoord::new(2, 9)).unwrap().name().as_str(), "Late");
}

#[test]
fn test_sent_instructions_are_queued_as_messages() {
    let mut scenario = create_mining_scenario();
    scenario.machines[0].template = drone_template("Listener", "synch( 10 )\ngoto 1".parse().unwrap()).unwrap();
    let mut board = scenario.build_board().unwrap();
    let mut events = FrameEvents::default();
    board.advance_one_frame(&scenario.initial_actions(), &mut events);

    let xy = HexCoord::new(6, 6);
    let send = GameAction::SendInstructions { xy, code: "print( \"HI\" )".parse().unwrap() };
    board.advance_one_frame(&[send.clone(), send], &mut events);
    assert_eq!(board.machine_at(xy).unwrap().message_count(), 2);

    // Nobody is on the empty tile.
    let lost = GameAction::SendInstructions { xy: HexCoord::new(1, 1), code: load_program("sentry") };
    board.advance_one_frame(&[lost], &mut events);
    assert!(check_invariants(&board).is_empty());
}
