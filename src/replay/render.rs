//! ASCII renderer for terminal viewing with ANSI colors.

use std::fmt::Write as _;

use crate::board::{BoardState, FrameEvents};
use crate::hex::HexCoord;
use crate::hex::flags::{is_asteroid_on_tile, is_bot_on_tile, is_off_board_tile, is_reserved_tile, is_sun_tile, sun_strength};
use crate::machine::{MachineEvent, MachineEventKind, SecondaryEvent};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";
const GRAY: &str = "\x1b[90m";

/// Render the board to ASCII with ANSI colors.
///
/// Odd columns sit half a row lower than even ones, so each grid row is
/// drawn as two text lines:
/// ```text
/// Frame 42                                machines: 3  asteroids: 2
/// ┌─────────────────────┐
/// │ .   M   .   A   .   │
/// │   .   .   1   .   . │
/// └─────────────────────┘
/// ```
#[must_use]
pub fn render_ascii(board: &BoardState) -> String {
    let mut output = String::new();
    render_header(&mut output, board);
    render_map(&mut output, board);
    output.push_str("\nLegend: M=Machine  A=Asteroid  S=Sun  1-7=Sunlight  +=Reserved  .=Empty\n\n");
    render_machines(&mut output, board);
    output
}

fn render_header(output: &mut String, board: &BoardState) {
    let title = format!("Frame {}", board.frame_number());
    let rocks = board.asteroids().iter().filter(|a| a.is_on_board()).count();
    let _ = writeln!(output, "{title:<40}machines: {}  asteroids: {rocks}", board.machine_count());
}

fn render_map(output: &mut String, board: &BoardState) {
    let grid = board.grid().grid();
    let width = i8::try_from(grid.width()).unwrap_or(i8::MAX);
    let height = i8::try_from(grid.height()).unwrap_or(i8::MAX);
    let inner = usize::try_from(width).unwrap_or(0) * 2 + 1;

    output.push('┌');
    output.push_str(&"─".repeat(inner));
    output.push_str("┐\n");
    for y in 0..height {
        for parity in [0, 1] {
            output.push_str("│ ");
            for x in 0..width {
                if x % 2 == parity {
                    render_tile(output, board, HexCoord::new(x, y));
                } else {
                    output.push(' ');
                }
                output.push(' ');
            }
            output.push_str("│\n");
        }
    }
    output.push('└');
    output.push_str(&"─".repeat(inner));
    output.push_str("┘\n");
}

fn render_tile(output: &mut String, board: &BoardState, xy: HexCoord) {
    let f = board.grid().contents(xy);
    if is_sun_tile(f) {
        let _ = write!(output, "{YELLOW}{BOLD}S{RESET}");
    } else if is_off_board_tile(f) {
        output.push(' ');
    } else if is_bot_on_tile(f) {
        let _ = write!(output, "{CYAN}{BOLD}M{RESET}");
    } else if is_asteroid_on_tile(f) {
        let _ = write!(output, "{WHITE}A{RESET}");
    } else if is_reserved_tile(f) {
        let _ = write!(output, "{GRAY}+{RESET}");
    } else if sun_strength(f) > 0 {
        let _ = write!(output, "{YELLOW}{}{RESET}", sun_strength(f));
    } else {
        let _ = write!(output, "{GRAY}.{RESET}");
    }
}

fn render_machines(output: &mut String, board: &BoardState) {
    for m in board.machines() {
        let c = m.combat_system();
        let _ = writeln!(
            output,
            "{CYAN}{} {}{RESET} at {}  hull: {:<4} armour: {:<4} cap: {:<5} credits: {}",
            m.id(),
            m.name(),
            m.board_xy(),
            c.hull(),
            c.armour(),
            m.capacitance(),
            m.credits()
        );
    }
}

/// One line per event, for logs and the text replay.
#[must_use]
pub fn render_events(events: &FrameEvents) -> String {
    let mut output = String::new();
    for e in &events.machine_events {
        let _ = writeln!(output, "  {}", describe_machine_event(e));
    }
    for e in &events.secondary_events {
        let _ = writeln!(output, "  {}", describe_secondary_event(e));
    }
    output
}

fn describe_machine_event(e: &MachineEvent) -> String {
    let detail = match &e.kind {
        MachineEventKind::AddedToBoard { xy, .. } => format!("at {xy}"),
        MachineEventKind::ChangedTile { from, to } => format!("{from} -> {to}"),
        MachineEventKind::Fired { target, .. } => format!("at {target}"),
        MachineEventKind::Text { text } | MachineEventKind::PrintInstruction { text } => format!("\"{text}\""),
        MachineEventKind::Error { line, fault } => format!("line {line}: {fault:?}"),
        MachineEventKind::Asserted { line, .. } => format!("line {line}"),
        MachineEventKind::Exploded { explosion } => format!("damage {} range {}", explosion.damage, explosion.range),
        MachineEventKind::CapAltered { delta } => format!("{delta:+}"),
        _ => String::new(),
    };
    format!("{} {} {detail}", e.machine, e.kind.name()).trim_end().to_string()
}

fn describe_secondary_event(e: &SecondaryEvent) -> String {
    match e {
        SecondaryEvent::ShotFired { hardpoint, outcome, hit, .. } => format!("{hardpoint} shot {outcome:?} {hit}"),
        SecondaryEvent::AsteroidDepleted { xy } => format!("asteroid at {xy} depleted"),
        SecondaryEvent::CashTransferred { from, to, amount } => format!("{amount} credits {from} -> {to}"),
    }
}
