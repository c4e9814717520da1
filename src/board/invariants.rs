//! Board invariants: sanity checks that detect bugs.
//!
//! The grid flags and the entity lists must agree at the end of every frame.
//! A violation is a kernel bug, never a legal game state.

use std::collections::BTreeSet;

use super::BoardState;
use crate::hex::HexCoord;
use crate::hex::flags::{ASTEROID, BOT};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all board invariants.
///
/// Returns every violation found, or an empty list if the board is
/// consistent.
#[must_use]
pub fn check_invariants(state: &BoardState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let grid = state.grid();

    let mut seen = BTreeSet::new();
    for m in state.machines().filter(|m| m.is_alive()) {
        let xy = m.board_xy();
        if !seen.insert(xy) {
            violations.push(violation(format!("Two machines share tile {xy}")));
        }
        if grid.contents(xy) & BOT == 0 {
            violations.push(violation(format!("Machine {} at {xy} has no bot flag on its tile", m.id())));
        }
        if state.by_xy.get(&xy) != Some(&m.id()) {
            violations.push(violation(format!("Machine {} at {xy} is missing from the tile index", m.id())));
        }
    }

    for (&xy, &id) in &state.by_xy {
        match state.machine(id) {
            Some(m) if m.board_xy() == xy => {}
            _ => violations.push(violation(format!("Tile index maps {xy} to {id}, which is not there"))),
        }
    }

    let height = i8::try_from(grid.grid().height()).unwrap_or(i8::MAX);
    let width = i8::try_from(grid.grid().width()).unwrap_or(i8::MAX);
    for y in 0..height {
        for x in 0..width {
            let xy = HexCoord::new(x, y);
            let contents = grid.contents(xy);
            if contents & BOT != 0 && !state.machine_at(xy).is_some_and(|m| m.is_alive() && m.board_xy() == xy) {
                violations.push(violation(format!("Tile {xy} is flagged as holding a machine but none is there")));
            }
            let rock = state.asteroid_at(xy).filter(|a| a.is_on_board());
            if (contents & ASTEROID != 0) != rock.is_some() {
                violations.push(violation(format!("Tile {xy} asteroid flag disagrees with the asteroid list")));
            }
        }
    }

    violations
}
