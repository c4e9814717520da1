//! Events raised by machines and by the board while resolving them.
//!
//! Primary [`MachineEvent`]s are produced by machines during a frame and
//! resolved by the board. [`SecondaryEvent`]s are produced only by that
//! resolution and are for observers: they never feed back into the frame.

use serde::{Deserialize, Serialize};

use crate::blueprint::{HardpointShot, HardpointType};
use crate::combat::{Damages, Explosion};
use crate::fixed_angle::FixedAngle;
use crate::hex::{HexCoord, HexFacing};

use super::MachineId;

/// Runtime program faults. They are reported, never propagated: the faulting
/// instruction is skipped and the machine carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum MachineFault {
    /// Arithmetic the program asked for has no answer, e.g. division by zero.
    ProgramRaisedError = 1,
    /// An argument line did not hold a value.
    ExpectedValueNotFoundAtLine = 2,
    /// An argument line did not hold a location.
    ExpectedLocationNotFoundAtLine = 3,
    /// An `assert` failed.
    AssertionFailed = 4,
    /// The opcode is not one the machine knows.
    UnknownInstruction = 5,
}

impl MachineFault {
    /// The code a program reads back with `get_error_code`.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// Sub-tile motion snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionInfo {
    /// Tile the machine is on.
    pub xy: HexCoord,
    /// Facing angle.
    pub angle: FixedAngle,
    /// Offset from the tile centre along the facing.
    pub distance: i32,
    /// Speed along the facing.
    pub speed: i32,
    /// Turning speed, signed.
    pub turn_speed: FixedAngle,
}

/// A primary event raised by one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEvent {
    /// The machine that raised it.
    pub machine: MachineId,
    /// What happened.
    #[serde(flatten)]
    pub kind: MachineEventKind,
}

/// Payload of a [`MachineEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum MachineEventKind {
    /// The machine was placed on the board.
    AddedToBoard {
        /// Tile.
        xy: HexCoord,
        /// Facing.
        facing: HexFacing,
    },
    /// The machine moved or turned within its tile.
    PositionalUpdate {
        /// Where it is now.
        position: PositionInfo,
    },
    /// The machine crossed into a new tile.
    ChangedTile {
        /// Tile left.
        from: HexCoord,
        /// Tile entered.
        to: HexCoord,
    },
    /// The machine started sensing.
    Sensed {
        /// Sensed radius.
        radius: u16,
        /// Ticks sensing will take.
        duration: u16,
    },
    /// A hardpoint fired.
    Fired {
        /// Firer's tile.
        firer: HexCoord,
        /// Aimed-at tile.
        target: HexCoord,
        /// What was fired.
        shot: HardpointShot,
    },
    /// Code was offered to every machine in range.
    Broadcasted {
        /// Sender's tile.
        xy: HexCoord,
        /// Sent-code store id.
        code_id: u16,
        /// Radius.
        range: u16,
    },
    /// Code was sent to one tile.
    Transmitted {
        /// Sent-code store id.
        code_id: u16,
        /// Receiver's tile.
        to: HexCoord,
    },
    /// The self destruct countdown started.
    InitiatedSelfDestruct {
        /// Frames until detonation.
        countdown: u16,
    },
    /// The machine exploded.
    Exploded {
        /// The blast.
        explosion: Explosion,
    },
    /// `print( "TEXT" )` or a printed value.
    Text {
        /// Printed text.
        text: String,
    },
    /// A printed program line, as assembly text.
    PrintInstruction {
        /// Decompiled line.
        text: String,
    },
    /// A program fault.
    Error {
        /// Faulting line.
        line: u16,
        /// What went wrong.
        fault: MachineFault,
    },
    /// An assertion failed.
    Asserted {
        /// Asserting line.
        line: u16,
        /// Left operand.
        op1: u16,
        /// Right operand.
        op2: u16,
        /// Packed operator.
        op: u16,
    },
    /// A build started on a reserved tile.
    StartedBuild {
        /// Build site.
        site: HexCoord,
        /// Index into the builder's known blueprints.
        blueprint: u16,
    },
    /// A build finished; the board creates the child.
    CompletedBuild {
        /// Build site.
        site: HexCoord,
        /// Index into the builder's known blueprints.
        blueprint: u16,
        /// Sent-code store id of the child's boot code.
        code_id: u16,
    },
    /// Cargo should move between two neighbours.
    CargoTransferred {
        /// Giving machine's tile.
        from: HexCoord,
        /// Receiving machine's tile.
        to: HexCoord,
        /// Tradable type index.
        tradable: u16,
        /// Units.
        units: u16,
    },
    /// Damage the machine received.
    ReceivedDamage {
        /// Damage before resistances.
        damage: Damages,
    },
    /// Armour repairs the machine received.
    ReceivedRepairs {
        /// Armour points.
        repairs: i32,
    },
    /// Capacitance gained or lost from outside.
    CapAltered {
        /// Signed change.
        delta: i32,
    },
    /// Credits should move to a neighbour.
    TransferCash {
        /// Receiver's tile.
        to: HexCoord,
        /// Amount.
        amount: u16,
    },
}

impl MachineEventKind {
    /// Short stable name, used for logging and event counts.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddedToBoard { .. } => "added-to-board",
            Self::PositionalUpdate { .. } => "positional-update",
            Self::ChangedTile { .. } => "changed-tile",
            Self::Sensed { .. } => "sensed",
            Self::Fired { .. } => "fired",
            Self::Broadcasted { .. } => "broadcasted",
            Self::Transmitted { .. } => "transmitted",
            Self::InitiatedSelfDestruct { .. } => "initiated-self-destruct",
            Self::Exploded { .. } => "exploded",
            Self::Text { .. } => "text",
            Self::PrintInstruction { .. } => "print-instruction",
            Self::Error { .. } => "error",
            Self::Asserted { .. } => "asserted",
            Self::StartedBuild { .. } => "started-build",
            Self::CompletedBuild { .. } => "completed-build",
            Self::CargoTransferred { .. } => "cargo-transferred",
            Self::ReceivedDamage { .. } => "received-damage",
            Self::ReceivedRepairs { .. } => "received-repairs",
            Self::CapAltered { .. } => "cap-altered",
            Self::TransferCash { .. } => "transfer-cash",
        }
    }
}

/// What a resolved shot hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShotOutcome {
    /// A machine.
    HitMachine,
    /// An asteroid.
    HitAsteroid,
    /// Nothing in range.
    Missed,
}

/// Observer-only effects of resolving primary events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SecondaryEvent {
    /// A shot was resolved.
    ShotFired {
        /// Persisted hardpoint type name.
        hardpoint: String,
        /// What it hit.
        outcome: ShotOutcome,
        /// Firer's tile.
        firer: HexCoord,
        /// Aimed-at tile.
        target: HexCoord,
        /// Tile hit, invalid on a miss.
        hit: HexCoord,
    },
    /// An asteroid was mined out.
    AsteroidDepleted {
        /// Its tile.
        xy: HexCoord,
    },
    /// Credits moved between machines.
    CashTransferred {
        /// Payer's tile.
        from: HexCoord,
        /// Payee's tile.
        to: HexCoord,
        /// Amount.
        amount: u16,
    },
}

impl SecondaryEvent {
    /// A resolved shot of `kind`.
    #[must_use]
    pub fn shot(
        kind: HardpointType,
        outcome: ShotOutcome,
        firer: HexCoord,
        target: HexCoord,
        hit: HexCoord,
    ) -> Self {
        Self::ShotFired { hardpoint: kind.name().to_string(), outcome, firer, target, hit }
    }

    /// Short stable name, used for logging and event counts.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ShotFired { .. } => "shot-fired",
            Self::AsteroidDepleted { .. } => "asteroid-depleted",
            Self::CashTransferred { .. } => "cash-transferred",
        }
    }
}
