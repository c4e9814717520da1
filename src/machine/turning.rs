//! Rotation between facings with acceleration and deceleration.

#![allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]

use crate::constants::{MAX_MACHINE_TURN_SPEED, MIN_MACHINE_TURN_SPEED};
use crate::fixed_angle::{FixedAngle, SIXTH_PI, TWO_PI, fixed_angle_from_facing};
use crate::hex::{HexFacing, TurnDirection};

const THIRD_PI: u32 = 2 * SIXTH_PI as u32;

/// Turns a machine a whole number of facings.
///
/// The turn speeds up until it reaches the machine's top turn speed or half
/// way, then slows symmetrically, snapping to the wanted facing at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TurningSystem {
    degrees_wanted: u32,
    turned_through: u32,
    decel_marker: u32,
    facing_wanted: HexFacing,
    angle: FixedAngle,
    speed: FixedAngle,
    accel: FixedAngle,
    max_speed: FixedAngle,
}

impl Default for TurningSystem {
    fn default() -> Self {
        Self {
            degrees_wanted: 0,
            turned_through: 0,
            decel_marker: 0,
            facing_wanted: HexFacing::Tile0,
            angle: fixed_angle_from_facing(HexFacing::Tile0),
            speed: 0,
            accel: 0,
            max_speed: 0,
        }
    }
}

impl TurningSystem {
    /// A turning system accelerating by `power`, no faster than `max_speed`.
    pub(crate) fn new(power: FixedAngle, max_speed: FixedAngle) -> Self {
        let max_speed = max_speed.clamp(MIN_MACHINE_TURN_SPEED, MAX_MACHINE_TURN_SPEED);
        Self {
            accel: power.clamp(MIN_MACHINE_TURN_SPEED, max_speed),
            max_speed,
            ..Self::default()
        }
    }

    /// Stop and face `facing`.
    pub(crate) fn reset(&mut self, facing: HexFacing) {
        self.degrees_wanted = 0;
        self.turned_through = 0;
        self.decel_marker = 0;
        self.facing_wanted = facing;
        self.angle = fixed_angle_from_facing(facing);
        self.speed = 0;
    }

    pub(crate) const fn is_turning(&self) -> bool {
        self.speed != 0
    }

    /// The facing being turned to, or the current facing when still.
    pub(crate) const fn facing(&self) -> HexFacing {
        self.facing_wanted
    }

    pub(crate) const fn angle(&self) -> FixedAngle {
        self.angle
    }

    pub(crate) const fn speed(&self) -> FixedAngle {
        self.speed
    }

    /// Begin turning `n` facings. Ignored when `n` is zero or the machine
    /// cannot turn.
    pub(crate) fn start_n_face_turns(&mut self, direction: TurnDirection, n: u16) {
        if n == 0 || self.accel == 0 {
            return;
        }
        let turns = i32::from(n % 6);
        self.degrees_wanted = u32::from(n) * THIRD_PI;
        self.decel_marker = self.degrees_wanted;
        self.turned_through = 0;
        self.facing_wanted = self.facing_wanted.turned(direction.sign() * turns);
        self.speed = direction.sign() * self.accel;
    }

    /// One tick of rotation.
    pub(crate) fn advance(&mut self) {
        if !self.is_turning() {
            return;
        }
        self.turned_through += self.speed.unsigned_abs();
        self.angle = (self.angle + self.speed + TWO_PI).rem_euclid(TWO_PI);

        if self.turned_through >= self.degrees_wanted {
            self.angle = fixed_angle_from_facing(self.facing_wanted);
            self.speed = 0;
        } else if self.turned_through >= self.decel_marker
            || (self.decel_marker == self.degrees_wanted
                && self.turned_through >= self.degrees_wanted / 2)
        {
            if self.decel_marker == self.degrees_wanted {
                self.decel_marker = self.degrees_wanted / 2;
            }
            let slower = (self.speed.abs() - self.accel).max(self.accel);
            self.speed = slower * self.speed.signum();
        } else if self.speed.abs() < self.max_speed {
            let faster = (self.speed.abs() + self.accel).min(self.max_speed);
            self.speed = faster * self.speed.signum();
            if faster == self.max_speed {
                self.decel_marker = self.degrees_wanted - self.turned_through;
            }
        }
    }
}
