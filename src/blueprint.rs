//! Machine designs.
//!
//! A [`Blueprint`] is a validated layout of components on a chassis:
//!
//! ```text
//!   Chassis
//!     ├── thrusters   ThrusterAttachPoint -> Thruster
//!     ├── softpoints  AttachPoint -> Softpoint          (>= 1)
//!     └── hardpoints  AttachPoint -> OrientedHardpoint
//! ```
//!
//! Components may not overlap and must form one connected shape. The
//! blueprint derives its [`Hardware`], build cost and complexity once at
//! construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CYCLES_PER_INSTRUCTION, DEFAULT_MAX_CAPACITOR, DEFAULT_MOBILITY,
    MAX_MACHINE_COMPONENTS, MAX_MACHINE_MOVE_SPEED, MAX_MACHINE_TURN_SPEED,
};
use crate::error::{BlueError, BlueResult};
use crate::fixed_angle::FixedAngle;
use crate::tradables::Amount;

mod attach_point;
mod classification;
mod component;
mod hardware;
mod modifier;
mod parts;
mod shooter;

pub use attach_point::{AttachPoint, ThrusterAttachPoint, is_location_number};
pub use classification::Classification;
pub use component::{Component, ComponentCategory, ComponentOrientation};
pub use hardware::Hardware;
pub use modifier::{HARDWARE_STAT_COUNT, HardwareFactor, HardwareModifier, HardwareStat};
pub use parts::{Bgra, Chassis, EmissiveChannels, Hardpoint, OrientedHardpoint, Softpoint, Thruster};
pub use shooter::{
    HardpointShooter, HardpointShot, HardpointType, MAX_HARDPOINT_INDEX, ShooterParams,
    ShotEffect, in_angle_range, relative_angle_to_target,
};

const GRID_DIMENSION: usize = 10;
const GRID_SIZE: usize = GRID_DIMENSION * GRID_DIMENSION;

/// A validated machine design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlueprintRecord", into = "BlueprintRecord")]
pub struct Blueprint {
    chassis: Chassis,
    hardpoints: Vec<(OrientedHardpoint, AttachPoint)>,
    softpoints: Vec<(Softpoint, AttachPoint)>,
    thrusters: Vec<(Thruster, ThrusterAttachPoint)>,
    build_cost: Amount,
    build_complexity: f32,
    hardware: Hardware,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlueprintRecord {
    chassis: Chassis,
    thrusters: Vec<(ThrusterAttachPoint, Thruster)>,
    softpoints: Vec<(AttachPoint, Softpoint)>,
    orientedhardpoints: Vec<(AttachPoint, OrientedHardpoint)>,
}

impl TryFrom<BlueprintRecord> for Blueprint {
    type Error = BlueError;

    fn try_from(r: BlueprintRecord) -> BlueResult<Self> {
        Self::new(
            r.chassis,
            r.thrusters.into_iter().collect(),
            r.softpoints.into_iter().collect(),
            r.orientedhardpoints.into_iter().collect(),
        )
    }
}

impl From<Blueprint> for BlueprintRecord {
    fn from(b: Blueprint) -> Self {
        Self {
            chassis: b.chassis,
            thrusters: b.thrusters.into_iter().map(|(t, a)| (a, t)).collect(),
            softpoints: b.softpoints.into_iter().map(|(s, a)| (a, s)).collect(),
            orientedhardpoints: b.hardpoints.into_iter().map(|(h, a)| (a, h)).collect(),
        }
    }
}

fn occupy(squares: &mut [bool; GRID_SIZE], location: u16) -> bool {
    let n = usize::from(location);
    let cells = [n, n + 1, n + GRID_DIMENSION, n + GRID_DIMENSION + 1];
    if cells.iter().any(|&c| c >= GRID_SIZE || squares[c]) {
        return false;
    }
    for c in cells {
        squares[c] = true;
    }
    true
}

impl Blueprint {
    /// Checks whether the parts form a legal layout: at least one softpoint,
    /// at most [`MAX_MACHINE_COMPONENTS`] parts, no overlaps and no
    /// disconnected islands.
    ///
    /// # Errors
    ///
    /// Describes the first rule the layout breaks.
    pub fn can_form_valid_blueprint(
        thrusters: &BTreeMap<ThrusterAttachPoint, Thruster>,
        softpoints: &BTreeMap<AttachPoint, Softpoint>,
        hardpoints: &BTreeMap<AttachPoint, OrientedHardpoint>,
    ) -> BlueResult<()> {
        let Some(first_softpoint) = softpoints.keys().next() else {
            return Err(BlueError::Blueprint("Softpoints were empty.".into()));
        };
        let count = thrusters.len() + softpoints.len() + hardpoints.len();
        if count > MAX_MACHINE_COMPONENTS {
            return Err(BlueError::Blueprint("Too many components.".into()));
        }

        let mut squares = [false; GRID_SIZE];
        for t in thrusters.keys() {
            if !occupy(&mut squares, t.location_number()) {
                return Err(BlueError::Blueprint(format!(
                    "Thruster at {} conflicts with another component.",
                    t.location_number()
                )));
            }
        }
        for h in hardpoints.keys() {
            if !occupy(&mut squares, h.location_number()) {
                return Err(BlueError::Blueprint(format!(
                    "Hardpoint at {h} conflicts with another component."
                )));
            }
        }
        for s in softpoints.keys() {
            if !occupy(&mut squares, s.location_number()) {
                return Err(BlueError::Blueprint(format!(
                    "Softpoint at {s} conflicts with another component."
                )));
            }
        }

        // Flood fill from the first softpoint; every occupied square must be reached.
        let start = usize::from(first_softpoint.location_number());
        let mut visited = [false; GRID_SIZE];
        visited[start] = true;
        let mut frontier = vec![start];
        let mut reached = 1;
        while let Some(square) = frontier.pop() {
            let (row, col) = (square / GRID_DIMENSION, square % GRID_DIMENSION);
            let mut neighbours = Vec::with_capacity(4);
            if row > 0 {
                neighbours.push(square - GRID_DIMENSION);
            }
            if row + 1 < GRID_DIMENSION {
                neighbours.push(square + GRID_DIMENSION);
            }
            if col > 0 {
                neighbours.push(square - 1);
            }
            if col + 1 < GRID_DIMENSION {
                neighbours.push(square + 1);
            }
            for n in neighbours {
                if squares[n] && !visited[n] {
                    visited[n] = true;
                    reached += 1;
                    frontier.push(n);
                }
            }
        }
        if reached != 4 * count {
            return Err(BlueError::Blueprint("Layout would contain islands.".into()));
        }
        Ok(())
    }

    /// Builds a blueprint if the parts form a legal layout.
    ///
    /// Each hardpoint's shots are tagged with its index in attach point
    /// order.
    ///
    /// # Errors
    ///
    /// Layout errors from [`Blueprint::can_form_valid_blueprint`], or
    /// hardware that cannot be derived from the parts' totals.
    pub fn new(
        chassis: Chassis,
        thrusters: BTreeMap<ThrusterAttachPoint, Thruster>,
        softpoints: BTreeMap<AttachPoint, Softpoint>,
        hardpoints: BTreeMap<AttachPoint, OrientedHardpoint>,
    ) -> BlueResult<Self> {
        Self::can_form_valid_blueprint(&thrusters, &softpoints, &hardpoints)?;

        let mut build_cost = Amount::default();
        let mut build_complexity = 0.0;
        let mut add = |c: &Component| {
            build_cost += *c.build_cost();
            build_complexity += c.build_complexity();
        };

        let softpoints: Vec<_> = softpoints.into_iter().map(|(a, s)| (s, a)).collect();
        let mut hardpoints: Vec<_> = hardpoints.into_iter().map(|(a, h)| (h, a)).collect();
        let thrusters: Vec<_> = thrusters.into_iter().map(|(a, t)| (t, a)).collect();

        for (s, _) in &softpoints {
            add(s.details());
        }
        for (i, (h, _)) in hardpoints.iter_mut().enumerate() {
            add(h.oriented_hardpoint().details());
            h.hardpoint_mut()
                .shooter_mut()
                .set_index(u8::try_from(i).unwrap_or(MAX_HARDPOINT_INDEX));
        }
        for (t, _) in &thrusters {
            add(t.details());
        }

        let mut bp = Self {
            chassis,
            hardpoints,
            softpoints,
            thrusters,
            build_cost,
            build_complexity,
            hardware: Hardware::default(),
        };
        bp.hardware = bp.calculate_hardware()?;
        Ok(bp)
    }

    fn calculate_hardware(&self) -> BlueResult<Hardware> {
        let components = self
            .softpoints
            .iter()
            .map(|(s, _)| s.details())
            .chain(self.hardpoints.iter().map(|(h, _)| h.oriented_hardpoint().details()))
            .chain(self.thrusters.iter().map(|(t, _)| t.details()));

        let (mut hull, mut mass) = (0_i64, 0_i64);
        for c in components {
            hull += i64::from(c.hull_hitpoints());
            mass += i64::from(c.mass());
        }
        let power: i64 = self.thrusters.iter().map(|(t, _)| i64::from(t.power())).sum();

        let to_i32 = |v: i64, what: &str| {
            i32::try_from(v)
                .map_err(|_| BlueError::Blueprint(format!("Blueprint total {what} out of range.")))
        };

        let base = Hardware::new(
            DEFAULT_CYCLES_PER_INSTRUCTION,
            DEFAULT_MOBILITY,
            MAX_MACHINE_MOVE_SPEED,
            MAX_MACHINE_TURN_SPEED,
            DEFAULT_MAX_CAPACITOR,
            to_i32(power, "thruster power")?,
            to_i32(mass, "mass")?,
            to_i32(hull, "hull hitpoints")?,
        )?;

        let mut modifiers = HardwareModifier::default();
        for (s, _) in &self.softpoints {
            modifiers += s.modifier();
        }
        let mut hw = base.modified_by(&modifiers)?;
        if self.thrusters.is_empty() {
            hw.remove_thruster_traits();
        }
        Ok(hw)
    }

    /// Material needed to build one machine.
    #[must_use]
    pub const fn build_cost(&self) -> &Amount {
        &self.build_cost
    }

    /// Sum of the components' complexities.
    #[must_use]
    pub const fn build_complexity(&self) -> f32 {
        self.build_complexity
    }

    /// Derived capabilities.
    #[must_use]
    pub const fn hardware_of_blueprint(&self) -> &Hardware {
        &self.hardware
    }

    /// The chassis.
    #[must_use]
    pub const fn blueprint_chassis(&self) -> &Chassis {
        &self.chassis
    }

    /// Number of hardpoints.
    #[must_use]
    pub fn hardpoint_count(&self) -> usize {
        self.hardpoints.len()
    }

    /// Number of softpoints.
    #[must_use]
    pub fn softpoint_count(&self) -> usize {
        self.softpoints.len()
    }

    /// Number of thrusters.
    #[must_use]
    pub fn thrusters_count(&self) -> usize {
        self.thrusters.len()
    }

    /// Every attached part.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.hardpoints.len() + self.softpoints.len() + self.thrusters.len()
    }

    /// Hardpoints in index order.
    pub fn hardpoints(&self) -> impl Iterator<Item = &OrientedHardpoint> {
        self.hardpoints.iter().map(|(h, _)| h)
    }

    /// Softpoints in attach point order.
    pub fn softpoints(&self) -> impl Iterator<Item = &Softpoint> {
        self.softpoints.iter().map(|(s, _)| s)
    }

    /// Thrusters in attach point order.
    pub fn thrusters(&self) -> impl Iterator<Item = &Thruster> {
        self.thrusters.iter().map(|(t, _)| t)
    }

    /// The `n`th hardpoint.
    #[must_use]
    pub fn hardpoint_at(&self, n: usize) -> Option<&Hardpoint> {
        self.hardpoints.get(n).map(|(h, _)| h.oriented_hardpoint())
    }

    /// The `n`th softpoint.
    #[must_use]
    pub fn softpoint_at(&self, n: usize) -> Option<&Softpoint> {
        self.softpoints.get(n).map(|(s, _)| s)
    }

    /// The `n`th thruster.
    #[must_use]
    pub fn thruster_at(&self, n: usize) -> Option<&Thruster> {
        self.thrusters.get(n).map(|(t, _)| t)
    }

    /// Mounting angle of the `n`th hardpoint.
    #[must_use]
    pub fn hardpoint_angle(&self, n: usize) -> Option<FixedAngle> {
        self.hardpoints
            .get(n)
            .map(|(h, _)| h.hardpoint_orientation().angle())
    }

    /// Where the `n`th hardpoint is attached.
    #[must_use]
    pub fn hardpoint_attachpoint(&self, n: usize) -> Option<AttachPoint> {
        self.hardpoints.get(n).map(|(_, a)| *a)
    }

    /// Where the `n`th softpoint is attached.
    #[must_use]
    pub fn softpoint_attachpoint(&self, n: usize) -> Option<AttachPoint> {
        self.softpoints.get(n).map(|(_, a)| *a)
    }

    /// Where the `n`th thruster is attached.
    #[must_use]
    pub fn thruster_attachpoint(&self, n: usize) -> Option<ThrusterAttachPoint> {
        self.thrusters.get(n).map(|(_, a)| *a)
    }
}
