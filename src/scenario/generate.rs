//! Seeded scenario generation.
//!
//! Produces a playable board from a seed: a sun near the middle, a scatter of
//! asteroids and one stock drone per program.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{DEFAULT_FRAMES, Placement, Scenario};
use crate::blueprint::{
    AttachPoint, Blueprint, Chassis, Component, ComponentCategory, ComponentOrientation, EmissiveChannels, Hardpoint,
    HardpointShooter, HardpointShot, HardwareModifier, HardwareStat, OrientedHardpoint, ShooterParams, ShotEffect,
    Softpoint, Thruster, ThrusterAttachPoint,
};
use crate::board::{Asteroid, Sun};
use crate::error::{BlueError, BlueResult};
use crate::fixed_angle::SIXTH_PI;
use crate::hex::flags::OFF_BOARD;
use crate::hex::{HexCoord, HexFacing, HexGrid};
use crate::instructions::Instructions;
use crate::machine::{MachineName, MachineTemplate};
use crate::rng::BoardRng;
use crate::tradables::{Amount, TradableType};

/// Share of tiles given an asteroid.
const ASTEROID_DENSITY: f32 = 0.04;

/// Placement attempts per entity before giving up.
const MAX_PLACEMENT_ATTEMPTS: u32 = 1000;

fn part(name: &str, hull: i32, mass: i32, category: ComponentCategory, cost: Amount) -> BlueResult<Component> {
    Component::new(name, hull, mass, category, cost, 1.0)
}

/// The stock drone: a processor, cargo bays, two thrusters and a mining
/// laser.
///
/// # Errors
///
/// Never in practice; the parts are fixed.
pub fn drone_blueprint() -> BlueResult<Blueprint> {
    let cpu = HardwareModifier::default()
        .with_delta(HardwareStat::ProcessorSpeedCyclesPerTick, 1000)
        .with_delta(HardwareStat::CapRefillPerTick, 100)
        .with_delta(HardwareStat::CapInstructionCost, 1)
        .with_delta(HardwareStat::MaxSensingRadius, 4)
        .with_delta(HardwareStat::TilesSensedPer10Ticks, 100)
        .with_delta(HardwareStat::CapSensingCostPerTile, 1)
        .with_delta(HardwareStat::CapBroadcastCostPerTile, 2)
        .with_delta(HardwareStat::CapTransmitCostPerTile, 2)
        .with_delta(HardwareStat::MaxBroadcastRange, 5)
        .with_delta(HardwareStat::MaxTransmitRange, 5)
        .with_delta(HardwareStat::MaxStoredMessages, 3)
        .with_delta(HardwareStat::CargoholdVolume, 200)
        .with_delta(HardwareStat::CapRefineCost, 2)
        .with_delta(HardwareStat::ArmourHitpoints, 60);

    let mut softpoints = BTreeMap::new();
    softpoints.insert(
        AttachPoint::new(1)?,
        Softpoint::new(part("CPU", 100, 50, ComponentCategory::Industrial, Amount::of(TradableType::Metals, 5))?, cpu),
    );
    for n in [20, 40, 60] {
        let bay = part("BAY", 100, 50, ComponentCategory::Industrial, Amount::of(TradableType::Metals, 5))?;
        softpoints.insert(AttachPoint::new(n)?, Softpoint::new(bay, HardwareModifier::default()));
    }

    let mut thrusters = BTreeMap::new();
    for n in [81, 83] {
        let engine = part("ION", 200, 200, ComponentCategory::Propulsion, Amount::of(TradableType::Kamacite, 5))?;
        thrusters.insert(ThrusterAttachPoint::new(n)?, Thruster::new(engine, 120));
    }

    let laser = HardpointShooter::new(
        HardpointShot { hardpoint_index: 0, max_range: 6, effect: ShotEffect::Mining(40) },
        ShooterParams {
            rotation_speed: SIXTH_PI,
            firing_cap_cost: 10,
            firing_cooldown: 3,
            min_angle_degrees: 0,
            max_angle_degrees: 359,
            min_range: 1,
            max_range_percent_effect: 50,
            reliability: 90,
        },
    )?;
    let mount = part("LASER", 80, 40, ComponentCategory::Industrial, Amount::of(TradableType::Metals, 10))?;
    let mut hardpoints = BTreeMap::new();
    hardpoints.insert(
        AttachPoint::new(3)?,
        OrientedHardpoint::new(ComponentOrientation::Rotated270, Hardpoint::new(mount, laser)),
    );

    Blueprint::new(Chassis::new("DRONE", EmissiveChannels::default()), thrusters, softpoints, hardpoints)
}

/// A stock drone called `name` booting `code`.
///
/// # Errors
///
/// As [`drone_blueprint`].
pub fn drone_template(name: &str, code: Instructions) -> BlueResult<MachineTemplate> {
    Ok(MachineTemplate::new(MachineName::new(name), Arc::new(drone_blueprint()?), code))
}

fn random_tile(rng: &mut BoardRng, width: u32, height: u32) -> HexCoord {
    let x = rng.urand() % width;
    let y = rng.urand() % height;
    HexCoord::new(i8::try_from(x).unwrap_or(0), i8::try_from(y).unwrap_or(0))
}

fn free_tile(rng: &mut BoardRng, width: u32, height: u32, taken: &mut BTreeSet<HexCoord>) -> BlueResult<HexCoord> {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let xy = random_tile(rng, width, height);
        if taken.insert(xy) {
            return Ok(xy);
        }
    }
    Err(BlueError::Scenario("No free tile left for placement.".into()))
}

/// Generate a `width` by `height` scenario from `seed` with one drone per
/// program.
///
/// Boards of at least 8 by 8 get a sun in the middle.
///
/// # Errors
///
/// Bad dimensions, or a board too crowded to place everything.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn generate_scenario(seed: u64, width: u32, height: u32, programs: &[Instructions]) -> BlueResult<Scenario> {
    let grid = HexGrid::new(width, height, 0, OFF_BOARD)?;
    let mut rng = BoardRng::new(seed);
    let mut taken = BTreeSet::new();

    let mut suns = Vec::new();
    if width >= 8 && height >= 8 {
        let centre = HexCoord::new((width / 2) as i8, (height / 2) as i8);
        taken.insert(centre);
        suns.push(Sun::new(centre, 3)?);
    }

    let rocks = ((width * height) as f32 * ASTEROID_DENSITY) as usize;
    let mut asteroids = Vec::with_capacity(rocks);
    for _ in 0..rocks {
        let xy = free_tile(&mut rng, width, height, &mut taken)?;
        let ore = TradableType::ORES[rng.urand() as usize % TradableType::ORES.len()];
        let volume = 50 + (rng.urand() % 200) as u16;
        asteroids.push(Asteroid::new(ore, volume, xy)?);
    }

    let mut machines = Vec::with_capacity(programs.len());
    for (i, code) in programs.iter().enumerate() {
        let board_xy = free_tile(&mut rng, width, height, &mut taken)?;
        let facing = HexFacing::ALL[rng.urand() as usize % HexFacing::ALL.len()];
        let template = drone_template(&format!("Drone-{}", i + 1), code.clone())?;
        machines.push(Placement { template, board_xy, facing });
    }

    Ok(Scenario { seed, grid, asteroids, suns, machines, frames: DEFAULT_FRAMES })
}
