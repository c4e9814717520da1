//! Hardpoint firing parameters and the shots they produce.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use serde::{Deserialize, Serialize};

use crate::combat::Damages;
use crate::error::{BlueError, BlueResult};
use crate::fixed_angle::{FixedAngle, TWO_PI, degrees_to_fixed_angle, radians_to_fixed_angle};
use crate::hex::{HexCoord, calculate_xy};
use crate::rng::BoardRng;

/// Largest permitted hardpoint index.
pub const MAX_HARDPOINT_INDEX: u8 = 87;

/// The five kinds of hardpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardpointType {
    /// Deals damage.
    Weapon,
    /// Removes capacitor charge from the target.
    CapDrain,
    /// Gives capacitor charge to the target.
    CapXfer,
    /// Repairs the target's armour.
    ArmourRepairer,
    /// Extracts ore from an asteroid.
    Miner,
}

impl HardpointType {
    /// Persisted name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Weapon => "gun",
            Self::CapDrain => "drain",
            Self::CapXfer => "cap",
            Self::ArmourRepairer => "rep",
            Self::Miner => "miner",
        }
    }

    /// Parse a persisted name.
    ///
    /// # Errors
    ///
    /// Fails for unknown names.
    pub fn from_name(name: &str) -> BlueResult<Self> {
        [
            Self::Weapon,
            Self::CapDrain,
            Self::CapXfer,
            Self::ArmourRepairer,
            Self::Miner,
        ]
        .into_iter()
        .find(|t| t.name() == name)
        .ok_or_else(|| BlueError::Component(format!("Unknown hardpoint type name '{name}'.")))
    }
}

/// What a shot does when it lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotEffect {
    /// Damage before falloff and resistances.
    Weapon(Damages),
    /// Capacitor drained.
    CapDrain(u16),
    /// Capacitor transferred.
    CapXfer(u16),
    /// Armour repaired.
    ArmourRepair(u16),
    /// Ore volume mined.
    Mining(u16),
}

impl ShotEffect {
    /// The hardpoint kind producing this effect.
    #[must_use]
    pub const fn hardpoint_type(&self) -> HardpointType {
        match self {
            Self::Weapon(_) => HardpointType::Weapon,
            Self::CapDrain(_) => HardpointType::CapDrain,
            Self::CapXfer(_) => HardpointType::CapXfer,
            Self::ArmourRepair(_) => HardpointType::ArmourRepairer,
            Self::Mining(_) => HardpointType::Miner,
        }
    }

    /// Scales the effect. Integral effects are truncated.
    #[must_use]
    pub fn scaled(self, e: f32) -> Self {
        let scale = |v: u16| (f32::from(v) * e).clamp(0.0, f32::from(u16::MAX)) as u16;
        match self {
            Self::Weapon(d) => Self::Weapon(d * e),
            Self::CapDrain(v) => Self::CapDrain(scale(v)),
            Self::CapXfer(v) => Self::CapXfer(scale(v)),
            Self::ArmourRepair(v) => Self::ArmourRepair(scale(v)),
            Self::Mining(v) => Self::Mining(scale(v)),
        }
    }
}

/// A shot produced by one hardpoint. Its effect is the maximum it can
/// achieve; range falloff is applied when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ShotRecord", into = "ShotRecord")]
pub struct HardpointShot {
    /// Index of the firing hardpoint within its machine.
    pub hardpoint_index: u8,
    /// How far the shot can travel.
    pub max_range: u16,
    /// What it does.
    pub effect: ShotEffect,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ShotRecord {
    hardpoint_type: String,
    hardpoint_index: u8,
    max_range: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kinetic_damage: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thermal_damage: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    em_damage: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    radiation_damage: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cap_drained: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cap_transferred: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    armor_repped: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume_mined: Option<u16>,
}

impl TryFrom<ShotRecord> for HardpointShot {
    type Error = BlueError;

    fn try_from(r: ShotRecord) -> BlueResult<Self> {
        let missing = |key: &str| BlueError::Component(format!("Hardpoint shot is missing '{key}'."));
        let effect = match HardpointType::from_name(&r.hardpoint_type)? {
            HardpointType::Weapon => ShotEffect::Weapon(Damages::new(
                r.kinetic_damage.ok_or_else(|| missing("kinetic-damage"))?,
                r.thermal_damage.ok_or_else(|| missing("thermal-damage"))?,
                r.em_damage.ok_or_else(|| missing("em-damage"))?,
                r.radiation_damage.ok_or_else(|| missing("radiation-damage"))?,
            )),
            HardpointType::CapDrain => {
                ShotEffect::CapDrain(r.cap_drained.ok_or_else(|| missing("cap-drained"))?)
            }
            HardpointType::CapXfer => {
                ShotEffect::CapXfer(r.cap_transferred.ok_or_else(|| missing("cap-transferred"))?)
            }
            HardpointType::ArmourRepairer => {
                ShotEffect::ArmourRepair(r.armor_repped.ok_or_else(|| missing("armor-repped"))?)
            }
            HardpointType::Miner => {
                ShotEffect::Mining(r.volume_mined.ok_or_else(|| missing("volume-mined"))?)
            }
        };
        Ok(Self {
            hardpoint_index: r.hardpoint_index,
            max_range: r.max_range,
            effect,
        })
    }
}

impl From<HardpointShot> for ShotRecord {
    fn from(s: HardpointShot) -> Self {
        let mut r = Self {
            hardpoint_type: s.effect.hardpoint_type().name().to_string(),
            hardpoint_index: s.hardpoint_index,
            max_range: s.max_range,
            ..Self::default()
        };
        match s.effect {
            ShotEffect::Weapon(d) => {
                r.kinetic_damage = Some(d.kinetic_dmg());
                r.thermal_damage = Some(d.thermal_dmg());
                r.em_damage = Some(d.em_dmg());
                r.radiation_damage = Some(d.radiation_dmg());
            }
            ShotEffect::CapDrain(v) => r.cap_drained = Some(v),
            ShotEffect::CapXfer(v) => r.cap_transferred = Some(v),
            ShotEffect::ArmourRepair(v) => r.armor_repped = Some(v),
            ShotEffect::Mining(v) => r.volume_mined = Some(v),
        }
        r
    }
}

impl HardpointShot {
    /// The hardpoint kind that fired this shot.
    #[must_use]
    pub const fn hardpoint_type(&self) -> HardpointType {
        self.effect.hardpoint_type()
    }
}

/// Firing behaviour of a hardpoint: turn rate, costs, arc, ranges and
/// reliability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ShooterRecord", into = "ShooterRecord")]
#[allow(missing_copy_implementations)]
pub struct HardpointShooter {
    shot: HardpointShot,
    rotation_speed: FixedAngle,
    firing_cap_cost: u16,
    firing_cooldown: u16,
    min_angle_degrees: i16,
    max_angle_degrees: i16,
    min_range: u16,
    max_range_percent_effect: u16,
    reliability: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ShooterRecord {
    hardpoint_shot: HardpointShot,
    rotation_speed: FixedAngle,
    firing_cap_cost: u16,
    firing_cooldown: u16,
    min_angle_degrees: i16,
    max_angle_degrees: i16,
    min_range: u16,
    max_range_percent_effect: u16,
    reliability: u8,
}

impl TryFrom<ShooterRecord> for HardpointShooter {
    type Error = BlueError;

    fn try_from(r: ShooterRecord) -> BlueResult<Self> {
        let s = Self {
            shot: r.hardpoint_shot,
            rotation_speed: r.rotation_speed,
            firing_cap_cost: r.firing_cap_cost,
            firing_cooldown: r.firing_cooldown,
            min_angle_degrees: r.min_angle_degrees,
            max_angle_degrees: r.max_angle_degrees,
            min_range: r.min_range,
            max_range_percent_effect: r.max_range_percent_effect,
            reliability: r.reliability,
        };
        s.validate()?;
        Ok(s)
    }
}

impl From<HardpointShooter> for ShooterRecord {
    fn from(s: HardpointShooter) -> Self {
        Self {
            hardpoint_shot: s.shot,
            rotation_speed: s.rotation_speed,
            firing_cap_cost: s.firing_cap_cost,
            firing_cooldown: s.firing_cooldown,
            min_angle_degrees: s.min_angle_degrees,
            max_angle_degrees: s.max_angle_degrees,
            min_range: s.min_range,
            max_range_percent_effect: s.max_range_percent_effect,
            reliability: s.reliability,
        }
    }
}

/// Construction parameters for a [`HardpointShooter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShooterParams {
    /// Turn rate per frame. Must be positive.
    pub rotation_speed: FixedAngle,
    /// Capacitor spent per shot.
    pub firing_cap_cost: u16,
    /// Frames between shots.
    pub firing_cooldown: u16,
    /// Start of the firing arc, `0..=360`.
    pub min_angle_degrees: i16,
    /// End of the firing arc, `-360..=360`.
    pub max_angle_degrees: i16,
    /// Closest permitted target.
    pub min_range: u16,
    /// Effect at max range as a percentage of the effect at min range.
    pub max_range_percent_effect: u16,
    /// Percentage of the effect that is not random.
    pub reliability: u8,
}

impl HardpointShooter {
    /// A validated shooter.
    ///
    /// # Errors
    ///
    /// Fails when angles, ranges, rotation speed, reliability or the shot
    /// index are out of bounds.
    pub fn new(shot: HardpointShot, p: ShooterParams) -> BlueResult<Self> {
        let s = Self {
            shot,
            rotation_speed: p.rotation_speed,
            firing_cap_cost: p.firing_cap_cost,
            firing_cooldown: p.firing_cooldown,
            min_angle_degrees: p.min_angle_degrees,
            max_angle_degrees: p.max_angle_degrees,
            min_range: p.min_range,
            max_range_percent_effect: p.max_range_percent_effect,
            reliability: p.reliability,
        };
        s.validate()?;
        Ok(s)
    }

    fn validate(&self) -> BlueResult<()> {
        let fail = |m: &str| Err(BlueError::Component(format!("Hardpoint shooter {m}.")));
        if !(0..=360).contains(&self.min_angle_degrees) {
            return fail("min-angle-degrees out of bounds");
        }
        if !(-360..=360).contains(&self.max_angle_degrees) {
            return fail("max-angle-degrees out of bounds");
        }
        if self.shot.max_range < self.min_range {
            return fail("has bad min/max range");
        }
        if self.rotation_speed <= 0 {
            return fail("has illegal rotation speed");
        }
        if self.reliability > 100 {
            return fail("reliability is beyond 100%");
        }
        if self.shot.hardpoint_index > MAX_HARDPOINT_INDEX {
            return fail("has bad hardpoint index");
        }
        Ok(())
    }

    /// Makes a shot at full potential, scaled by the reliability roll:
    /// `0.01 * (rel + (100 - rel) * normal())`.
    pub fn make_a_shot(&self, rng: &mut BoardRng) -> HardpointShot {
        let rel = f32::from(self.reliability);
        let e = 0.01 * (rel + (100.0 - rel) * rng.normal());
        HardpointShot {
            effect: self.shot.effect.scaled(e),
            ..self.shot
        }
    }

    /// Effect multiplier at `target_range`: 1 at or inside `min_range`, 0
    /// beyond `max_range`, linear towards `max_range_effect`% in between.
    #[must_use]
    pub fn calculate_falloff(
        target_range: u16,
        min_range: u16,
        max_range: u16,
        max_range_effect: u16,
    ) -> f32 {
        if target_range <= min_range {
            return 1.0;
        }
        if target_range > max_range {
            return 0.0;
        }
        let range_factor =
            f32::from(target_range - min_range) / f32::from(max_range - min_range);
        let delta = 0.01 * f32::from(max_range_effect) - 1.0;
        range_factor * delta + 1.0
    }

    /// Falloff of this shooter at `range`.
    #[must_use]
    pub fn falloff_at(&self, range: u16) -> f32 {
        Self::calculate_falloff(
            range,
            self.min_range,
            self.shot.max_range,
            self.max_range_percent_effect,
        )
    }

    /// Records the shooter's position within its machine.
    pub const fn set_index(&mut self, index: u8) {
        self.shot.hardpoint_index = index;
    }

    /// The template shot.
    #[must_use]
    pub const fn shot(&self) -> &HardpointShot {
        &self.shot
    }

    /// Kind of hardpoint.
    #[must_use]
    pub const fn hardpoint_type(&self) -> HardpointType {
        self.shot.effect.hardpoint_type()
    }

    /// Start of the arc.
    #[must_use]
    pub const fn min_angle(&self) -> FixedAngle {
        degrees_to_fixed_angle(self.min_angle_degrees)
    }

    /// End of the arc.
    #[must_use]
    pub const fn max_angle(&self) -> FixedAngle {
        degrees_to_fixed_angle(self.max_angle_degrees)
    }

    /// The angle midway through the arc.
    #[must_use]
    pub const fn get_mid_angle(&self) -> FixedAngle {
        let range = (self.max_angle() + TWO_PI - self.min_angle()).rem_euclid(TWO_PI);
        (self.min_angle() + range / 2).rem_euclid(TWO_PI)
    }

    /// Turn rate per frame.
    #[must_use]
    pub const fn rotation_speed(&self) -> FixedAngle {
        self.rotation_speed
    }

    /// Capacitor per shot.
    #[must_use]
    pub const fn firing_cap_cost(&self) -> u16 {
        self.firing_cap_cost
    }

    /// Frames between shots.
    #[must_use]
    pub const fn firing_cooldown(&self) -> u16 {
        self.firing_cooldown
    }

    /// Closest target.
    #[must_use]
    pub const fn min_range(&self) -> u16 {
        self.min_range
    }

    /// Furthest target.
    #[must_use]
    pub const fn max_range(&self) -> u16 {
        self.shot.max_range
    }

    /// Reliability percentage.
    #[must_use]
    pub const fn reliability(&self) -> u8 {
        self.reliability
    }
}

/// Angle from a machine at `location` facing `facing_angle` to `target`,
/// relative to the facing and in `[0, TWO_PI)`. Zero when the two
/// locations coincide.
#[must_use]
pub fn relative_angle_to_target(
    facing_angle: FixedAngle,
    location: HexCoord,
    target: HexCoord,
) -> FixedAngle {
    if location == target {
        return 0;
    }
    let [lx, ly] = calculate_xy(location);
    let [tx, ty] = calculate_xy(target);
    let absolute = radians_to_fixed_angle((ty - ly).atan2(tx - lx));
    (absolute - facing_angle).rem_euclid(TWO_PI)
}

/// True if `angle` lies within the arc running from `min` to `max`.
#[must_use]
pub const fn in_angle_range(angle: FixedAngle, min: FixedAngle, max: FixedAngle) -> bool {
    let r = TWO_PI - min;
    let a = (angle + r).rem_euclid(TWO_PI);
    let m = (max + r).rem_euclid(TWO_PI);
    a <= m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_angle::{HALF_PI, PI};

    fn create_test_shooter(min_deg: i16, max_deg: i16) -> HardpointShooter {
        let shot = HardpointShot {
            hardpoint_index: 1,
            max_range: 23,
            effect: ShotEffect::CapDrain(40),
        };
        HardpointShooter::new(
            shot,
            ShooterParams {
                rotation_speed: 180,
                firing_cap_cost: 12,
                firing_cooldown: 3,
                min_angle_degrees: min_deg,
                max_angle_degrees: max_deg,
                min_range: 15,
                max_range_percent_effect: 55,
                reliability: 80,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_falloff() {
        assert_eq!(HardpointShooter::calculate_falloff(10, 10, 20, 0), 1.0);
        assert_eq!(HardpointShooter::calculate_falloff(20, 10, 20, 0), 0.0);
        assert_eq!(HardpointShooter::calculate_falloff(15, 10, 20, 0), 0.5);
        assert_eq!(HardpointShooter::calculate_falloff(20, 10, 20, 100), 1.0);
        assert_eq!(HardpointShooter::calculate_falloff(20, 10, 20, 50), 0.5);
        assert_eq!(HardpointShooter::calculate_falloff(15, 10, 20, 50), 0.75);
        assert_eq!(HardpointShooter::calculate_falloff(20, 10, 20, 200), 2.0);
        assert_eq!(HardpointShooter::calculate_falloff(15, 10, 20, 200), 1.5);
        assert_eq!(HardpointShooter::calculate_falloff(21, 10, 20, 200), 0.0);
    }

    #[test]
    fn test_mid_angle() {
        let h = create_test_shooter(0, 180);
        assert_eq!(h.get_mid_angle(), (h.max_angle() - h.min_angle()) / 2);
        assert_eq!(h.get_mid_angle(), HALF_PI);
    }

    #[test]
    fn test_validation() {
        let shot = create_test_shooter(10, 32).shot;
        let mut p = ShooterParams {
            rotation_speed: 0,
            firing_cap_cost: 1,
            firing_cooldown: 1,
            min_angle_degrees: 0,
            max_angle_degrees: 10,
            min_range: 0,
            max_range_percent_effect: 100,
            reliability: 100,
        };
        assert!(HardpointShooter::new(shot, p).is_err());
        p.rotation_speed = 1;
        assert!(HardpointShooter::new(shot, p).is_ok());
        p.reliability = 101;
        assert!(HardpointShooter::new(shot, p).is_err());
        p.reliability = 50;
        p.min_range = 30;
        assert!(HardpointShooter::new(shot, p).is_err());
    }

    #[test]
    fn test_shooter_json_keys() {
        let h = create_test_shooter(10, 32);
        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v["hardpoint-shot"]["hardpoint-type"], "drain");
        assert_eq!(v["hardpoint-shot"]["cap-drained"], 40);
        assert_eq!(v["firing-cap-cost"], 12);
        let back: HardpointShooter = serde_json::from_value(v).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_full_reliability_is_exact() {
        let mut h = create_test_shooter(0, 90);
        h.reliability = 100;
        let mut rng = BoardRng::new(3);
        for _ in 0..10 {
            assert_eq!(h.make_a_shot(&mut rng).effect, ShotEffect::CapDrain(40));
        }
    }

    #[test]
    fn test_angle_helpers() {
        assert!(in_angle_range(0, TWO_PI - 100, 100));
        assert!(!in_angle_range(PI, TWO_PI - 100, 100));
        assert!(in_angle_range(HALF_PI, 0, PI));
        let a = HexCoord::new(2, 2);
        assert_eq!(relative_angle_to_target(0, a, a), 0);
        let east = HexCoord::new(4, 2);
        assert_eq!(relative_angle_to_target(0, a, east), 0);
        assert_eq!(relative_angle_to_target(HALF_PI, a, east), TWO_PI - HALF_PI);
    }
}
