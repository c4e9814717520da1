//! Machine explosions.

#![allow(clippy::cast_sign_loss)]

use serde::{Deserialize, Serialize};

use super::{DamageType, Damages};
use crate::constants::{
    EXPLOSIVE_DMG_PER_CAPACITANCE, EXPLOSIVE_DMG_PER_COMPONENT, EXPLOSIVE_RANGE_PER_COMPONENT,
};
use crate::hex::HexCoord;

/// The blast a dying machine releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explosion {
    /// Epicentre.
    pub xy: HexCoord,
    /// Total damage at the epicentre's neighbours.
    pub damage: u16,
    /// Share of the stored capacitance that came from nuclear components.
    pub percent_nuclear: u16,
    /// Reach in tiles, at least one.
    pub range: u16,
}

impl Explosion {
    /// The explosion of a machine at `xy` holding `capacitance` with
    /// `components` parts, `nuclear_proportion` of its power nuclear.
    #[must_use]
    pub fn of_machine(
        xy: HexCoord,
        capacitance: u16,
        components: usize,
        nuclear_proportion: f32,
    ) -> Self {
        let dmg = f32::from(capacitance) * EXPLOSIVE_DMG_PER_CAPACITANCE
            + components as f32 * EXPLOSIVE_DMG_PER_COMPONENT;
        Self {
            xy,
            damage: dmg.clamp(0.0, f32::from(u16::MAX)) as u16,
            percent_nuclear: (100.0 * nuclear_proportion.clamp(0.0, 1.0)).floor() as u16,
            range: (EXPLOSIVE_RANGE_PER_COMPONENT * components as f32).max(1.0) as u16,
        }
    }
}

/// Damage dealt by `boom` before distance falloff.
///
/// Half the damage is split between conventional and nuclear parts;
/// conventional blasts are kinetic and thermal, nuclear blasts are mostly
/// electromagnetic and radiation.
#[must_use]
pub fn explosion_damages(boom: &Explosion) -> Damages {
    let half = 0.5 * f32::from(boom.damage);
    let nuclear = 0.01 * f32::from(boom.percent_nuclear);
    let conventional_dmg = half * (1.0 - nuclear);
    let nuclear_dmg = half * nuclear;

    let mut d = Damages::default();
    d.dmg_type[DamageType::Thermal as usize] = 0.125 * nuclear_dmg + 0.5 * conventional_dmg;
    d.dmg_type[DamageType::Kinetic as usize] = 0.125 * nuclear_dmg + 0.5 * conventional_dmg;
    d.dmg_type[DamageType::ElectroMagnetic as usize] = 0.375 * nuclear_dmg;
    d.dmg_type[DamageType::Radiation as usize] = 0.375 * nuclear_dmg;
    d
}

/// Inverse-square falloff at `distance` tiles. The epicentre gets nothing.
#[must_use]
pub fn explosion_falloff(distance: u16) -> f32 {
    if distance == 0 {
        0.0
    } else {
        let d = f32::from(distance);
        1.0 / (d * d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_MACHINE_COMPONENTS;

    #[test]
    fn test_explosive_power() {
        let boom = Explosion::of_machine(HexCoord::new(1, 1), 100, 5, 0.0);
        assert_eq!(boom.damage, 105);
        assert_eq!(boom.percent_nuclear, 0);
        assert_eq!(boom.range, 1);

        let big = Explosion::of_machine(HexCoord::new(1, 1), 0, MAX_MACHINE_COMPONENTS, 0.5);
        assert_eq!(big.range, 4);
        assert_eq!(big.percent_nuclear, 50);
    }

    #[test]
    fn test_conventional_damage_split() {
        let boom = Explosion {
            xy: HexCoord::new(0, 0),
            damage: 100,
            percent_nuclear: 0,
            range: 1,
        };
        let d = explosion_damages(&boom);
        assert!((d.kinetic_dmg() - 25.0).abs() < 1e-5);
        assert!((d.thermal_dmg() - 25.0).abs() < 1e-5);
        assert!(d.em_dmg().abs() < 1e-6);
    }

    #[test]
    fn test_nuclear_damage_split() {
        let boom = Explosion {
            xy: HexCoord::new(0, 0),
            damage: 80,
            percent_nuclear: 100,
            range: 1,
        };
        let d = explosion_damages(&boom);
        assert!((d.em_dmg() - 15.0).abs() < 1e-5);
        assert!((d.radiation_dmg() - 15.0).abs() < 1e-5);
        assert!((d.kinetic_dmg() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_falloff() {
        assert!(explosion_falloff(0).abs() < f32::EPSILON);
        assert!((explosion_falloff(1) - 1.0).abs() < f32::EPSILON);
        assert!((explosion_falloff(2) - 0.25).abs() < f32::EPSILON);
    }
}
