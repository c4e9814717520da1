//! Damage, resistance and hull/armour resolution.
//!
//! Damage and repairs accumulate during a frame and are resolved together at
//! the end of it. Hull is never repaired; armour is.

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

mod explosion;

use serde::{Deserialize, Serialize};

pub use explosion::{Explosion, explosion_damages, explosion_falloff};

use crate::rng::BoardRng;

/// Index of each damage type inside [`Damages`] and [`Resistances`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageType {
    /// Physical impact.
    Kinetic = 0,
    /// Heat.
    Thermal = 1,
    /// Electromagnetic.
    ElectroMagnetic = 2,
    /// Radiation.
    Radiation = 3,
}

/// A block of damage broken down by type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Damages {
    /// Per type amounts, indexed by [`DamageType`].
    pub dmg_type: [f32; 4],
}

impl Damages {
    /// Damages from the four typed amounts.
    #[must_use]
    pub const fn new(kinetic: f32, thermal: f32, em: f32, radiation: f32) -> Self {
        Self {
            dmg_type: [kinetic, thermal, em, radiation],
        }
    }

    /// Kinetic part.
    #[must_use]
    pub const fn kinetic_dmg(&self) -> f32 {
        self.dmg_type[DamageType::Kinetic as usize]
    }

    /// Thermal part.
    #[must_use]
    pub const fn thermal_dmg(&self) -> f32 {
        self.dmg_type[DamageType::Thermal as usize]
    }

    /// Electromagnetic part.
    #[must_use]
    pub const fn em_dmg(&self) -> f32 {
        self.dmg_type[DamageType::ElectroMagnetic as usize]
    }

    /// Radiation part.
    #[must_use]
    pub const fn radiation_dmg(&self) -> f32 {
        self.dmg_type[DamageType::Radiation as usize]
    }

    /// Sum of all types.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.dmg_type.iter().sum()
    }
}

impl std::ops::Mul<f32> for Damages {
    type Output = Self;

    fn mul(mut self, f: f32) -> Self {
        self *= f;
        self
    }
}

impl std::ops::MulAssign<f32> for Damages {
    fn mul_assign(&mut self, f: f32) {
        for d in &mut self.dmg_type {
            *d *= f;
        }
    }
}

/// Multipliers applied to incoming damage. Zero blocks that type entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resistances {
    factors: [f32; 4],
}

impl Default for Resistances {
    fn default() -> Self {
        Self { factors: [1.0; 4] }
    }
}

impl Resistances {
    /// Resistances from the fraction of each type that is resisted, each in
    /// `[0, 1]`.
    #[must_use]
    pub fn new(kinetic: f32, thermal: f32, em: f32, radiation: f32) -> Self {
        let r = [kinetic, thermal, em, radiation];
        debug_assert!(r.iter().all(|v| (0.0..=1.0).contains(v)));
        Self {
            factors: r.map(|v| 1.0 - v.clamp(0.0, 1.0)),
        }
    }

    /// Fraction of `t` damage that gets through.
    #[must_use]
    pub const fn factor(&self, t: DamageType) -> f32 {
        self.factors[t as usize]
    }
}

/// Hull and armour of one machine, with the current frame's pending damage and
/// repairs.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_copy_implementations)]
pub struct CombatSystem {
    accumulated_damage: i32,
    accumulated_armour_repair: i32,
    armour: i32,
    hull: i32,
    total_armour: i32,
    resistances: Resistances,
}

impl CombatSystem {
    /// Full health with the given totals.
    #[must_use]
    pub fn new(total_hull: u32, total_armour: u32, resistances: Resistances) -> Self {
        let hull = i32::try_from(total_hull).unwrap_or(i32::MAX);
        let armour = i32::try_from(total_armour).unwrap_or(i32::MAX);
        Self {
            accumulated_damage: 0,
            accumulated_armour_repair: 0,
            armour,
            hull,
            total_armour: armour,
            resistances,
        }
    }

    /// Queue damage for this frame after resistances.
    pub fn apply_damage(&mut self, d: &Damages) {
        let resisted: f32 = [
            DamageType::Kinetic,
            DamageType::Thermal,
            DamageType::ElectroMagnetic,
            DamageType::Radiation,
        ]
        .iter()
        .map(|t| d.dmg_type[*t as usize] * self.resistances.factor(*t))
        .sum();
        self.accumulated_damage = self.accumulated_damage.saturating_add(resisted.max(0.0) as i32);
    }

    /// Queue an armour repair for this frame.
    pub fn repair_armour(&mut self, h: i32) {
        self.accumulated_armour_repair = self.accumulated_armour_repair.saturating_add(h.max(0));
    }

    /// True while hull is positive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hull > 0
    }

    /// Zero the hull.
    pub const fn kill(&mut self) {
        self.hull = 0;
    }

    /// Remaining hull. Negative once dead, reflecting how badly.
    #[must_use]
    pub const fn hull(&self) -> i32 {
        self.hull
    }

    /// Remaining armour.
    #[must_use]
    pub const fn armour(&self) -> i32 {
        self.armour
    }

    /// Armour when fully repaired.
    #[must_use]
    pub const fn total_armour(&self) -> i32 {
        self.total_armour
    }

    /// Apply this frame's damage and repairs. Returns true if still alive.
    pub fn resolve(&mut self, rng: &mut BoardRng) -> bool {
        if self.accumulated_damage > 0 || self.accumulated_armour_repair > 0 {
            self.resolve_combat(rng);
        }
        self.is_alive()
    }

    // Damage is modelled as instantaneous and repairs as arriving smoothly over
    // the frame. Sampling at a quarter and three quarters of the frame gives
    // the average damage that leaks past armour into the hull.
    fn resolve_combat(&mut self, rng: &mut BoardRng) {
        let damage = self.accumulated_damage;
        let repair = self.accumulated_armour_repair;
        let total_health = self.hull + self.armour;

        if total_health + repair > damage {
            let exceeding = damage - total_health;
            let damage_then_repair = (damage - (self.armour + repair / 4)).max(0);
            let repair_then_damage = (damage - (self.armour + 3 * repair / 4)).max(0);
            let hull_damage = (damage_then_repair + repair_then_damage) / 2;
            let armour_damage = damage - hull_damage;

            self.armour -= armour_damage;
            self.hull -= hull_damage;

            if self.hull > 0 && exceeding > 0 {
                let prob_death = exceeding as f32 / repair as f32;
                let r = rng.frand();
                if r < prob_death {
                    self.armour = 0;
                    self.hull = (exceeding as f32 * ((r / prob_death) - 1.0)) as i32;
                }
            }

            if self.hull > 0 {
                self.armour = (self.armour + repair).clamp(0, self.total_armour);
            }
        } else {
            self.armour = 0;
            self.hull = total_health + repair - damage;
        }

        self.accumulated_damage = 0;
        self.accumulated_armour_repair = 0;
    }
}
