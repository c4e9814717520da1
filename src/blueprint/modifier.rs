//! Softpoint hardware modifiers.
//!
//! Each modifiable hardware stat has a delta and a factor. Applied to a base
//! value the result is `(base + delta) * factor`, clamped to the stat's range.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BlueError, BlueResult};

/// Number of hardware stats a modifier can change.
pub const HARDWARE_STAT_COUNT: usize = 28;

/// A hardware stat that softpoints can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareStat {
    /// CPU cycles available per tick.
    ProcessorSpeedCyclesPerTick,
    /// Furthest ring that can be sensed.
    MaxSensingRadius,
    /// Sensing throughput.
    TilesSensedPer10Ticks,
    /// Solar panels feeding the capacitor.
    CapSolarPanelsCount,
    /// Capacitor size.
    CapCapacity,
    /// Capacitance per instruction executed.
    CapInstructionCost,
    /// Capacitance regained per tick.
    CapRefillPerTick,
    /// Capacitance per tile sensed.
    CapSensingCostPerTile,
    /// Capacitance per tile of broadcast range.
    CapBroadcastCostPerTile,
    /// Capacitance per tile of transmit range.
    CapTransmitCostPerTile,
    /// Capacitance added to each firing.
    CapFiringCost,
    /// Capacitance per ore unit refined.
    CapRefineCost,
    /// Furthest firing range.
    MaxFiringRange,
    /// Forward thrust.
    ThrustPower,
    /// Turning thrust.
    TurnPower,
    /// Hull hit points.
    HullHitpoints,
    /// Armour hit points.
    ArmourHitpoints,
    /// Messages the machine can keep.
    MaxStoredMessages,
    /// Broadcast radius.
    MaxBroadcastRange,
    /// Transmit distance.
    MaxTransmitRange,
    /// Cargo volume.
    CargoholdVolume,
    /// Build time per component.
    TicksToBuildAComponent,
    /// Build capacitance per ten components.
    CapToBuild10Components,
    /// Percent kinetic resistance.
    KineticResistance,
    /// Percent thermal resistance.
    ThermalResistance,
    /// Percent electromagnetic resistance.
    EmResistance,
    /// Percent radiation resistance.
    RadiationResistance,
    /// Ticks to refine one ore unit.
    RefinePeriod,
}

impl HardwareStat {
    /// Every stat, in storage order.
    pub const ALL: [Self; HARDWARE_STAT_COUNT] = [
        Self::ProcessorSpeedCyclesPerTick,
        Self::MaxSensingRadius,
        Self::TilesSensedPer10Ticks,
        Self::CapSolarPanelsCount,
        Self::CapCapacity,
        Self::CapInstructionCost,
        Self::CapRefillPerTick,
        Self::CapSensingCostPerTile,
        Self::CapBroadcastCostPerTile,
        Self::CapTransmitCostPerTile,
        Self::CapFiringCost,
        Self::CapRefineCost,
        Self::MaxFiringRange,
        Self::ThrustPower,
        Self::TurnPower,
        Self::HullHitpoints,
        Self::ArmourHitpoints,
        Self::MaxStoredMessages,
        Self::MaxBroadcastRange,
        Self::MaxTransmitRange,
        Self::CargoholdVolume,
        Self::TicksToBuildAComponent,
        Self::CapToBuild10Components,
        Self::KineticResistance,
        Self::ThermalResistance,
        Self::EmResistance,
        Self::RadiationResistance,
        Self::RefinePeriod,
    ];

    /// Storage index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Suffix used in the persisted `delta_*` and `factor_*` keys.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ProcessorSpeedCyclesPerTick => "processor_speed_cycles_per_tick",
            Self::MaxSensingRadius => "max_sensing_radius",
            Self::TilesSensedPer10Ticks => "tiles_sensed_per_10_ticks",
            Self::CapSolarPanelsCount => "cap_solar_panels_count",
            Self::CapCapacity => "cap_capacity",
            Self::CapInstructionCost => "cap_instruction_cost",
            Self::CapRefillPerTick => "cap_refill_per_tick",
            Self::CapSensingCostPerTile => "cap_sensing_cost_per_tile",
            Self::CapBroadcastCostPerTile => "cap_broadcast_cost_per_tile",
            Self::CapTransmitCostPerTile => "cap_transmit_cost_per_tile",
            Self::CapFiringCost => "cap_firing_cost",
            Self::CapRefineCost => "cap_refine_cost",
            Self::MaxFiringRange => "max_firing_range",
            Self::ThrustPower => "thrust_power",
            Self::TurnPower => "turn_power",
            Self::HullHitpoints => "hull_hitpoints",
            Self::ArmourHitpoints => "armour_hitpoints",
            Self::MaxStoredMessages => "max_stored_messages",
            Self::MaxBroadcastRange => "max_broadcast_range",
            Self::MaxTransmitRange => "max_transmit_range",
            Self::CargoholdVolume => "cargohold_volume",
            Self::TicksToBuildAComponent => "ticks_to_build_a_component",
            Self::CapToBuild10Components => "cap_to_build_10_components",
            Self::KineticResistance => "kinetic_resistance",
            Self::ThermalResistance => "thermal_resistance",
            Self::EmResistance => "em_resistance",
            Self::RadiationResistance => "radiation_resistance",
            Self::RefinePeriod => "refine_period",
        }
    }

    /// Largest value the stat may hold.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn max_value(self) -> u32 {
        match self {
            Self::ProcessorSpeedCyclesPerTick => u32::MAX,
            Self::ThrustPower | Self::TurnPower | Self::HullHitpoints | Self::ArmourHitpoints => {
                i32::MAX as u32
            }
            _ => u16::MAX as u32,
        }
    }
}

/// A multiplicative hardware factor. The neutral factor is one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardwareFactor {
    #[serde(rename = "hardware-factor")]
    factor: f32,
}

impl Default for HardwareFactor {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl HardwareFactor {
    /// Wrap a factor.
    #[must_use]
    pub const fn new(factor: f32) -> Self {
        Self { factor }
    }

    /// The factor.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.factor
    }
}

/// Changes a softpoint makes to a machine's hardware.
///
/// Modifiers combine by summing deltas and multiplying factors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
#[allow(missing_copy_implementations)]
pub struct HardwareModifier {
    deltas: [i32; HARDWARE_STAT_COUNT],
    factors: [HardwareFactor; HARDWARE_STAT_COUNT],
}

impl HardwareModifier {
    /// The delta for `stat`.
    #[must_use]
    pub const fn delta(&self, stat: HardwareStat) -> i32 {
        self.deltas[stat.index()]
    }

    /// The factor for `stat`.
    #[must_use]
    pub const fn factor(&self, stat: HardwareStat) -> f32 {
        self.factors[stat.index()].value()
    }

    /// Builder: set the delta for `stat`.
    #[must_use]
    pub const fn with_delta(mut self, stat: HardwareStat, delta: i32) -> Self {
        self.deltas[stat.index()] = delta;
        self
    }

    /// Builder: set the factor for `stat`.
    #[must_use]
    pub const fn with_factor(mut self, stat: HardwareStat, factor: f32) -> Self {
        self.factors[stat.index()] = HardwareFactor::new(factor);
        self
    }
}

impl std::ops::AddAssign<&HardwareModifier> for HardwareModifier {
    fn add_assign(&mut self, rhs: &HardwareModifier) {
        for i in 0..HARDWARE_STAT_COUNT {
            self.deltas[i] = self.deltas[i].saturating_add(rhs.deltas[i]);
            self.factors[i] = HardwareFactor::new(self.factors[i].value() * rhs.factors[i].value());
        }
    }
}

impl TryFrom<Map<String, Value>> for HardwareModifier {
    type Error = BlueError;

    fn try_from(map: Map<String, Value>) -> BlueResult<Self> {
        let mut m = Self::default();
        for stat in HardwareStat::ALL {
            let delta_key = format!("delta_{}", stat.key());
            let factor_key = format!("factor_{}", stat.key());

            let delta = map
                .get(&delta_key)
                .and_then(Value::as_i64)
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| BlueError::Component(format!("missing or invalid {delta_key}")))?;

            let factor: HardwareFactor = map
                .get(&factor_key)
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .ok_or_else(|| BlueError::Component(format!("missing {factor_key}")))?;

            m.deltas[stat.index()] = delta;
            m.factors[stat.index()] = factor;
        }
        Ok(m)
    }
}

impl From<HardwareModifier> for Map<String, Value> {
    fn from(m: HardwareModifier) -> Self {
        let mut map = Map::new();
        for stat in HardwareStat::ALL {
            map.insert(
                format!("delta_{}", stat.key()),
                Value::from(m.deltas[stat.index()]),
            );
        }
        for stat in HardwareStat::ALL {
            map.insert(
                format!("factor_{}", stat.key()),
                serde_json::json!({ "hardware-factor": m.factors[stat.index()].value() }),
            );
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_modifier() -> HardwareModifier {
        let mut m = HardwareModifier::default();
        for (i, stat) in HardwareStat::ALL.iter().enumerate() {
            let n = i32::try_from(i).unwrap();
            m = m
                .with_delta(*stat, 5 * n + 5)
                .with_factor(*stat, 0.5 + 0.01 * f32::from(u8::try_from(i).unwrap()));
        }
        m
    }

    #[test]
    fn test_equality() {
        let m = create_test_modifier();
        assert_eq!(m, m.clone());
        assert_ne!(m, HardwareModifier::default());
    }

    #[test]
    fn test_json_round_trip_keys() {
        let m = create_test_modifier();
        let j = serde_json::to_value(&m).unwrap();
        assert_eq!(j["delta_processor_speed_cycles_per_tick"], 5);
        assert!(j["factor_refine_period"]["hardware-factor"].is_number());
        assert_eq!(j.as_object().unwrap().len(), 2 * HARDWARE_STAT_COUNT);
        let back: HardwareModifier = serde_json::from_value(j).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let mut j = serde_json::to_value(create_test_modifier()).unwrap();
        j.as_object_mut().unwrap().remove("delta_turn_power");
        assert!(serde_json::from_value::<HardwareModifier>(j).is_err());
    }

    #[test]
    fn test_combining() {
        let a = HardwareModifier::default()
            .with_delta(HardwareStat::CapCapacity, 10)
            .with_factor(HardwareStat::CapCapacity, 2.0);
        let mut b = a.clone();
        b += &a;
        assert_eq!(b.delta(HardwareStat::CapCapacity), 20);
        assert!((b.factor(HardwareStat::CapCapacity) - 4.0).abs() < f32::EPSILON);
        assert!((b.factor(HardwareStat::TurnPower) - 1.0).abs() < f32::EPSILON);
    }
}
