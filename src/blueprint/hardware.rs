//! A machine's derived capabilities.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]

use super::modifier::{HARDWARE_STAT_COUNT, HardwareModifier, HardwareStat};
use crate::constants::{
    DEFAULT_CAP_TO_BUILD_10_COMPONENTS, DEFAULT_CYCLES_PER_INSTRUCTION,
    DEFAULT_TICKS_TO_BUILD_1_COMPONENT,
};
use crate::error::{BlueError, BlueResult};

/// Capabilities computed from a blueprint's components and softpoint
/// modifiers. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_copy_implementations)]
pub struct Hardware {
    cycles_per_instruction: u32,
    max_possible_speed: i32,
    max_possible_turn_speed: i32,
    stats: [u32; HARDWARE_STAT_COUNT],
}

impl Default for Hardware {
    fn default() -> Self {
        let mut stats = [0; HARDWARE_STAT_COUNT];
        stats[HardwareStat::TicksToBuildAComponent.index()] = DEFAULT_TICKS_TO_BUILD_1_COMPONENT;
        stats[HardwareStat::CapToBuild10Components.index()] = DEFAULT_CAP_TO_BUILD_10_COMPONENTS;
        stats[HardwareStat::RefinePeriod.index()] = 1;
        Self {
            cycles_per_instruction: DEFAULT_CYCLES_PER_INSTRUCTION,
            max_possible_speed: 0,
            max_possible_turn_speed: 0,
            stats,
        }
    }
}

impl Hardware {
    /// Base hardware from physical totals, before softpoint modifiers.
    ///
    /// # Errors
    ///
    /// Fails if `weight` is not positive or `mobility` is outside `[0, 1]`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cycles_per_instruction: u32,
        mobility: f32,
        max_speed: i32,
        max_turn_speed: i32,
        cap_capacity: u16,
        engine_power: i32,
        weight: i32,
        hull_hitpoints: i32,
    ) -> BlueResult<Self> {
        if weight <= 0 {
            return Err(BlueError::Component("Hardware weight out of range.".into()));
        }
        if !(0.0..=1.0).contains(&mobility) {
            return Err(BlueError::Component("Hardware mobility out of range.".into()));
        }

        let thrust = (1000.0 * engine_power as f32) / weight as f32;
        let turn = (1000.0 * mobility * engine_power as f32) / weight as f32;

        let mut hw = Self {
            cycles_per_instruction,
            max_possible_speed: max_speed,
            max_possible_turn_speed: max_turn_speed,
            ..Self::default()
        };
        hw.stats[HardwareStat::CapCapacity.index()] = u32::from(cap_capacity);
        hw.stats[HardwareStat::ThrustPower.index()] = thrust.max(0.0) as u32;
        hw.stats[HardwareStat::TurnPower.index()] = turn.max(0.0) as u32;
        hw.stats[HardwareStat::HullHitpoints.index()] = hull_hitpoints.max(0) as u32;
        Ok(hw)
    }

    /// Apply a modifier, clamping every stat to its range.
    ///
    /// # Errors
    ///
    /// Fails if the result is not a workable machine: zero cycles per
    /// instruction, no hull, a resistance above 100% or a zero refine period.
    pub fn modified_by(&self, m: &HardwareModifier) -> BlueResult<Self> {
        let mut hw = self.clone();
        for stat in HardwareStat::ALL {
            let max = i64::from(stat.max_value());
            let base = i64::from(hw.stats[stat.index()]);
            let with_delta = (base + i64::from(m.delta(stat))).clamp(0, max);
            let factored = (with_delta as f32 * m.factor(stat)).clamp(0.0, max as f32) as i64;
            hw.stats[stat.index()] = factored.clamp(0, max) as u32;
        }
        hw.validate()?;
        Ok(hw)
    }

    /// Check the hardware is usable.
    ///
    /// # Errors
    ///
    /// See [`Hardware::modified_by`].
    pub fn validate(&self) -> BlueResult<()> {
        if self.cycles_per_instruction == 0 {
            return Err(BlueError::Component("Cycles-per-Instruction is zero.".into()));
        }
        if self.get(HardwareStat::HullHitpoints) == 0 {
            return Err(BlueError::Component("Hull hit points is zero.".into()));
        }
        if [
            HardwareStat::KineticResistance,
            HardwareStat::ThermalResistance,
            HardwareStat::EmResistance,
            HardwareStat::RadiationResistance,
        ]
        .iter()
        .any(|s| self.get(*s) > 100)
        {
            return Err(BlueError::Component(
                "A hardware resistance was greater than 100%.".into(),
            ));
        }
        if self.get(HardwareStat::RefinePeriod) == 0 {
            return Err(BlueError::Component("Refine period is zero.".into()));
        }
        Ok(())
    }

    /// Zero every propulsion stat, for machines with no thrusters.
    pub fn remove_thruster_traits(&mut self) {
        self.stats[HardwareStat::ThrustPower.index()] = 0;
        self.stats[HardwareStat::TurnPower.index()] = 0;
        self.max_possible_speed = 0;
        self.max_possible_turn_speed = 0;
    }

    /// True if the machine can move or turn.
    #[must_use]
    pub const fn is_mobile(&self) -> bool {
        self.max_possible_speed > 0 || self.max_possible_turn_speed > 0
    }

    /// Raw value of any stat.
    #[must_use]
    pub const fn get(&self, stat: HardwareStat) -> u32 {
        self.stats[stat.index()]
    }

    const fn get_u16(&self, stat: HardwareStat) -> u16 {
        let v = self.stats[stat.index()];
        if v > u16::MAX as u32 { u16::MAX } else { v as u16 }
    }

    /// Cycles each instruction consumes.
    #[must_use]
    pub const fn cycles_per_instruction(&self) -> u32 {
        self.cycles_per_instruction
    }

    /// Top movement speed, unaffected by modifiers.
    #[must_use]
    pub const fn max_possible_speed(&self) -> i32 {
        self.max_possible_speed
    }

    /// Top turn speed, unaffected by modifiers.
    #[must_use]
    pub const fn max_possible_turn_speed(&self) -> i32 {
        self.max_possible_turn_speed
    }

    /// CPU cycles per tick.
    #[must_use]
    pub const fn processor_speed_cycles_per_tick(&self) -> u32 {
        self.get(HardwareStat::ProcessorSpeedCyclesPerTick)
    }

    /// Furthest sensing ring.
    #[must_use]
    pub const fn max_sensing_radius(&self) -> u16 {
        self.get_u16(HardwareStat::MaxSensingRadius)
    }

    /// Sensing throughput.
    #[must_use]
    pub const fn tiles_sensed_per_10_ticks(&self) -> u16 {
        self.get_u16(HardwareStat::TilesSensedPer10Ticks)
    }

    /// Solar panel count.
    #[must_use]
    pub const fn cap_solar_panels_count(&self) -> u16 {
        self.get_u16(HardwareStat::CapSolarPanelsCount)
    }

    /// Capacitor size.
    #[must_use]
    pub const fn cap_capacity(&self) -> u16 {
        self.get_u16(HardwareStat::CapCapacity)
    }

    /// Capacitance per instruction.
    #[must_use]
    pub const fn cap_instruction_cost(&self) -> u16 {
        self.get_u16(HardwareStat::CapInstructionCost)
    }

    /// Capacitance regained per tick from the engine.
    #[must_use]
    pub const fn cap_refill_per_tick(&self) -> u16 {
        self.get_u16(HardwareStat::CapRefillPerTick)
    }

    /// Capacitance per sensed tile.
    #[must_use]
    pub const fn cap_sensing_cost_per_tile(&self) -> u16 {
        self.get_u16(HardwareStat::CapSensingCostPerTile)
    }

    /// Capacitance per broadcast ring.
    #[must_use]
    pub const fn cap_broadcast_cost_per_tile(&self) -> u16 {
        self.get_u16(HardwareStat::CapBroadcastCostPerTile)
    }

    /// Capacitance per transmit tile.
    #[must_use]
    pub const fn cap_transmit_cost_per_tile(&self) -> u16 {
        self.get_u16(HardwareStat::CapTransmitCostPerTile)
    }

    /// Extra capacitance per firing.
    #[must_use]
    pub const fn cap_firing_cost(&self) -> u16 {
        self.get_u16(HardwareStat::CapFiringCost)
    }

    /// Capacitance per refined ore unit.
    #[must_use]
    pub const fn cap_refine_cost(&self) -> u16 {
        self.get_u16(HardwareStat::CapRefineCost)
    }

    /// Firing range cap.
    #[must_use]
    pub const fn max_firing_range(&self) -> u16 {
        self.get_u16(HardwareStat::MaxFiringRange)
    }

    /// Forward thrust.
    #[must_use]
    pub const fn thrust_power(&self) -> i32 {
        self.get(HardwareStat::ThrustPower) as i32
    }

    /// Turning thrust.
    #[must_use]
    pub const fn turn_power(&self) -> i32 {
        self.get(HardwareStat::TurnPower) as i32
    }

    /// Hull hit points.
    #[must_use]
    pub const fn hull_hitpoints(&self) -> i32 {
        self.get(HardwareStat::HullHitpoints) as i32
    }

    /// Armour hit points.
    #[must_use]
    pub const fn armour_hitpoints(&self) -> i32 {
        self.get(HardwareStat::ArmourHitpoints) as i32
    }

    /// Message buffer size.
    #[must_use]
    pub const fn max_stored_messages(&self) -> u16 {
        self.get_u16(HardwareStat::MaxStoredMessages)
    }

    /// Broadcast radius.
    #[must_use]
    pub const fn max_broadcast_range(&self) -> u16 {
        self.get_u16(HardwareStat::MaxBroadcastRange)
    }

    /// Transmit distance.
    #[must_use]
    pub const fn max_transmit_range(&self) -> u16 {
        self.get_u16(HardwareStat::MaxTransmitRange)
    }

    /// Cargo volume.
    #[must_use]
    pub const fn cargohold_volume(&self) -> u16 {
        self.get_u16(HardwareStat::CargoholdVolume)
    }

    /// Build ticks per component.
    #[must_use]
    pub const fn ticks_to_build_a_component(&self) -> u16 {
        self.get_u16(HardwareStat::TicksToBuildAComponent)
    }

    /// Build capacitance per ten components.
    #[must_use]
    pub const fn capcost_to_build_10_components(&self) -> u16 {
        self.get_u16(HardwareStat::CapToBuild10Components)
    }

    /// Percent resistances: kinetic, thermal, EM, radiation.
    #[must_use]
    pub const fn resistances_percent(&self) -> [u16; 4] {
        [
            self.get_u16(HardwareStat::KineticResistance),
            self.get_u16(HardwareStat::ThermalResistance),
            self.get_u16(HardwareStat::EmResistance),
            self.get_u16(HardwareStat::RadiationResistance),
        ]
    }

    /// Ticks to refine one ore unit, before the ore's own factor.
    #[must_use]
    pub const fn refine_period(&self) -> u16 {
        self.get_u16(HardwareStat::RefinePeriod)
    }
}
