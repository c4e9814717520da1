//! The attachable parts of a blueprint and the chassis they hang on.

use serde::{Deserialize, Serialize};

use super::component::{Component, ComponentOrientation};
use super::modifier::HardwareModifier;
use super::shooter::HardpointShooter;

/// An 8-bit colour in blue, green, red, alpha order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bgra {
    #[serde(rename = "BGRA")]
    channels: [u8; 4],
}

impl Bgra {
    /// A colour.
    #[must_use]
    pub const fn new(blue: u8, green: u8, red: u8, alpha: u8) -> Self {
        Self {
            channels: [blue, green, red, alpha],
        }
    }

    /// Channels as `[b, g, r, a]`.
    #[must_use]
    pub const fn channels(self) -> [u8; 4] {
        self.channels
    }
}

/// The team colours and readout colours a chassis glows with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmissiveChannels {
    /// First team colour.
    #[serde(rename = "colour-0")]
    pub colour_0: Bgra,
    /// Second team colour.
    #[serde(rename = "colour-1")]
    pub colour_1: Bgra,
    /// Readout 0, low end.
    #[serde(rename = "readout-0-0")]
    pub readout_0_0: Bgra,
    /// Readout 0, high end.
    #[serde(rename = "readout-0-1")]
    pub readout_0_1: Bgra,
    /// Readout 1, low end.
    #[serde(rename = "readout-1-0")]
    pub readout_1_0: Bgra,
    /// Readout 1, high end.
    #[serde(rename = "readout-1-1")]
    pub readout_1_1: Bgra,
}

/// The body every blueprint is built around. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Chassis {
    chassis_name: String,
    chassis_channels: EmissiveChannels,
}

impl Chassis {
    /// A named chassis.
    #[must_use]
    pub fn new(name: impl Into<String>, channels: EmissiveChannels) -> Self {
        Self {
            chassis_name: name.into(),
            chassis_channels: channels,
        }
    }

    /// Chassis name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.chassis_name
    }

    /// Chassis colours.
    #[must_use]
    pub const fn channels(&self) -> &EmissiveChannels {
        &self.chassis_channels
    }
}

/// A component that modifies a machine's hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Softpoint {
    hardware_modifier: HardwareModifier,
    component: Component,
}

impl Softpoint {
    /// A softpoint.
    #[must_use]
    pub const fn new(component: Component, modifier: HardwareModifier) -> Self {
        Self {
            hardware_modifier: modifier,
            component,
        }
    }

    /// Physical part.
    #[must_use]
    pub const fn details(&self) -> &Component {
        &self.component
    }

    /// Hardware changes it applies.
    #[must_use]
    pub const fn modifier(&self) -> &HardwareModifier {
        &self.hardware_modifier
    }
}

/// A component that fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Hardpoint {
    hardpoint_shooter: HardpointShooter,
    component: Component,
}

impl Hardpoint {
    /// A hardpoint.
    #[must_use]
    pub const fn new(component: Component, shooter: HardpointShooter) -> Self {
        Self {
            hardpoint_shooter: shooter,
            component,
        }
    }

    /// Physical part.
    #[must_use]
    pub const fn details(&self) -> &Component {
        &self.component
    }

    /// Firing behaviour.
    #[must_use]
    pub const fn shooter(&self) -> &HardpointShooter {
        &self.hardpoint_shooter
    }

    pub(crate) const fn shooter_mut(&mut self) -> &mut HardpointShooter {
        &mut self.hardpoint_shooter
    }
}

/// A hardpoint with its rotation on the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientedHardpoint {
    hardpoint: Hardpoint,
    orientation: ComponentOrientation,
}

impl OrientedHardpoint {
    /// A rotated hardpoint.
    #[must_use]
    pub const fn new(orientation: ComponentOrientation, hardpoint: Hardpoint) -> Self {
        Self {
            hardpoint,
            orientation,
        }
    }

    /// The hardpoint.
    #[must_use]
    pub const fn oriented_hardpoint(&self) -> &Hardpoint {
        &self.hardpoint
    }

    /// Its rotation.
    #[must_use]
    pub const fn hardpoint_orientation(&self) -> ComponentOrientation {
        self.orientation
    }

    pub(crate) const fn hardpoint_mut(&mut self) -> &mut Hardpoint {
        &mut self.hardpoint
    }
}

/// A propulsion component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thruster {
    component: Component,
    power: i32,
}

impl Thruster {
    /// A thruster.
    #[must_use]
    pub const fn new(component: Component, power: i32) -> Self {
        Self { component, power }
    }

    /// Physical part.
    #[must_use]
    pub const fn details(&self) -> &Component {
        &self.component
    }

    /// Engine power.
    #[must_use]
    pub const fn power(&self) -> i32 {
        self.power
    }
}
