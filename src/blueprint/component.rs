//! The physical part common to every hardpoint, softpoint and thruster.

use serde::{Deserialize, Serialize};

use crate::error::{BlueError, BlueResult};
use crate::fixed_angle::{FixedAngle, HALF_PI, PI};
use crate::tradables::Amount;

/// What role a component plays. Used for machine classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CategoryRecord", into = "CategoryRecord")]
pub enum ComponentCategory {
    /// Weapons and weapon boosters.
    Offensive,
    /// Armour, repairers and resistances.
    Defensive,
    /// Mining, refining, cargo and building.
    Industrial,
    /// Thrusters.
    Propulsion,
    /// Anything else.
    DualUse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryRecord {
    #[serde(rename = "component-category")]
    name: String,
}

impl ComponentCategory {
    /// Persisted name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Offensive => "offensive",
            Self::Defensive => "defensive",
            Self::Industrial => "industrial",
            Self::Propulsion => "propulsion",
            Self::DualUse => "dualuse",
        }
    }

    /// Parse a persisted name.
    ///
    /// # Errors
    ///
    /// Fails for unknown names.
    pub fn from_name(name: &str) -> BlueResult<Self> {
        [
            Self::Offensive,
            Self::Defensive,
            Self::Industrial,
            Self::Propulsion,
            Self::DualUse,
        ]
        .into_iter()
        .find(|c| c.name() == name)
        .ok_or_else(|| BlueError::Component(format!("Unknown component category '{name}'.")))
    }
}

impl TryFrom<CategoryRecord> for ComponentCategory {
    type Error = BlueError;

    fn try_from(r: CategoryRecord) -> BlueResult<Self> {
        Self::from_name(&r.name)
    }
}

impl From<ComponentCategory> for CategoryRecord {
    fn from(c: ComponentCategory) -> Self {
        Self {
            name: c.name().to_string(),
        }
    }
}

/// Rotation of a hardpoint relative to its machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "OrientationRecord", into = "OrientationRecord")]
pub enum ComponentOrientation {
    /// Facing forward.
    Rotated0,
    /// A quarter turn.
    Rotated90,
    /// Facing rearward.
    Rotated180,
    /// Three quarter turns.
    Rotated270,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrientationRecord {
    #[serde(rename = "component-orientation")]
    name: String,
}

impl ComponentOrientation {
    /// Persisted name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rotated0 => "rotated0",
            Self::Rotated90 => "rotated90",
            Self::Rotated180 => "rotated180",
            Self::Rotated270 => "rotated270",
        }
    }

    /// The rotation as an angle.
    #[must_use]
    pub const fn angle(self) -> FixedAngle {
        match self {
            Self::Rotated0 => 0,
            Self::Rotated90 => HALF_PI,
            Self::Rotated180 => PI,
            Self::Rotated270 => PI + HALF_PI,
        }
    }
}

impl TryFrom<OrientationRecord> for ComponentOrientation {
    type Error = BlueError;

    fn try_from(r: OrientationRecord) -> BlueResult<Self> {
        [Self::Rotated0, Self::Rotated90, Self::Rotated180, Self::Rotated270]
            .into_iter()
            .find(|o| o.name() == r.name)
            .ok_or_else(|| {
                BlueError::Component(format!("Unknown component orientation '{}'.", r.name))
            })
    }
}

impl From<ComponentOrientation> for OrientationRecord {
    fn from(o: ComponentOrientation) -> Self {
        Self {
            name: o.name().to_string(),
        }
    }
}

/// A named physical part with mass, hit points and a build cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ComponentRecord", into = "ComponentRecord")]
pub struct Component {
    name: String,
    hull_hitpoints: i32,
    mass: i32,
    category: ComponentCategory,
    build_cost: Amount,
    build_complexity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ComponentRecord {
    component_name: String,
    hull_hitpoints: i32,
    mass: i32,
    category: ComponentCategory,
    build_cost: Amount,
    build_complexity: f32,
}

impl TryFrom<ComponentRecord> for Component {
    type Error = BlueError;

    fn try_from(r: ComponentRecord) -> BlueResult<Self> {
        Self::new(
            r.component_name,
            r.hull_hitpoints,
            r.mass,
            r.category,
            r.build_cost,
            r.build_complexity,
        )
    }
}

impl From<Component> for ComponentRecord {
    fn from(c: Component) -> Self {
        Self {
            component_name: c.name,
            hull_hitpoints: c.hull_hitpoints,
            mass: c.mass,
            category: c.category,
            build_cost: c.build_cost,
            build_complexity: c.build_complexity,
        }
    }
}

impl Component {
    /// A component.
    ///
    /// # Errors
    ///
    /// The name must be non-empty and the complexity non-negative.
    pub fn new(
        name: impl Into<String>,
        hull_hitpoints: i32,
        mass: i32,
        category: ComponentCategory,
        build_cost: Amount,
        build_complexity: f32,
    ) -> BlueResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(BlueError::Component("Component name cannot be empty.".into()));
        }
        if build_complexity.is_nan() || build_complexity < 0.0 {
            return Err(BlueError::Component(format!(
                "Component '{name}' has a negative build complexity."
            )));
        }
        Ok(Self {
            name,
            hull_hitpoints,
            mass,
            category,
            build_cost,
            build_complexity,
        })
    }

    /// Unique type name.
    #[must_use]
    pub fn component_name(&self) -> &str {
        &self.name
    }

    /// Hull contributed.
    #[must_use]
    pub const fn hull_hitpoints(&self) -> i32 {
        self.hull_hitpoints
    }

    /// Mass contributed.
    #[must_use]
    pub const fn mass(&self) -> i32 {
        self.mass
    }

    /// Role.
    #[must_use]
    pub const fn categorisation(&self) -> ComponentCategory {
        self.category
    }

    /// Material needed to build it.
    #[must_use]
    pub const fn build_cost(&self) -> &Amount {
        &self.build_cost
    }

    /// Zero is simple; higher values slow building.
    #[must_use]
    pub const fn build_complexity(&self) -> f32 {
        self.build_complexity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tradables::TradableType;

    #[test]
    fn test_component_validation() {
        let cost = Amount::of(TradableType::Chondrite, 123);
        assert!(Component::new("", 1, 1, ComponentCategory::Industrial, cost, 1.0).is_err());
        assert!(Component::new("X", 1, 1, ComponentCategory::Industrial, cost, -1.0).is_err());
        let c = Component::new("FOO", 1234, 2000, ComponentCategory::Industrial, cost, 2.3).unwrap();
        assert_eq!(c.component_name(), "FOO");
        assert_eq!(c.mass(), 2000);
    }

    #[test]
    fn test_component_json_keys() {
        let c = Component::new(
            "BFG",
            123,
            45,
            ComponentCategory::Offensive,
            Amount::of(TradableType::Kamacite, 100),
            3.1,
        )
        .unwrap();
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["component-name"], "BFG");
        assert_eq!(v["hull-hitpoints"], 123);
        assert_eq!(v["category"]["component-category"], "offensive");
        assert_eq!(v["build-cost"]["Kamacite"], 100);
        let back: Component = serde_json::from_value(v).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_orientation_angles() {
        assert_eq!(ComponentOrientation::Rotated0.angle(), 0);
        assert_eq!(ComponentOrientation::Rotated270.angle(), 3 * HALF_PI);
        let v = serde_json::to_value(ComponentOrientation::Rotated90).unwrap();
        assert_eq!(v["component-orientation"], "rotated90");
    }

    #[test]
    fn test_unknown_category() {
        assert!(ComponentCategory::from_name("bogus").is_err());
        assert_eq!(
            ComponentCategory::from_name("dualuse").unwrap(),
            ComponentCategory::DualUse
        );
    }
}
