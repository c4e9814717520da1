//! Everything needed to create a machine.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::instructions::Instructions;

/// A machine's display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineName {
    machine_name: String,
}

impl MachineName {
    /// A name holding `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { machine_name: name.into() }
    }

    /// The name of the `n`th machine built by `parent`.
    #[must_use]
    pub fn child_of(parent: &Self, n: u32) -> Self {
        Self::new(format!("{}.{n}", parent.machine_name))
    }

    /// The name as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.machine_name
    }
}

impl fmt::Display for MachineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.machine_name)
    }
}

/// Name, design, knowledge and boot program of a machine to be created.
///
/// The JSON keys are the save-game ones: `machines-name`,
/// `machines-blueprint`, `known-blueprints`, `boot-code`, `pulse-period` and
/// `hue-shift`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineTemplate {
    /// Display name.
    pub machines_name: MachineName,
    /// What the machine is.
    pub machines_blueprint: Arc<Blueprint>,
    /// Blueprints it can build.
    pub known_blueprints: Vec<Arc<Blueprint>>,
    /// The program it starts with.
    pub boot_code: Instructions,
    /// Presentation pulse period, carried through to children.
    pub pulse_period: f32,
    /// Team colour shift, carried through to children.
    pub hue_shift: u8,
}

impl MachineTemplate {
    /// A template knowing only its own blueprint.
    #[must_use]
    pub fn new(name: MachineName, blueprint: Arc<Blueprint>, boot_code: Instructions) -> Self {
        Self {
            machines_name: name,
            known_blueprints: vec![Arc::clone(&blueprint)],
            machines_blueprint: blueprint,
            boot_code,
            pulse_period: 1.0,
            hue_shift: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::tests::create_test_blueprint;

    #[test]
    fn test_name_json_shape() {
        let n = MachineName::new("Probe");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json, serde_json::json!({ "machine-name": "Probe" }));
        assert_eq!(MachineName::child_of(&n, 2).to_string(), "Probe.2");
    }

    #[test]
    fn test_template_uses_legacy_keys() {
        let bp = Arc::new(create_test_blueprint());
        let code: Instructions = "sense( 1 )\ngoto 1".parse().unwrap();
        let t = MachineTemplate::new(MachineName::new("T"), bp, code);
        let json = serde_json::to_value(&t).unwrap();
        for key in ["machines-name", "machines-blueprint", "known-blueprints", "boot-code", "pulse-period", "hue-shift"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        let back: MachineTemplate = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }
}
