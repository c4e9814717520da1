//! A short code summarising what a blueprint is built for.

use std::fmt;

use super::Blueprint;
use super::component::ComponentCategory;
use crate::error::{BlueError, BlueResult};

/// Counts of components by role, shown as `"<total>-<off><def><ind><thr>"`
/// with each count encoded as a letter from `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    total: u8,
    offensive: u8,
    defensive: u8,
    industrial: u8,
    propulsion: u8,
    dual_use: u8,
}

impl Classification {
    /// Classify a blueprint.
    ///
    /// # Errors
    ///
    /// Hardpoints must be offensive, defensive or industrial, and
    /// softpoints may not be propulsion.
    pub fn of(bp: &Blueprint) -> BlueResult<Self> {
        let mut c = Self::default();
        for hp in bp.hardpoints() {
            match hp.oriented_hardpoint().details().categorisation() {
                ComponentCategory::Offensive => c.offensive += 1,
                ComponentCategory::Defensive => c.defensive += 1,
                ComponentCategory::Industrial => c.industrial += 1,
                ComponentCategory::DualUse | ComponentCategory::Propulsion => {
                    return Err(BlueError::Blueprint(
                        "Hardpoint which was not offensive/defensive/industrial.".into(),
                    ));
                }
            }
        }
        for sp in bp.softpoints() {
            match sp.details().categorisation() {
                ComponentCategory::Offensive => c.offensive += 1,
                ComponentCategory::Defensive => c.defensive += 1,
                ComponentCategory::Industrial => c.industrial += 1,
                ComponentCategory::DualUse => c.dual_use += 1,
                ComponentCategory::Propulsion => {
                    return Err(BlueError::Blueprint(
                        "Softpoint which was not offensive/defensive/industrial/dual-use.".into(),
                    ));
                }
            }
        }
        c.propulsion = u8::try_from(bp.thrusters_count()).unwrap_or(u8::MAX);
        c.total = c.offensive + c.defensive + c.industrial + c.propulsion + c.dual_use;
        Ok(c)
    }

    /// Number of components with the given role.
    #[must_use]
    pub const fn component_count(&self, category: ComponentCategory) -> u16 {
        let n = match category {
            ComponentCategory::Offensive => self.offensive,
            ComponentCategory::Defensive => self.defensive,
            ComponentCategory::Industrial => self.industrial,
            ComponentCategory::Propulsion => self.propulsion,
            ComponentCategory::DualUse => self.dual_use,
        };
        n as u16
    }

    /// Every component.
    #[must_use]
    pub const fn total_components_count(&self) -> u16 {
        self.total as u16
    }
}

fn letter(n: u8) -> char {
    char::from(b'A'.saturating_add(n))
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}{}{}{}",
            letter(self.total),
            letter(self.offensive),
            letter(self.defensive),
            letter(self.industrial),
            letter(self.propulsion)
        )
    }
}
