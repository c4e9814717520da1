//! Integer angles.
//!
//! A full circle is 3,600,000 units (10,000 per degree), chosen so the six
//! facings fall on exact values. Angles are measured from world +x towards +y.

use std::f32::consts::TAU;

use crate::hex::HexFacing;

/// An angle in fixed units.
pub type FixedAngle = i32;

/// One sixth of pi (thirty degrees).
pub const SIXTH_PI: FixedAngle = 300_000;
/// Half pi.
pub const HALF_PI: FixedAngle = SIXTH_PI * 3;
/// Pi.
pub const PI: FixedAngle = SIXTH_PI * 6;
/// A full turn.
pub const TWO_PI: FixedAngle = SIXTH_PI * 12;

/// Angle of each facing, indexed by facing.
pub const FACING_ANGLES: [FixedAngle; 6] = [
    SIXTH_PI * 9,
    SIXTH_PI * 11,
    SIXTH_PI,
    SIXTH_PI * 3,
    SIXTH_PI * 5,
    SIXTH_PI * 7,
];

/// Whole degrees to fixed units.
#[must_use]
pub const fn degrees_to_fixed_angle(degrees: i16) -> FixedAngle {
    degrees as i32 * 10_000
}

/// The angle a facing points at.
#[must_use]
pub const fn fixed_angle_from_facing(facing: HexFacing) -> FixedAngle {
    FACING_ANGLES[facing.index() as usize]
}

/// The facing an exact facing angle points at, if it is one.
#[must_use]
pub fn facing_from_fixed_angle(angle: FixedAngle) -> Option<HexFacing> {
    let a = angle.rem_euclid(TWO_PI);
    FACING_ANGLES
        .iter()
        .position(|f| *f == a)
        .map(|i| HexFacing::ALL[i])
}

/// Fixed units to radians in `[0, 2pi)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fixed_angle_to_radians(angle: FixedAngle) -> f32 {
    angle.rem_euclid(TWO_PI) as f32 * TAU / TWO_PI as f32
}

/// Radians to fixed units in `[0, TWO_PI)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn radians_to_fixed_angle(radians: f32) -> FixedAngle {
    let a = (radians.rem_euclid(TAU) * TWO_PI as f32 / TAU).round() as i32;
    a.rem_euclid(TWO_PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_angles_round_trip() {
        for f in HexFacing::ALL {
            assert_eq!(facing_from_fixed_angle(fixed_angle_from_facing(f)), Some(f));
        }
        assert_eq!(facing_from_fixed_angle(12_345), None);
        assert_eq!(facing_from_fixed_angle(SIXTH_PI + TWO_PI), Some(HexFacing::Tile2));
    }

    #[test]
    fn test_degrees() {
        assert_eq!(degrees_to_fixed_angle(30), SIXTH_PI);
        assert_eq!(degrees_to_fixed_angle(-90), -HALF_PI);
    }

    #[test]
    fn test_radian_conversion() {
        let r = fixed_angle_to_radians(PI);
        assert!((r - std::f32::consts::PI).abs() < 1e-5);
        assert_eq!(radians_to_fixed_angle(std::f32::consts::FRAC_PI_2), HALF_PI);
        assert_eq!(radians_to_fixed_angle(-std::f32::consts::FRAC_PI_2), SIXTH_PI * 9);
    }
}
