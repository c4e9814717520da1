//! Component attachment locations.
//!
//! A machine is laid out on a 10x10 grid of squares. Each component covers
//! 2x2 squares anchored at its attach point `n`, which names square
//! `(n / 10, n % 10)`. Points on the last column (9, 19, ... 79) and those
//! beyond 87 would overhang the grid. Thrusters sit only on the bottom row,
//! 81 to 87.
//!
//! ```text
//!     1 .. 7        top row
//!    10 .. 18
//!      ...
//!    70 .. 78
//!    81 .. 87       thrusters
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BlueError, BlueResult};

/// True if `n` names a square a component may be anchored on.
#[must_use]
pub const fn is_location_number(n: u16) -> bool {
    n > 0 && n < 88 && n % 10 != 9
}

/// A valid component location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "AttachPointRecord", into = "AttachPointRecord")]
pub struct AttachPoint(u16);

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct AttachPointRecord {
    attachpoint: u16,
}

impl TryFrom<AttachPointRecord> for AttachPoint {
    type Error = BlueError;

    fn try_from(r: AttachPointRecord) -> BlueResult<Self> {
        Self::new(r.attachpoint)
    }
}

impl From<AttachPoint> for AttachPointRecord {
    fn from(a: AttachPoint) -> Self {
        Self { attachpoint: a.0 }
    }
}

impl AttachPoint {
    /// An attach point at location `n`.
    ///
    /// # Errors
    ///
    /// Fails unless `n` is a permitted location.
    pub fn new(n: u16) -> BlueResult<Self> {
        if is_location_number(n) {
            Ok(Self(n))
        } else {
            Err(BlueError::Blueprint(format!("Invalid AttachPoint {n}.")))
        }
    }

    /// Location number.
    #[must_use]
    pub const fn location_number(self) -> u16 {
        self.0
    }

    /// True for the bottom-row thruster locations.
    #[must_use]
    pub const fn is_thruster_attachpoint(self) -> bool {
        self.0 > 80 && self.0 < 88
    }

    const fn square(self) -> (u16, u16) {
        (self.0 / 10, self.0 % 10)
    }

    /// True if components at the two points would overlap.
    #[must_use]
    pub const fn conflicts_with(self, other: Self) -> bool {
        let (ax, ay) = self.square();
        let (bx, by) = other.square();
        ax.abs_diff(bx) < 2 && ay.abs_diff(by) < 2
    }
}

impl fmt::Display for AttachPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An attach point restricted to the thruster row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "ThrusterAttachPointRecord", into = "ThrusterAttachPointRecord")]
pub struct ThrusterAttachPoint(AttachPoint);

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ThrusterAttachPointRecord {
    #[serde(rename = "thruster-attachpoint")]
    thruster_attachpoint: u16,
}

impl TryFrom<ThrusterAttachPointRecord> for ThrusterAttachPoint {
    type Error = BlueError;

    fn try_from(r: ThrusterAttachPointRecord) -> BlueResult<Self> {
        Self::new(r.thruster_attachpoint)
    }
}

impl From<ThrusterAttachPoint> for ThrusterAttachPointRecord {
    fn from(a: ThrusterAttachPoint) -> Self {
        Self {
            thruster_attachpoint: a.0.0,
        }
    }
}

impl ThrusterAttachPoint {
    /// A thruster point at location `n`.
    ///
    /// # Errors
    ///
    /// Fails unless `n` is in `81..=87`.
    pub fn new(n: u16) -> BlueResult<Self> {
        let ap = AttachPoint::new(n)?;
        if ap.is_thruster_attachpoint() {
            Ok(Self(ap))
        } else {
            Err(BlueError::Blueprint(format!(
                "Invalid thruster AttachPoint {n}."
            )))
        }
    }

    /// The underlying attach point.
    #[must_use]
    pub const fn attach_point(self) -> AttachPoint {
        self.0
    }

    /// Location number.
    #[must_use]
    pub const fn location_number(self) -> u16 {
        self.0.location_number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_numbers() {
        assert!(!is_location_number(0));
        assert!(is_location_number(1));
        assert!(!is_location_number(9));
        assert!(!is_location_number(79));
        assert!(is_location_number(87));
        assert!(!is_location_number(88));
        assert!(AttachPoint::new(19).is_err());
    }

    #[test]
    fn test_thruster_row() {
        assert!(ThrusterAttachPoint::new(81).is_ok());
        assert!(ThrusterAttachPoint::new(87).is_ok());
        assert!(ThrusterAttachPoint::new(78).is_err());
    }

    #[test]
    fn test_conflicts() {
        let a = AttachPoint::new(11).unwrap();
        assert!(a.conflicts_with(AttachPoint::new(12).unwrap()));
        assert!(a.conflicts_with(AttachPoint::new(22).unwrap()));
        assert!(!a.conflicts_with(AttachPoint::new(13).unwrap()));
        assert!(!a.conflicts_with(AttachPoint::new(31).unwrap()));
    }

    #[test]
    fn test_json_shape() {
        let v = serde_json::to_value(AttachPoint::new(3).unwrap()).unwrap();
        assert_eq!(v, serde_json::json!({ "attachpoint": 3 }));
        let v = serde_json::to_value(ThrusterAttachPoint::new(83).unwrap()).unwrap();
        assert_eq!(v, serde_json::json!({ "thruster-attachpoint": 83 }));
        assert!(serde_json::from_value::<AttachPoint>(serde_json::json!({ "attachpoint": 9 })).is_err());
    }
}
