//! The six tile facings and turn directions.

use serde::{Deserialize, Serialize};

/// One of the six neighbour directions of a tile.
///
/// Facing 0 points "up" (decreasing row) and the index increases clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum HexFacing {
    /// Up.
    #[default]
    Tile0 = 0,
    /// Upper right.
    Tile1 = 1,
    /// Lower right.
    Tile2 = 2,
    /// Down.
    Tile3 = 3,
    /// Lower left.
    Tile4 = 4,
    /// Upper left.
    Tile5 = 5,
}

impl HexFacing {
    /// All facings in index order.
    pub const ALL: [HexFacing; 6] = [
        HexFacing::Tile0,
        HexFacing::Tile1,
        HexFacing::Tile2,
        HexFacing::Tile3,
        HexFacing::Tile4,
        HexFacing::Tile5,
    ];

    /// Facing for any integer, taken modulo 6.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub const fn from_index(i: i32) -> Self {
        Self::ALL[i.rem_euclid(6) as usize]
    }

    /// Index 0..=5.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The facing after `turns` clockwise steps (negative turns go the other way).
    #[must_use]
    pub const fn turned(self, turns: i32) -> Self {
        Self::from_index(self as i32 + turns)
    }

    /// The facing pointing back the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.turned(3)
    }
}

impl From<HexFacing> for u8 {
    fn from(f: HexFacing) -> Self {
        f.index()
    }
}

impl TryFrom<u8> for HexFacing {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value < 6 {
            Ok(Self::from_index(i32::from(value)))
        } else {
            Err(format!("facing {value} is not in 0..=5"))
        }
    }
}

/// Rotation sense for turning machines.
///
/// Encoded in programs as `direction % 2`: odd values turn clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    /// Decreasing facing index.
    CounterClockwise = 0,
    /// Increasing facing index.
    Clockwise = 1,
}

impl TurnDirection {
    /// Decode a program value.
    #[must_use]
    pub const fn from_value(v: u16) -> Self {
        if v % 2 == 1 {
            TurnDirection::Clockwise
        } else {
            TurnDirection::CounterClockwise
        }
    }

    /// Program encoding of this direction.
    #[must_use]
    pub const fn value(self) -> u16 {
        self as u16
    }

    /// +1 for clockwise, -1 otherwise.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            TurnDirection::Clockwise => 1,
            TurnDirection::CounterClockwise => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turning_wraps() {
        assert_eq!(HexFacing::Tile5.turned(1), HexFacing::Tile0);
        assert_eq!(HexFacing::Tile0.turned(-1), HexFacing::Tile5);
        assert_eq!(HexFacing::Tile2.turned(13), HexFacing::Tile3);
    }

    #[test]
    fn test_opposite() {
        for f in HexFacing::ALL {
            assert_eq!(f.opposite().opposite(), f);
            assert_ne!(f.opposite(), f);
        }
        assert_eq!(HexFacing::Tile1.opposite(), HexFacing::Tile4);
    }

    #[test]
    fn test_facing_rejects_out_of_range() {
        assert!(HexFacing::try_from(6).is_err());
        assert_eq!(HexFacing::try_from(4), Ok(HexFacing::Tile4));
    }

    #[test]
    fn test_direction_parity() {
        assert_eq!(TurnDirection::from_value(3), TurnDirection::Clockwise);
        assert_eq!(TurnDirection::from_value(8), TurnDirection::CounterClockwise);
    }
}
