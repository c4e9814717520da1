//! Offset ("odd-q") tile coordinates.

#![allow(clippy::cast_sign_loss, clippy::cast_possible_wrap, clippy::cast_possible_truncation)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tile coordinate in the public "odd-q" offset layout.
///
/// Odd columns sit half a tile lower than even columns. Validity is relative to
/// a grid: a coordinate only means something alongside a grid of known size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct HexCoord {
    /// Column.
    pub x: i8,
    /// Row.
    pub y: i8,
}

impl HexCoord {
    /// Create a coordinate from a column and row.
    #[must_use]
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// The coordinate used to mean "no tile". It packs to `0xFFFF`.
    #[must_use]
    pub const fn invalid() -> Self {
        Self { x: -1, y: -1 }
    }

    /// True unless either component is negative.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    /// Pack into 16 bits: x in the low byte, y in the high byte.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        (self.x as u8 as u16) | ((self.y as u8 as u16) << 8)
    }

    /// Inverse of [`HexCoord::to_u16`].
    #[must_use]
    pub const fn from_u16(packed: u16) -> Self {
        Self {
            x: (packed & 0xFF) as u8 as i8,
            y: (packed >> 8) as u8 as i8,
        }
    }

    /// Axial `(q, r)` pair for this offset coordinate.
    #[must_use]
    pub const fn to_axial(self) -> (i32, i32) {
        let col = self.x as i32;
        let row = self.y as i32;
        (col, row - (col - (col & 1)) / 2)
    }

    /// Offset coordinate for an axial `(q, r)` pair, or the invalid coordinate
    /// when the result cannot be represented.
    #[must_use]
    pub fn from_axial(q: i32, r: i32) -> Self {
        let col = q;
        let row = r + (q - (q & 1)) / 2;
        match (i8::try_from(col), i8::try_from(row)) {
            (Ok(x), Ok(y)) => Self { x, y },
            _ => Self::invalid(),
        }
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_puts_x_in_low_byte() {
        let c = HexCoord::new(0x34, 0x12);
        assert_eq!(c.to_u16(), 0x1234);
        assert_eq!(HexCoord::from_u16(0x1234), c);
    }

    #[test]
    fn test_invalid_packs_to_all_ones() {
        assert_eq!(HexCoord::invalid().to_u16(), 0xFFFF);
        assert_eq!(HexCoord::from_u16(0xFFFF), HexCoord::invalid());
        assert!(!HexCoord::invalid().is_valid());
    }

    #[test]
    fn test_packing_preserves_large_components() {
        for (x, y) in [(0, 0), (0, 100), (100, 0), (101, 125)] {
            let c = HexCoord::new(x, y);
            assert_eq!(HexCoord::from_u16(c.to_u16()), c);
        }
    }

    #[test]
    fn test_axial_conversion() {
        assert_eq!(HexCoord::new(0, 0).to_axial(), (0, 0));
        assert_eq!(HexCoord::new(2, 0).to_axial(), (2, -1));
        assert_eq!(HexCoord::new(1, 1).to_axial(), (1, 1));
        assert_eq!(HexCoord::new(3, 1).to_axial(), (3, 0));
        for x in 0..10 {
            for y in 0..10 {
                let c = HexCoord::new(x, y);
                let (q, r) = c.to_axial();
                assert_eq!(HexCoord::from_axial(q, r), c);
            }
        }
    }

    #[test]
    fn test_unrepresentable_axial_is_invalid() {
        assert_eq!(HexCoord::from_axial(500, 0), HexCoord::invalid());
    }
}
