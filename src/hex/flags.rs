//! Tile content flags.
//!
//! Each tile stores one byte: the low nibble says what occupies it, bits 4..=6
//! hold the accumulated sun strength and the top bit marks tiles that are not
//! part of the board (suns sit on such tiles).

/// The per-tile content byte.
pub type HexContentFlags = u8;

/// A machine occupies the tile.
pub const BOT: HexContentFlags = 0x01;
/// An asteroid occupies the tile.
pub const ASTEROID: HexContentFlags = 0x02;
/// A sun occupies the tile.
pub const SUN: HexContentFlags = 0x04;
/// The tile is claimed by a machine moving onto it.
pub const RESERVED: HexContentFlags = 0x08;
/// Accumulated sun strength, 0..=7.
pub const SUN_STRENGTH: HexContentFlags = 0x70;
/// The tile is not part of the board.
pub const OFF_BOARD: HexContentFlags = 0x80;

/// Everything except the sun strength bits.
pub const TILE_VALUE_MASK: HexContentFlags = !SUN_STRENGTH;

/// Strongest sun strength a tile can accumulate.
pub const MAX_SUN_STRENGTH: u8 = 7;

/// Sun strength packed into its flag bits.
#[must_use]
pub const fn sun_strength_as_flags(strength: u8) -> HexContentFlags {
    (strength << 4) & SUN_STRENGTH
}

/// Sun strength held in a tile's flags.
#[must_use]
pub const fn sun_strength(f: HexContentFlags) -> u8 {
    (f & SUN_STRENGTH) >> 4
}

/// True for tiles that are not part of the board.
#[must_use]
pub const fn is_off_board_tile(f: HexContentFlags) -> bool {
    f & OFF_BOARD != 0
}

/// True if a sun sits on the tile.
#[must_use]
pub const fn is_sun_tile(f: HexContentFlags) -> bool {
    f & SUN != 0
}

/// True if a machine sits on the tile.
#[must_use]
pub const fn is_bot_on_tile(f: HexContentFlags) -> bool {
    f & BOT != 0
}

/// True if an asteroid sits on the tile.
#[must_use]
pub const fn is_asteroid_on_tile(f: HexContentFlags) -> bool {
    f & ASTEROID != 0
}

/// True if the tile is occupied or claimed.
#[must_use]
pub const fn is_reserved_tile(f: HexContentFlags) -> bool {
    f & (BOT | ASTEROID | RESERVED) != 0
}

/// True for board tiles with no occupant and no claim on them.
#[must_use]
pub const fn is_empty_and_unreserved_tile(f: HexContentFlags) -> bool {
    f & TILE_VALUE_MASK == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_strength_packing() {
        for s in 0..=MAX_SUN_STRENGTH {
            assert_eq!(sun_strength(sun_strength_as_flags(s)), s);
        }
        assert_eq!(sun_strength(BOT | sun_strength_as_flags(5)), 5);
    }

    #[test]
    fn test_sunlit_empty_tile_is_still_empty() {
        let f = sun_strength_as_flags(3);
        assert!(is_empty_and_unreserved_tile(f));
        assert!(!is_reserved_tile(f));
    }

    #[test]
    fn test_occupants_reserve() {
        assert!(is_reserved_tile(BOT));
        assert!(is_reserved_tile(ASTEROID));
        assert!(is_reserved_tile(RESERVED));
        assert!(!is_empty_and_unreserved_tile(RESERVED));
        assert!(!is_empty_and_unreserved_tile(OFF_BOARD));
    }
}
