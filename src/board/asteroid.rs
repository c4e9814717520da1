//! Asteroids and suns: the board's fixed scenery.

use serde::{Deserialize, Serialize};

use crate::error::{BlueError, BlueResult};
use crate::hex::HexCoord;
use crate::hex::flags::MAX_SUN_STRENGTH;
use crate::tradables::{Amount, TradableType};

/// A body of one ore type that miners extract by volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AsteroidRecord", into = "AsteroidRecord")]
pub struct Asteroid {
    xy: HexCoord,
    ore: TradableType,
    volume: u16,
    on_board: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AsteroidRecord {
    board_xy: HexCoord,
    ore_type: TradableType,
    volume: u16,
}

impl TryFrom<AsteroidRecord> for Asteroid {
    type Error = BlueError;

    fn try_from(r: AsteroidRecord) -> BlueResult<Self> {
        Self::new(r.ore_type, r.volume, r.board_xy)
    }
}

impl From<Asteroid> for AsteroidRecord {
    fn from(a: Asteroid) -> Self {
        Self { board_xy: a.xy, ore_type: a.ore, volume: a.volume }
    }
}

impl Asteroid {
    /// An asteroid of `volume` units of volume of `ore` at `xy`.
    ///
    /// # Errors
    ///
    /// `ore` must be one of the four ores.
    pub fn new(ore: TradableType, volume: u16, xy: HexCoord) -> BlueResult<Self> {
        if !ore.is_ore() {
            return Err(BlueError::Scenario(format!("Asteroid at {xy} is made of {}, not ore.", ore.name())));
        }
        Ok(Self { xy, ore, volume, on_board: true })
    }

    /// Tile.
    #[must_use]
    pub const fn board_xy(&self) -> HexCoord {
        self.xy
    }

    /// Ore type.
    #[must_use]
    pub const fn ore_type(&self) -> TradableType {
        self.ore
    }

    /// Volume left.
    #[must_use]
    pub const fn volume(&self) -> u16 {
        self.volume
    }

    /// False once the asteroid has been mined out and cleared away.
    #[must_use]
    pub const fn is_on_board(&self) -> bool {
        self.on_board
    }

    pub(crate) const fn set_as_removed_from_board(&mut self) {
        self.on_board = false;
    }

    /// Remove up to `volume` and return the whole units of ore it held.
    ///
    /// Requests smaller than one unit extract nothing. Volume that does not
    /// make up a whole unit is lost.
    pub fn try_extract_ore_volume(&mut self, volume: u16) -> Amount {
        if volume < self.ore.unit_volume() {
            return Amount::default();
        }
        let taken = self.volume.min(volume);
        self.volume -= taken;
        let units = self.ore.max_units_in_volume(u32::from(taken));
        Amount::of(self.ore, i16::try_from(units).unwrap_or(i16::MAX))
    }
}

/// A sun. Its tile is off the board; its light charges solar panels nearby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Sun {
    /// Tile.
    pub board_xy: HexCoord,
    /// Reach and brightness, `1..=7`.
    pub strength: u8,
}

impl Sun {
    /// A sun at `xy`.
    ///
    /// # Errors
    ///
    /// Strength must be in `1..=7`.
    pub fn new(xy: HexCoord, strength: u8) -> BlueResult<Self> {
        if strength == 0 || strength > MAX_SUN_STRENGTH {
            return Err(BlueError::Scenario(format!("Sun at {xy} has strength {strength}.")));
        }
        Ok(Self { board_xy: xy, strength })
    }
}
