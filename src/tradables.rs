//! Tradable resources: ores, refined goods and the holds that carry them.
//!
//! Ores are mined from asteroids and take ten units of volume each. Refining
//! one unit of ore produces one unit of each of the four refined goods, which
//! take a single unit of volume each.

mod amount;
mod cargohold;

use serde::{Deserialize, Serialize};

use crate::constants::REFINING_FACTORS;

pub use amount::Amount;
pub use cargohold::{Cargohold, MAX_CONTAINER_VOLUME};

/// Number of distinct tradable types.
pub const TRADABLE_TYPES_COUNT: usize = 8;

/// The tradable types, ordered roughly from cheapest to most valuable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum TradableType {
    /// Ore rich in titanium and scandium.
    Panguite = 0,
    /// Iron-nickel ore.
    Kamacite = 1,
    /// High nickel iron ore.
    Ataxite = 2,
    /// Silicate ore.
    Chondrite = 3,
    /// Refined metals.
    Metals = 4,
    /// Refined non-metals.
    NonMetals = 5,
    /// Refined semi-metals.
    SemiMetals = 6,
    /// Refined alkalis.
    Alkalis = 7,
}

impl TradableType {
    /// Every type, in index order.
    pub const ALL: [Self; TRADABLE_TYPES_COUNT] = [
        Self::Panguite,
        Self::Kamacite,
        Self::Ataxite,
        Self::Chondrite,
        Self::Metals,
        Self::NonMetals,
        Self::SemiMetals,
        Self::Alkalis,
    ];

    /// The four ores, in index order.
    pub const ORES: [Self; 4] = [Self::Panguite, Self::Kamacite, Self::Ataxite, Self::Chondrite];

    /// The type at index `i`, if any.
    #[must_use]
    pub fn from_index(i: u16) -> Option<Self> {
        Self::ALL.get(usize::from(i)).copied()
    }

    /// Index of this type in an amount array.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Display and JSON name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Panguite => "Panguite",
            Self::Kamacite => "Kamacite",
            Self::Ataxite => "Ataxite",
            Self::Chondrite => "Chondrite",
            Self::Metals => "Metals",
            Self::NonMetals => "NonMetals",
            Self::SemiMetals => "SemiMetals",
            Self::Alkalis => "Alkalis",
        }
    }

    /// Cargo volume taken by one unit.
    #[must_use]
    pub const fn unit_volume(self) -> u16 {
        if self.is_ore() { 10 } else { 1 }
    }

    /// True for the four mineable ores.
    #[must_use]
    pub const fn is_ore(self) -> bool {
        (self as u8) < (Self::Metals as u8)
    }

    /// Volume of `n` units.
    #[must_use]
    pub const fn volume_of_n_units(self, n: u32) -> u32 {
        n * self.unit_volume() as u32
    }

    /// Most whole units that fit in `volume`.
    #[must_use]
    pub const fn max_units_in_volume(self, volume: u32) -> u32 {
        volume / self.unit_volume() as u32
    }
}

/// What refining `n` units of an ore yields: `n` units of each refined good.
///
/// Anything other than an ore refines to nothing.
#[must_use]
pub fn refine(ore: TradableType, n: i16) -> Amount {
    let mut a = Amount::default();
    if ore.is_ore() {
        for t in [
            TradableType::Metals,
            TradableType::NonMetals,
            TradableType::SemiMetals,
            TradableType::Alkalis,
        ] {
            a.set(t, n.max(0));
        }
    }
    a
}

/// Multiplier applied to a machine's refine period for each ore. Harder ores
/// take longer.
#[must_use]
pub const fn refine_period_factor(ore: TradableType) -> f32 {
    REFINING_FACTORS[ore.index() % REFINING_FACTORS.len()]
}

/// A credit balance of tradable units.
///
/// Debits clamp at zero and credits saturate at `i16::MAX`; neither wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tradables {
    amount: Amount,
}

impl Tradables {
    /// Wrap an amount.
    #[must_use]
    pub const fn new(amount: Amount) -> Self {
        Self { amount }
    }

    /// The units held.
    #[must_use]
    pub const fn amount(&self) -> &Amount {
        &self.amount
    }

    /// Units of one type.
    #[must_use]
    pub const fn count_of(&self, t: TradableType) -> i16 {
        self.amount.get(t)
    }

    /// True when every type covers the matching cost.
    #[must_use]
    pub fn can_afford(&self, cost: &Amount) -> bool {
        TradableType::ALL
            .iter()
            .all(|&t| cost.get(t) <= self.amount.get(t))
    }

    /// Remove `a`, clamping each type at zero.
    pub fn debit(&mut self, a: &Amount) {
        for t in TradableType::ALL {
            let have = self.amount.get(t);
            self.amount.set(t, (have - a.get(t)).max(0));
        }
    }

    /// Add `a`, saturating each type.
    pub fn credit(&mut self, a: &Amount) {
        self.amount += *a;
    }

    /// Cargo volume of the held units.
    #[must_use]
    pub fn volume(&self) -> u16 {
        self.amount.volume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_volumes() {
        for t in TradableType::ORES {
            assert!(t.is_ore());
            assert_eq!(t.unit_volume(), 10);
        }
        assert!(!TradableType::Metals.is_ore());
        assert_eq!(TradableType::Alkalis.unit_volume(), 1);
        assert_eq!(TradableType::Kamacite.max_units_in_volume(35), 3);
        assert_eq!(TradableType::from_index(8), None);
        assert_eq!(TradableType::from_index(5), Some(TradableType::NonMetals));
    }

    #[test]
    fn test_refining_yields_every_refined_good() {
        let a = refine(TradableType::Ataxite, 3);
        assert_eq!(a.get(TradableType::Metals), 3);
        assert_eq!(a.get(TradableType::Alkalis), 3);
        assert_eq!(a.get(TradableType::Ataxite), 0);
        assert_eq!(a.volume(), 12);
        assert!(refine(TradableType::Metals, 3).is_empty());
        assert!((refine_period_factor(TradableType::Chondrite) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_debit_and_credit() {
        let mut t = Tradables::new(Amount::of(TradableType::Metals, 5));
        assert!(t.can_afford(&Amount::of(TradableType::Metals, 5)));
        assert!(!t.can_afford(&Amount::of(TradableType::Metals, 6)));
        assert!(!t.can_afford(&Amount::of(TradableType::Ataxite, 1)));

        t.debit(&Amount::of(TradableType::Metals, 3));
        assert_eq!(t.count_of(TradableType::Metals), 2);

        t.debit(&Amount::of(TradableType::Metals, 9));
        assert_eq!(t.count_of(TradableType::Metals), 0);
        t.credit(&Amount::of(TradableType::Metals, 2));

        t.credit(&Amount::of(TradableType::Metals, i16::MAX));
        assert_eq!(t.count_of(TradableType::Metals), i16::MAX);
    }

    #[test]
    fn test_tradables_json_shape() {
        let t = Tradables::new(Amount::of(TradableType::Chondrite, 2));
        let v = serde_json::to_value(t).unwrap();
        assert_eq!(v["amount"]["Chondrite"], 2);
        assert_eq!(v["amount"]["Panguite"], 0);
        let back: Tradables = serde_json::from_value(v).unwrap();
        assert_eq!(back, t);
    }
}
