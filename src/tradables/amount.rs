//! A non-negative count of each tradable type.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use super::{TRADABLE_TYPES_COUNT, TradableType};
use crate::error::{BlueError, BlueResult};

/// Units of each tradable type. Every count is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "AmountRecord", into = "AmountRecord")]
pub struct Amount {
    units: [i16; TRADABLE_TYPES_COUNT],
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[allow(non_snake_case)]
struct AmountRecord {
    Panguite: i16,
    Kamacite: i16,
    Ataxite: i16,
    Chondrite: i16,
    Metals: i16,
    NonMetals: i16,
    SemiMetals: i16,
    Alkalis: i16,
}

impl TryFrom<AmountRecord> for Amount {
    type Error = BlueError;

    fn try_from(r: AmountRecord) -> BlueResult<Self> {
        Self::from_units([
            r.Panguite,
            r.Kamacite,
            r.Ataxite,
            r.Chondrite,
            r.Metals,
            r.NonMetals,
            r.SemiMetals,
            r.Alkalis,
        ])
    }
}

impl From<Amount> for AmountRecord {
    fn from(a: Amount) -> Self {
        let [p, k, at, c, m, n, s, al] = a.units;
        Self {
            Panguite: p,
            Kamacite: k,
            Ataxite: at,
            Chondrite: c,
            Metals: m,
            NonMetals: n,
            SemiMetals: s,
            Alkalis: al,
        }
    }
}

impl Amount {
    /// Build from per-type counts.
    ///
    /// # Errors
    ///
    /// Fails if any count is negative.
    pub fn from_units(units: [i16; TRADABLE_TYPES_COUNT]) -> BlueResult<Self> {
        if units.iter().any(|u| *u < 0) {
            return Err(BlueError::Component(
                "An amount cannot be negative.".to_string(),
            ));
        }
        Ok(Self { units })
    }

    /// `n` units of a single type. Negative counts clamp to zero.
    #[must_use]
    pub const fn of(t: TradableType, n: i16) -> Self {
        let mut units = [0; TRADABLE_TYPES_COUNT];
        units[t as usize] = if n < 0 { 0 } else { n };
        Self { units }
    }

    /// Units of `t`.
    #[must_use]
    pub const fn get(&self, t: TradableType) -> i16 {
        self.units[t as usize]
    }

    pub(crate) const fn set(&mut self, t: TradableType, n: i16) {
        self.units[t as usize] = n;
    }

    /// All counts in type order.
    #[must_use]
    pub const fn units(&self) -> &[i16; TRADABLE_TYPES_COUNT] {
        &self.units
    }

    /// True when every count is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.iter().all(|u| *u == 0)
    }

    /// Total cargo volume, capped at `0xFFFF`.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn volume(&self) -> u16 {
        let total: u32 = TradableType::ALL
            .iter()
            .map(|t| t.volume_of_n_units(self.get(*t) as u32))
            .sum();
        total.min(u32::from(u16::MAX)) as u16
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.units.iter_mut().zip(rhs.units) {
            *a = a.saturating_add(b);
        }
    }
}
