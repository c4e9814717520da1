//! Volume-limited cargo storage.

use serde::{Deserialize, Serialize};

use super::{Amount, TradableType, Tradables};

/// Largest volume a single cargo container may have.
pub const MAX_CONTAINER_VOLUME: u16 = 1000;

/// A machine's hold.
///
/// `used_volume() + free_volume() == total_volume()` always holds. A locked
/// hold refuses transfers to or from other machines.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(missing_copy_implementations)]
pub struct Cargohold {
    contents: Tradables,
    volume: u16,
    locked: bool,
}

impl Cargohold {
    /// An empty unlocked hold of `volume` units, at most
    /// [`MAX_CONTAINER_VOLUME`].
    #[must_use]
    pub const fn new(volume: u16) -> Self {
        Self {
            contents: Tradables::new(Amount::of(TradableType::Panguite, 0)),
            volume: if volume > MAX_CONTAINER_VOLUME { MAX_CONTAINER_VOLUME } else { volume },
            locked: false,
        }
    }

    /// True while the hold refuses external transfers.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock or unlock the hold.
    pub const fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Capacity.
    #[must_use]
    pub const fn total_volume(&self) -> u16 {
        self.volume
    }

    /// Volume taken by the contents.
    #[must_use]
    pub fn used_volume(&self) -> u16 {
        self.contents.volume()
    }

    /// Volume still available.
    #[must_use]
    pub fn free_volume(&self) -> u16 {
        self.volume.saturating_sub(self.used_volume())
    }

    /// The contents.
    #[must_use]
    pub const fn cargo_contents(&self) -> &Tradables {
        &self.contents
    }

    /// Units held of `t`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn count_of(&self, t: TradableType) -> u16 {
        self.contents.count_of(t) as u16
    }

    /// True if the hold contains at least `a`.
    #[must_use]
    pub fn contains_at_least(&self, a: &Amount) -> bool {
        self.contents.can_afford(a)
    }

    /// True if `a` would fit in the free volume.
    #[must_use]
    pub fn has_capacity_for(&self, a: &Amount) -> bool {
        u32::from(a.volume()) <= u32::from(self.free_volume())
    }

    /// Add `a` if it all fits. Nothing is added otherwise.
    pub fn try_add_cargo(&mut self, a: &Amount) -> bool {
        if self.has_capacity_for(a) {
            self.contents.credit(a);
            true
        } else {
            false
        }
    }

    /// Remove `a` if it is all present. Nothing is removed otherwise.
    pub fn try_remove_cargo(&mut self, a: &Amount) -> bool {
        if self.contains_at_least(a) {
            self.contents.debit(a);
            true
        } else {
            false
        }
    }

    /// Discard `a`, clamping at empty.
    pub fn destroy_cargo(&mut self, a: &Amount) {
        let mut clamped = *a;
        for t in TradableType::ALL {
            clamped.set(t, a.get(t).min(self.contents.count_of(t)));
        }
        self.contents.debit(&clamped);
    }

    /// Move `a` into `other`. The caller must have checked both sides.
    pub fn transfer_cargo_to(&mut self, a: &Amount, other: &mut Self) {
        debug_assert!(self.contains_at_least(a));
        debug_assert!(other.has_capacity_for(a));
        self.contents.debit(a);
        other.contents.credit(a);
    }
}
