//! Market requests raised by machines and the offers that answer them.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::tradables::{TRADABLE_TYPES_COUNT, TradableType};

use super::MachineId;

/// What a customer wants from its neighbours. Purchases are settled before
/// any query is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TradeType {
    /// Buy up to `quantity` units at no more than `price_limit` each.
    Buying,
    /// Ask the lowest price on offer.
    QueryPrice,
    /// Ask how many units the cheapest seller has.
    QueryAvailability,
}

/// One machine's market intent for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// The machine asking.
    pub customer: MachineId,
    /// Kind of request.
    pub trade_type: TradeType,
    /// Commodity.
    pub commodity: TradableType,
    /// Units wanted.
    pub quantity: u16,
    /// Highest acceptable unit price.
    pub price_limit: u16,
}

// Sellers are matched cheapest first (see `Quote`), but customers are
// served highest limit first: with scarce stock the best bid must win.
impl Ord for TradeRequest {
    /// Type first. Within a type the customer willing to pay more goes first,
    /// then the one wanting more. The customer id settles exact ties.
    fn cmp(&self, other: &Self) -> Ordering {
        self.trade_type
            .cmp(&other.trade_type)
            .then_with(|| other.price_limit.cmp(&self.price_limit))
            .then_with(|| other.quantity.cmp(&self.quantity))
            .then_with(|| self.commodity.index().cmp(&other.commodity.index()))
            .then_with(|| self.customer.cmp(&other.customer))
    }
}

impl PartialOrd for TradeRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A seller's answer to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Who is selling.
    pub seller: MachineId,
    /// Unit price.
    pub price: u16,
    /// Units on offer.
    pub availability: u16,
}

impl Ord for Quote {
    /// Cheapest first, then the larger offer.
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .cmp(&other.price)
            .then_with(|| other.availability.cmp(&self.availability))
            .then_with(|| self.seller.cmp(&other.seller))
    }
}

impl PartialOrd for Quote {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One line of a machine's price list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForSale {
    /// Units offered.
    pub quantity: u16,
    /// Unit price.
    pub price: u16,
}

/// A machine's price list, one line per tradable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ForSaleTable([ForSale; TRADABLE_TYPES_COUNT]);

impl ForSaleTable {
    pub(crate) const fn get(&self, t: TradableType) -> ForSale {
        self.0[t.index()]
    }

    pub(crate) fn set(&mut self, t: TradableType, quantity: u16, price: u16) {
        self.0[t.index()] = ForSale { quantity, price };
    }

    pub(crate) fn reduce(&mut self, t: TradableType, sold: u16) {
        let line = &mut self.0[t.index()];
        line.quantity = line.quantity.saturating_sub(sold);
    }

    pub(crate) fn cancel_all(&mut self) {
        for line in &mut self.0 {
            line.quantity = 0;
        }
    }
}
