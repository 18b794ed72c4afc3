#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::{Balance, Side};

/// Running trade counters and lifetime watermarks of an account.
///
/// The window only widens: minimums shrink and maximums grow. Volume and cost minimums are
/// seeded on the first trade, and so is the value minimum, so the state before any trade
/// does not pin them at zero.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TradeStats {
    buy_count: u32,
    sell_count: u32,
    max_volume: u64,
    min_volume: u64,
    max_cost: f64,
    min_cost: f64,
    max_value: f64,
    min_value: f64,
}

impl TradeStats {
    pub fn buy_count(&self) -> u32 {
        self.buy_count
    }

    pub fn sell_count(&self) -> u32 {
        self.sell_count
    }

    /// Number of executed trades.
    pub fn trades(&self) -> u32 {
        self.buy_count + self.sell_count
    }

    pub fn max_volume(&self) -> u64 {
        self.max_volume
    }

    pub fn min_volume(&self) -> u64 {
        self.min_volume
    }

    pub fn max_cost(&self) -> f64 {
        self.max_cost
    }

    pub fn min_cost(&self) -> f64 {
        self.min_cost
    }

    /// Highest total account value seen.
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Lowest total account value seen since the first trade.
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Folds the current balance into the statistics.
    ///
    /// `traded` is the side of the trade that just executed, or [`Side::Hold`] for a plain
    /// price observation. `price` values the holdings.
    pub(crate) fn update(&mut self, traded: Side, balance: &Balance, price: f64) {
        match traded {
            Side::Buy => self.buy_count += 1,
            Side::Sell => self.sell_count += 1,
            Side::Hold => {}
        }
        let first_trade = traded != Side::Hold && self.trades() == 1;

        if first_trade {
            self.min_volume = balance.volume();
            self.min_cost = balance.cost();
        }
        self.max_volume = self.max_volume.max(balance.volume());
        self.min_volume = self.min_volume.min(balance.volume());
        if balance.cost() > self.max_cost {
            self.max_cost = balance.cost();
        }
        if balance.cost() < self.min_cost {
            self.min_cost = balance.cost();
        }

        let total = price * balance.volume() as f64 + balance.cash();
        if total > self.max_value {
            self.max_value = total;
        }
        if total < self.min_value || first_trade {
            self.min_value = total;
        }
    }
}
