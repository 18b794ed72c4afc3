#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::debug;

use crate::{
    PercentCalculus,
    engine::{Account, Candle, Side},
    errors::{Error, Result},
    strategy::Strategy,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Parameters of [`GridStrategy`].
///
/// Percentages are signed: `flow_step_down` is normally negative.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Distance of the sell entrust above the last fill, in percent.
    pub flow_step_up: f64,
    /// Distance of the buy entrust from the last fill, in percent (negative).
    pub flow_step_down: f64,
    /// No trading before this timestamp. `0` for no limit.
    pub start_time: i64,
    /// No trading after this timestamp. `0` for no limit.
    pub end_time: i64,
    /// Limit price of the initial position. `0` buys at the first candle's open, otherwise
    /// the position is opened once the low breaks this price.
    pub first_price: f64,
    /// Volume of the initial position.
    pub first_volume: u64,
    /// Buying stops while the cost basis is at or above this value. `0` for no limit.
    pub max_cost: f64,
    /// Selling stops when it would leave fewer shares than this.
    pub min_retain: u64,
    /// Volume of every entrust.
    pub volume: u64,
    /// Lifetime of an entrust in days. `0` never expires.
    pub expire_days: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            flow_step_up: 5.0,
            flow_step_down: -5.0,
            start_time: 0,
            end_time: 0,
            first_price: 0.0,
            first_volume: 1000,
            max_cost: 0.0,
            min_retain: 0,
            volume: 100,
            expire_days: 0,
        }
    }
}

/// Grid (price ladder) trading.
///
/// Once the initial position is bought, a sell entrust above and a buy entrust below the fill
/// price are created. Each later fill arms a new pair around its own price, so the ladder
/// follows the market. The buy side is locked while the cost basis reaches `max_cost`, the
/// sell side while a sale would go below `min_retain` shares.
#[derive(Debug, Clone)]
pub struct GridStrategy {
    config: GridConfig,
}

impl GridStrategy {
    /// Creates the strategy, checking the parameters.
    pub fn new(config: GridConfig) -> Result<Self> {
        let c = &config;
        if !(c.flow_step_up > 0.0) {
            return Err(Error::InvalidParameter(format!("flow_step_up must be positive, got {}", c.flow_step_up)));
        }
        if !(c.flow_step_down < 0.0 && c.flow_step_down > -100.0) {
            return Err(Error::InvalidParameter(format!(
                "flow_step_down must be within (-100, 0), got {}",
                c.flow_step_down
            )));
        }
        if !(c.first_price >= 0.0) || !(c.max_cost >= 0.0) {
            return Err(Error::InvalidParameter("first_price and max_cost must not be negative".to_owned()));
        }
        if c.first_volume == 0 || c.volume == 0 {
            return Err(Error::InvalidParameter("first_volume and volume must be positive".to_owned()));
        }
        if c.end_time != 0 && c.end_time < c.start_time {
            return Err(Error::InvalidParameter(format!(
                "end_time {} is before start_time {}",
                c.end_time, c.start_time
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    fn in_window(&self, now: i64) -> bool {
        let c = &self.config;
        (c.start_time == 0 || now >= c.start_time) && (c.end_time == 0 || now <= c.end_time)
    }

    fn open_position(&self, account: &mut Account, candle: &Candle) -> Result<()> {
        let c = &self.config;
        let price = if c.first_price == 0.0 {
            candle.open()
        } else if candle.low() <= c.first_price {
            // a gap below the limit fills at the open
            c.first_price.min(candle.open())
        } else {
            return Ok(());
        };

        account
            .trade(Side::Buy, price, c.first_volume, candle)
            .map_err(|r| Error::Strategy(format!("cannot open the initial position: {r}")))?;
        self.arm(account, price, candle.timestamp());
        Ok(())
    }

    fn update_locks(&self, account: &mut Account) {
        let c = &self.config;
        let balance = *account.balance();
        account.set_buy_lock(c.max_cost > 0.0 && balance.cost() >= c.max_cost);
        account.set_sell_lock(balance.volume() < c.volume + c.min_retain);
    }

    // new sell/buy pair around `price`
    fn arm(&self, account: &mut Account, price: f64, now: i64) {
        let c = &self.config;
        let dead_time = match c.expire_days {
            0 => 0,
            days => now + i64::from(days) * SECONDS_PER_DAY,
        };
        let sell = price.shift_percent(c.flow_step_up);
        let buy = price.shift_percent(c.flow_step_down);
        account.create_entrust(Side::Sell, sell, c.volume, now, dead_time);
        account.create_entrust(Side::Buy, buy, c.volume, now, dead_time);
        debug!(price, sell, buy, "grid armed");
    }
}

impl Strategy for GridStrategy {
    fn execute(&mut self, account: &mut Account, candle: &Candle) -> Result<()> {
        if !self.in_window(candle.timestamp()) {
            return Ok(());
        }
        if account.last_deal().is_none() {
            return self.open_position(account, candle);
        }

        self.update_locks(account);
        if let Some(fill) = account.execute_entrust(candle) {
            self.arm(account, fill.entrust.price(), candle.timestamp());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let c = &self.config;
        let first = if c.first_price == 0.0 {
            "at the first open".to_owned()
        } else {
            format!("once price falls to {:.2}", c.first_price)
        };
        let window = match (c.start_time, c.end_time) {
            (0, 0) => "whole period".to_owned(),
            (start, 0) => format!("from {start}"),
            (0, end) => format!("until {end}"),
            (start, end) => format!("from {start} until {end}"),
        };
        let expiry = match c.expire_days {
            0 => "never expire".to_owned(),
            days => format!("expire after {days} days"),
        };
        let max_cost = if c.max_cost > 0.0 {
            format!("{:.2}", c.max_cost)
        } else {
            "unlimited".to_owned()
        };

        format!(
            "Grid strategy ({window})\n\
             initial position: buy {} {first}\n\
             ladder: sell {} at {:+.2}%, buy {} at {:+.2}% of the last fill, entrusts {expiry}\n\
             max cost: {max_cost}, min retained volume: {}",
            c.first_volume, c.volume, c.flow_step_up, c.volume, c.flow_step_down, c.min_retain
        )
    }
}
