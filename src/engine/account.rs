#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::{debug, info, warn};

use crate::{
    engine::*,
    errors::{Error, Rejection, Result},
};

/// Cash and holdings of an account.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Balance {
    // Cash on hand
    cash: f64,
    // Cost basis of the held shares
    cost: f64,
    // Held shares
    volume: u64,
}

impl From<(f64, f64, u64)> for Balance {
    fn from((cash, cost, volume): (f64, f64, u64)) -> Self {
        Self { cash, cost, volume }
    }
}

impl Balance {
    /// Cash available for buying.
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cost basis of the held shares.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Number of held shares.
    pub fn volume(&self) -> u64 {
        self.volume
    }
}

/// Side locks set by the strategy. A locked side admits no trade.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Locks {
    /// Buying is suspended.
    pub buy: bool,
    /// Selling is suspended.
    pub sell: bool,
}

/// An entrust filled by [`Account::execute_entrust`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    /// Side of the executed trade.
    pub side: Side,
    /// The entrust as stored after the fill.
    pub entrust: Entrust,
}

/// A single instrument trading account.
///
/// The account admits or rejects trades, keeps the entrust books, the trade and action logs,
/// and the running [`TradeStats`]. Rejections never panic: they are returned as [`Rejection`]
/// and written to the action log.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Account {
    name: String,
    note: String,
    initial_fund: f64,
    // target instrument code
    target: String,
    balance: Balance,
    stats: TradeStats,
    locks: Locks,
    trade_log: Vec<TradeRecord>,
    action_log: Vec<Action>,
    buy_book: EntrustBook,
    sell_book: EntrustBook,
    // latest observed candle
    last_price: Option<Candle>,
    // candle of the latest executed trade
    last_deal: Option<Candle>,
}

impl Account {
    /// Creates an account with zero cash. [`Account::fund`] seeds the cash from
    /// `initial_fund`.
    pub fn new(name: impl Into<String>, initial_fund: f64) -> Self {
        Self {
            name: name.into(),
            note: String::new(),
            initial_fund,
            target: String::new(),
            balance: Balance::default(),
            stats: TradeStats::default(),
            locks: Locks::default(),
            trade_log: Vec::new(),
            action_log: Vec::new(),
            buy_book: EntrustBook::new(Side::Buy),
            sell_book: EntrustBook::new(Side::Sell),
            last_price: None,
            last_deal: None,
        }
    }

    /// Sets a free text note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Sets the traded instrument code.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Starts from an existing balance instead of the initial funding.
    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balance = balance;
        self
    }

    /// Starts from existing statistics.
    pub fn with_stats(mut self, stats: TradeStats) -> Self {
        self.stats = stats;
        self
    }

    /// Checks the identity: non empty name and positive funding.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::EmptyAccountName);
        }
        if self.initial_fund <= 0.0 || !self.initial_fund.is_finite() {
            return Err(Error::NegZeroFund(self.initial_fund));
        }
        Ok(())
    }

    /// Validates the account and, when the cash is exactly zero, seeds it from the initial
    /// funding.
    pub fn fund(&mut self) -> Result<()> {
        self.validate()?;
        if self.balance.cash == 0.0 {
            self.balance.cash = self.initial_fund;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn initial_fund(&self) -> f64 {
        self.initial_fund
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn stats(&self) -> &TradeStats {
        &self.stats
    }

    pub fn locks(&self) -> Locks {
        self.locks
    }

    /// Suspends or resumes buying.
    pub fn set_buy_lock(&mut self, locked: bool) {
        self.locks.buy = locked;
    }

    /// Suspends or resumes selling.
    pub fn set_sell_lock(&mut self, locked: bool) {
        self.locks.sell = locked;
    }

    /// Executed trades, oldest first.
    pub fn trade_log(&self) -> &[TradeRecord] {
        &self.trade_log
    }

    /// Audited actions, oldest first.
    pub fn action_log(&self) -> &[Action] {
        &self.action_log
    }

    /// Buy entrusts, highest price first.
    pub fn buy_entrusts(&self) -> &EntrustBook {
        &self.buy_book
    }

    /// Sell entrusts, lowest price first.
    pub fn sell_entrusts(&self) -> &EntrustBook {
        &self.sell_book
    }

    /// Latest observed candle.
    pub fn last_price(&self) -> Option<&Candle> {
        self.last_price.as_ref()
    }

    /// Candle of the latest executed trade. `None` until the first fill.
    pub fn last_deal(&self) -> Option<&Candle> {
        self.last_deal.as_ref()
    }

    /// Cash plus holdings valued at the latest observed close.
    pub fn total_value(&self) -> Option<f64> {
        self.last_price
            .map(|candle| candle.close() * self.balance.volume as f64 + self.balance.cash)
    }

    /// Executes a trade of `volume` shares at `price`, right now.
    ///
    /// ### Arguments
    /// * `side` - Buy or sell. `Hold` is rejected.
    /// * `price` - Unit price, must be positive.
    /// * `volume` - Number of shares, must be positive.
    /// * `candle` - The candle during which the trade happens.
    ///
    /// ### Returns
    /// `Ok(())` when executed. Otherwise the rejection, which is also written to the action
    /// log unless the arguments themselves are invalid.
    ///
    /// ### Example
    /// ```rust
    /// use kline_backtest::prelude::*;
    ///
    /// let candle = CandleBuilder::builder()
    ///     .timestamp(1_664_553_600)
    ///     .open(10.0)
    ///     .close(10.5)
    ///     .high(11.0)
    ///     .low(9.5)
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut account = Account::new("grid", 100_000.0);
    /// account.fund().unwrap();
    /// account.trade(Side::Buy, 10.0, 1000, &candle).unwrap();
    /// assert_eq!(account.balance().cash(), 90_000.0);
    ///
    /// let rejected = account.trade(Side::Sell, 10.0, 2000, &candle);
    /// assert!(matches!(rejected, Err(Rejection::InsufficientHoldings { .. })));
    /// ```
    pub fn trade(
        &mut self,
        side: Side,
        price: f64,
        volume: u64,
        candle: &Candle,
    ) -> std::result::Result<(), Rejection> {
        if volume == 0 || price <= 0.0 || !price.is_finite() || side == Side::Hold {
            warn!(%side, price, volume, timestamp = candle.timestamp(), "invalid trade arguments");
            return Err(Rejection::InvalidArguments { side, price, volume });
        }

        let value = price * volume as f64;
        let rejection = match side {
            Side::Buy if value > self.balance.cash => Some(Rejection::InsufficientBalance {
                required: value,
                available: self.balance.cash,
            }),
            Side::Sell if volume > self.balance.volume => Some(Rejection::InsufficientHoldings {
                requested: volume,
                held: self.balance.volume,
            }),
            Side::Buy if self.locks.buy => Some(Rejection::Locked { side }),
            Side::Sell if self.locks.sell => Some(Rejection::Locked { side }),
            _ => None,
        };
        if let Some(rejection) = rejection {
            info!(%side, price, volume, timestamp = candle.timestamp(), reason = %rejection, "trade rejected");
            let desc = format!(
                "{rejection}: average price {:.2}, order price {price:.2}",
                candle.average_price()
            );
            self.record_action(candle.timestamp(), ActionKind::GaveUp, desc);
            return Err(rejection);
        }

        let kind = match side {
            Side::Buy => {
                self.balance.cash -= value;
                self.balance.cost += value;
                self.balance.volume += volume;
                ActionKind::Bought
            }
            Side::Sell => {
                self.balance.volume -= volume;
                self.balance.cash += value;
                self.balance.cost -= value;
                ActionKind::Sold
            }
            Side::Hold => return Err(Rejection::InvalidArguments { side, price, volume }),
        };

        let desc = format!(
            "{kind} {volume} at {price:.2}, value {value:.2}, band [{:.2} ~ {:.2}]",
            candle.low(),
            candle.high()
        );
        self.record_action(candle.timestamp(), kind, desc);
        self.trade_log.push(TradeRecord::from((candle.timestamp(), side, price, volume)));
        self.last_deal = Some(*candle);

        let valuation = self.last_price.unwrap_or(*candle).close();
        self.stats.update(side, &self.balance, valuation);
        debug!(%side, price, volume, cash = self.balance.cash, held = self.balance.volume, "trade executed");
        Ok(())
    }

    /// Adds a conditional order to the book of `side`, keeping the book sorted.
    ///
    /// `dead_time` is the expiry timestamp, `0` for an entrust that never expires. A `Hold`
    /// side is ignored.
    pub fn create_entrust(&mut self, side: Side, price: f64, volume: u64, start_time: i64, dead_time: i64) {
        let (book, desc) = match side {
            Side::Buy => (
                &mut self.buy_book,
                format!("entrust: buy {volume} when price falls to {price:.2}"),
            ),
            Side::Sell => (
                &mut self.sell_book,
                format!("entrust: sell {volume} when price rises to {price:.2}"),
            ),
            Side::Hold => {
                warn!(price, volume, start_time, "entrust with hold side ignored");
                return;
            }
        };
        book.insert(Entrust::new(price, volume, start_time, dead_time));
        self.record_action(start_time, ActionKind::Entrusted, desc);
    }

    /// Fills at most one triggered entrust, sell side first.
    ///
    /// Within a book entrusts are tried in priority order, skipping filled and expired ones. A
    /// locked side is skipped. If the first triggered entrust cannot be traded, scanning stops
    /// and nothing is filled for this candle.
    ///
    /// ### Returns
    /// The filled entrust, or `None` when nothing was filled.
    pub fn execute_entrust(&mut self, candle: &Candle) -> Option<Fill> {
        for side in [Side::Sell, Side::Buy] {
            let locked = match side {
                Side::Sell => self.locks.sell,
                _ => self.locks.buy,
            };
            if locked {
                continue;
            }

            let Some(idx) = self.book(side).first_triggered(candle) else {
                continue;
            };
            let entrust = self.book(side).entrusts()[idx];
            if self.trade(side, entrust.price(), entrust.volume(), candle).is_err() {
                return None;
            }

            let entrust = self.book_mut(side).get_mut(idx)?;
            entrust.fill(candle.timestamp());
            return Some(Fill {
                side,
                entrust: *entrust,
            });
        }
        None
    }

    /// Records the latest market price and refreshes the statistics without trading.
    pub fn observe(&mut self, candle: &Candle) {
        self.last_price = Some(*candle);
        self.stats.update(Side::Hold, &self.balance, candle.close());
    }

    /// Drops filled and expired entrusts from both books. Returns the number removed.
    pub fn prune_entrusts(&mut self, now: i64) -> usize {
        self.buy_book.prune(now) + self.sell_book.prune(now)
    }

    fn book(&self, side: Side) -> &EntrustBook {
        match side {
            Side::Buy => &self.buy_book,
            _ => &self.sell_book,
        }
    }

    fn book_mut(&mut self, side: Side) -> &mut EntrustBook {
        match side {
            Side::Buy => &mut self.buy_book,
            _ => &mut self.sell_book,
        }
    }

    fn record_action(&mut self, timestamp: i64, kind: ActionKind, desc: String) {
        self.action_log.push(Action::from((timestamp, kind, desc)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_664_553_600;
    const DAY: i64 = 86_400;

    fn candle(timestamp: i64, open: f64, close: f64, high: f64, low: f64) -> Candle {
        CandleBuilder::builder()
            .timestamp(timestamp)
            .open(open)
            .close(close)
            .high(high)
            .low(low)
            .volume(1_000_000.0)
            .build()
            .unwrap()
    }

    fn funded() -> Account {
        let mut account = Account::new("grid", 100_000.0).with_note("unit test");
        account.fund().unwrap();
        account
    }

    fn holding_1000() -> (Account, Candle) {
        let mut account = funded();
        let first = candle(T, 10.0, 10.5, 11.0, 9.5);
        account.observe(&first);
        account.trade(Side::Buy, 10.0, 1000, &first).unwrap();
        (account, first)
    }

    #[test]
    fn fund_seeds_cash_once() {
        let mut account = Account::new("grid", 100_000.0);
        account.fund().unwrap();
        assert_eq!(account.balance().cash(), 100_000.0);

        let mut resumed = Account::new("grid", 100_000.0).with_balance(Balance::from((5_000.0, 95_000.0, 9_500)));
        resumed.fund().unwrap();
        assert_eq!(resumed.balance().cash(), 5_000.0);
    }

    #[test]
    fn fund_rejects_bad_identity() {
        assert!(matches!(Account::new("", 1.0).fund(), Err(Error::EmptyAccountName)));
        assert!(matches!(Account::new("a", 0.0).fund(), Err(Error::NegZeroFund(_))));
        assert!(matches!(Account::new("a", -5.0).fund(), Err(Error::NegZeroFund(_))));
    }

    #[test]
    fn scenario_buy() {
        let (account, _) = holding_1000();

        assert_eq!(account.balance().cash(), 90_000.0);
        assert_eq!(account.balance().cost(), 10_000.0);
        assert_eq!(account.balance().volume(), 1000);
        assert_eq!(account.trade_log().len(), 1);
        assert_eq!(account.action_log().len(), 1);
        assert_eq!(account.action_log()[0].kind(), ActionKind::Bought);
        assert!(account.action_log()[0].desc().contains("[9.50 ~ 11.00]"));
        assert_eq!(account.stats().buy_count(), 1);
        assert_eq!(account.last_deal().map(|c| c.timestamp()), Some(T));
    }

    #[test]
    fn scenario_sell_more_than_held() {
        let (mut account, first) = holding_1000();
        let balance = *account.balance();

        let result = account.trade(Side::Sell, 10.0, 2000, &first);
        assert_eq!(
            result,
            Err(Rejection::InsufficientHoldings {
                requested: 2000,
                held: 1000
            })
        );
        assert_eq!(account.balance(), &balance);
        assert_eq!(account.trade_log().len(), 1);
        assert_eq!(account.action_log().len(), 2);
        assert_eq!(account.action_log()[1].kind(), ActionKind::GaveUp);
    }

    #[test]
    fn sell_more_than_held_on_fresh_account() {
        let mut account = funded();
        let first = candle(T, 10.0, 10.5, 11.0, 9.5);
        account.observe(&first);

        // nothing held at all
        assert!(account.trade(Side::Sell, 10.0, 2000, &first).is_err());
        assert_eq!(account.trade_log().len(), 0);
        assert_eq!(account.action_log().len(), 1);
        assert_eq!(account.balance().cash(), 100_000.0);
    }

    #[test]
    fn buy_without_cash() {
        let mut account = funded();
        let first = candle(T, 10.0, 10.5, 11.0, 9.5);

        let result = account.trade(Side::Buy, 10.0, 10_001, &first);
        assert!(matches!(result, Err(Rejection::InsufficientBalance { .. })));
        assert_eq!(account.balance().cash(), 100_000.0);
        assert_eq!(account.action_log().len(), 1);

        // spending everything is fine
        account.trade(Side::Buy, 10.0, 10_000, &first).unwrap();
        assert_eq!(account.balance().cash(), 0.0);
    }

    #[test]
    fn invalid_arguments_are_not_audited() {
        let mut account = funded();
        let first = candle(T, 10.0, 10.5, 11.0, 9.5);

        assert!(matches!(
            account.trade(Side::Buy, 10.0, 0, &first),
            Err(Rejection::InvalidArguments { .. })
        ));
        assert!(account.trade(Side::Buy, 0.0, 10, &first).is_err());
        assert!(account.trade(Side::Buy, f64::NAN, 10, &first).is_err());
        assert!(account.trade(Side::Hold, 10.0, 10, &first).is_err());
        assert!(account.action_log().is_empty());
        assert!(account.trade_log().is_empty());
    }

    #[test]
    fn locks_block_trades() {
        let (mut account, first) = holding_1000();
        account.set_sell_lock(true);
        account.set_buy_lock(true);

        assert_eq!(account.trade(Side::Sell, 11.0, 100, &first), Err(Rejection::Locked { side: Side::Sell }));
        assert_eq!(account.trade(Side::Buy, 9.0, 100, &first), Err(Rejection::Locked { side: Side::Buy }));
        assert_eq!(account.balance().volume(), 1000);
        assert_eq!(account.action_log().len(), 3);

        account.set_sell_lock(false);
        account.trade(Side::Sell, 11.0, 100, &first).unwrap();
        assert_eq!(account.balance().volume(), 900);
    }

    #[test]
    fn sell_restores_cash_and_cost() {
        let (mut account, first) = holding_1000();
        account.trade(Side::Sell, 11.0, 500, &first).unwrap();

        assert_eq!(account.balance().cash(), 95_500.0);
        assert_eq!(account.balance().cost(), 4_500.0);
        assert_eq!(account.balance().volume(), 500);
        assert_eq!(account.stats().sell_count(), 1);
    }

    #[test]
    fn scenario_entrust_sell_priority() {
        let (mut account, _) = holding_1000();
        account.create_entrust(Side::Sell, 11.0, 500, T, 0);
        account.create_entrust(Side::Buy, 9.0, 500, T, 0);
        assert_eq!(account.action_log().len(), 3);

        let next = candle(T + DAY, 10.5, 11.0, 11.2, 9.8);
        account.observe(&next);
        let fill = account.execute_entrust(&next).unwrap();

        assert_eq!(fill.side, Side::Sell);
        assert_eq!(fill.entrust.price(), 11.0);
        assert_eq!(fill.entrust.deal_time(), T + DAY);
        assert!(!account.buy_entrusts().entrusts()[0].is_filled());
        assert_eq!(account.balance().volume(), 500);
        assert_eq!(account.trade_log().len(), 2);
    }

    #[test]
    fn one_fill_per_call_and_never_twice() {
        let (mut account, _) = holding_1000();
        account.create_entrust(Side::Sell, 10.8, 100, T, 0);
        account.create_entrust(Side::Sell, 10.6, 100, T, 0);
        account.create_entrust(Side::Buy, 9.6, 100, T, 0);

        let wide = candle(T + DAY, 10.0, 10.0, 11.0, 9.0);
        let first = account.execute_entrust(&wide).unwrap();
        assert_eq!(first.entrust.price(), 10.6);
        let second = account.execute_entrust(&wide).unwrap();
        assert_eq!(second.entrust.price(), 10.8);
        let third = account.execute_entrust(&wide).unwrap();
        assert_eq!(third.side, Side::Buy);
        assert!(account.execute_entrust(&wide).is_none());

        assert_eq!(account.trade_log().len(), 4);
        let deal_times: Vec<i64> = account.sell_entrusts().entrusts().iter().map(|e| e.deal_time()).collect();
        assert_eq!(deal_times, vec![T + DAY, T + DAY]);
    }

    #[test]
    fn failed_trigger_stops_scanning() {
        let (mut account, _) = holding_1000();
        // the first sell needs more shares than held
        account.create_entrust(Side::Sell, 10.5, 5000, T, 0);
        account.create_entrust(Side::Sell, 10.7, 100, T, 0);
        account.create_entrust(Side::Buy, 9.9, 100, T, 0);

        let wide = candle(T + DAY, 10.0, 10.0, 11.0, 9.0);
        assert!(account.execute_entrust(&wide).is_none());
        assert_eq!(account.trade_log().len(), 1);
        assert!(account.sell_entrusts().entrusts().iter().all(|e| !e.is_filled()));
        assert!(!account.buy_entrusts().entrusts()[0].is_filled());
    }

    #[test]
    fn sell_lock_leaves_buy_side_active() {
        let (mut account, _) = holding_1000();
        account.create_entrust(Side::Sell, 10.5, 100, T, 0);
        account.create_entrust(Side::Buy, 9.9, 100, T, 0);
        account.set_sell_lock(true);

        let wide = candle(T + DAY, 10.0, 10.0, 11.0, 9.0);
        let fill = account.execute_entrust(&wide).unwrap();
        assert_eq!(fill.side, Side::Buy);
        assert!(!account.sell_entrusts().entrusts()[0].is_filled());

        account.set_buy_lock(true);
        account.create_entrust(Side::Buy, 9.8, 100, T, 0);
        assert!(account.execute_entrust(&wide).is_none());
    }

    #[test]
    fn expired_entrust_never_triggers() {
        let (mut account, _) = holding_1000();
        account.create_entrust(Side::Sell, 10.5, 100, T, T + DAY);

        let late = candle(T + 2 * DAY, 10.0, 10.0, 11.0, 9.0);
        assert!(account.execute_entrust(&late).is_none());

        let on_time = candle(T + DAY, 10.0, 10.0, 11.0, 9.0);
        assert!(account.execute_entrust(&on_time).is_some());
    }

    #[test]
    fn hold_entrust_ignored() {
        let mut account = funded();
        account.create_entrust(Side::Hold, 10.0, 100, T, 0);
        assert!(account.buy_entrusts().is_empty());
        assert!(account.sell_entrusts().is_empty());
        assert!(account.action_log().is_empty());
    }

    #[test]
    fn prune_resolved_entrusts() {
        let (mut account, _) = holding_1000();
        account.create_entrust(Side::Sell, 10.5, 100, T, 0);
        account.create_entrust(Side::Sell, 12.0, 100, T, T + DAY);
        account.create_entrust(Side::Buy, 9.0, 100, T, 0);

        let next = candle(T + 3 * DAY, 10.0, 10.0, 11.0, 9.5);
        account.execute_entrust(&next).unwrap();

        assert_eq!(account.prune_entrusts(next.timestamp()), 2);
        assert!(account.sell_entrusts().is_empty());
        assert_eq!(account.buy_entrusts().len(), 1);
    }

    #[test]
    fn statistics_follow_trades_and_prices() {
        let (mut account, _) = holding_1000();
        assert_eq!(account.stats().min_value(), 100_500.0);
        assert_eq!(account.stats().max_value(), 100_500.0);

        let up = candle(T + DAY, 10.5, 12.0, 12.0, 10.5);
        account.observe(&up);
        assert_eq!(account.stats().max_value(), 102_000.0);
        assert_eq!(account.total_value(), Some(102_000.0));

        let down = candle(T + 2 * DAY, 9.0, 8.0, 9.0, 8.0);
        account.observe(&down);
        assert_eq!(account.stats().min_value(), 98_000.0);
        assert_eq!(account.stats().max_value(), 102_000.0);
        assert_eq!(account.stats().trades(), 1);
    }
}
