//! Human-readable summary of a simulation.
//!
//! A [`Report`] reads an [`Account`] after (or during) a run and renders:
//! - the data description, when a [`CandleSeries`] is attached
//! - the strategy description
//! - the account identity
//! - the action and trade logs
//! - the pending entrust price levels
//! - the statistics and the final valuation
//!
//! It needs the `report` feature, enabled by default.

use std::fmt;

use chrono::DateTime;

use crate::{PercentCalculus, data::CandleSeries, engine::*, strategy::Strategy};

/// Snapshot view of a run, rendered with [`fmt::Display`].
#[derive(Debug, Clone)]
pub struct Report<'a> {
    account: &'a Account,
    strategy: String,
    series: Option<&'a CandleSeries>,
}

impl<'a> Report<'a> {
    /// Creates a report over `account`, describing `strategy`.
    pub fn new<S>(account: &'a Account, strategy: &S) -> Self
    where
        S: Strategy + ?Sized,
    {
        Self {
            account,
            strategy: strategy.describe(),
            series: None,
        }
    }

    /// Adds the description of the replayed data.
    pub fn with_series(mut self, series: &'a CandleSeries) -> Self {
        self.series = Some(series);
        self
    }

    /// Close of the last observed candle.
    pub fn last_close(&self) -> Option<f64> {
        self.account.last_price().map(|c| c.close())
    }

    /// Held volume valued at the last close.
    pub fn market_value(&self) -> Option<f64> {
        self.last_close()
            .map(|close| close * self.account.balance().volume() as f64)
    }

    /// Market value minus cost basis.
    pub fn holding_pnl(&self) -> Option<f64> {
        self.market_value().map(|value| value - self.account.balance().cost())
    }

    /// Holding P&L relative to the cost basis, in percent.
    pub fn holding_pnl_percent(&self) -> Option<f64> {
        self.market_value()
            .map(|value| self.account.balance().cost().change_percent(value))
    }

    /// Total value minus initial funding.
    pub fn total_pnl(&self) -> Option<f64> {
        self.account
            .total_value()
            .map(|value| value - self.account.initial_fund())
    }

    /// Total P&L relative to the initial funding, in percent.
    pub fn total_pnl_percent(&self) -> Option<f64> {
        self.account
            .total_value()
            .map(|value| self.account.initial_fund().change_percent(value))
    }

    fn levels(book: &EntrustBook, now: i64) -> (usize, String) {
        let prices: Vec<String> = book.pending(now).map(|e| format!("{:.2}", e.price())).collect();
        (prices.len(), prices.join(", "))
    }
}

fn format_time(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let account = self.account;

        if let Some(series) = self.series {
            writeln!(f, "=== Data ===")?;
            writeln!(f, "Name: {}  Code: {}", series.name(), series.code())?;
            writeln!(f, "Range: {} ~ {}", series.from(), series.to())?;
            writeln!(f, "Candles: {}", series.len())?;
            writeln!(f, "Updated: {}", format_time(series.update_time()))?;
        }

        writeln!(f, "=== Strategy ===")?;
        writeln!(f, "{}", self.strategy)?;

        writeln!(f, "=== Account ===")?;
        writeln!(f, "Name: {}", account.name())?;
        if !account.note().is_empty() {
            writeln!(f, "Note: {}", account.note())?;
        }
        if !account.target().is_empty() {
            writeln!(f, "Target: {}", account.target())?;
        }
        writeln!(f, "Initial funding: {:.2}", account.initial_fund())?;

        writeln!(f, "=== Actions ===")?;
        for action in account.action_log() {
            writeln!(f, "{}, {}, {}", format_time(action.timestamp()), action.kind(), action.desc())?;
        }

        writeln!(f, "=== Trades ===")?;
        for (i, trade) in account.trade_log().iter().enumerate() {
            writeln!(
                f,
                "#{}, {}, {}, price={:.2}  volume={}",
                i + 1,
                format_time(trade.timestamp()),
                trade.side(),
                trade.price(),
                trade.volume()
            )?;
        }

        let now = account.last_price().map(|c| c.timestamp()).unwrap_or_default();
        let (buys, buy_levels) = Self::levels(account.buy_entrusts(), now);
        let (sells, sell_levels) = Self::levels(account.sell_entrusts(), now);
        writeln!(f, "=== Entrusts ===")?;
        writeln!(f, "Pending buys={buys}  Pending sells={sells}")?;
        writeln!(f, "Buy levels: {buy_levels}")?;
        writeln!(f, "Sell levels: {sell_levels}")?;

        let stats = account.stats();
        writeln!(f, "=== Statistics ===")?;
        writeln!(
            f,
            "Trades={}  (Buy={}, Sell={})",
            stats.trades(),
            stats.buy_count(),
            stats.sell_count()
        )?;
        writeln!(f, "Max volume={}  Min volume={}", stats.max_volume(), stats.min_volume())?;
        writeln!(f, "Max cost={:.2}  Min cost={:.2}", stats.max_cost(), stats.min_cost())?;
        writeln!(f, "Max value={:.2}  Min value={:.2}", stats.max_value(), stats.min_value())?;

        writeln!(f, "=== Result ===")?;
        let balance = account.balance();
        let (Some(close), Some(total), Some(market)) = (self.last_close(), account.total_value(), self.market_value())
        else {
            return writeln!(f, "No candle observed, cash: {:.2}", balance.cash());
        };
        writeln!(f, "Total value: {total:.2}")?;
        writeln!(f, "Cash: {:.2}", balance.cash())?;
        writeln!(f, "Last close: {close:.2}")?;
        writeln!(f, "Held volume: {}", balance.volume())?;
        writeln!(f, "Cost: {:.2}", balance.cost())?;
        writeln!(f, "Market value: {market:.2}")?;
        writeln!(
            f,
            "Holding P&L: {:.2}  ({:.2}%)",
            market - balance.cost(),
            balance.cost().change_percent(market)
        )?;
        writeln!(
            f,
            "Total P&L: {:.2}  ({:.2}%)",
            total - account.initial_fund(),
            account.initial_fund().change_percent(total)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;

    const T: i64 = 1_664_553_600;

    fn candle(timestamp: i64, close: f64) -> Candle {
        CandleBuilder::builder()
            .timestamp(timestamp)
            .open(10.0)
            .close(close)
            .high(close.max(10.0) + 0.5)
            .low(close.min(10.0) - 0.5)
            .build()
            .unwrap()
    }

    fn noop(_: &mut Account, _: &Candle) -> Result<()> {
        Ok(())
    }

    fn traded() -> Account {
        let mut account = Account::new("grid", 100_000.0).with_note("ladder test");
        account.fund().unwrap();
        let first = candle(T, 10.5);
        account.observe(&first);
        account.trade(Side::Buy, 10.0, 1000, &first).unwrap();
        account.create_entrust(Side::Sell, 11.0, 500, T, 0);
        account.create_entrust(Side::Buy, 9.0, 500, T, 0);
        account.create_entrust(Side::Buy, 9.5, 500, T, 0);
        account.observe(&candle(T + 86_400, 12.0));
        account
    }

    #[test]
    fn valuation() {
        let account = traded();
        let report = Report::new(&account, &noop);

        assert_eq!(report.last_close(), Some(12.0));
        assert_eq!(report.market_value(), Some(12_000.0));
        assert_eq!(report.holding_pnl(), Some(2_000.0));
        assert_eq!(report.holding_pnl_percent(), Some(20.0));
        assert_eq!(report.total_pnl(), Some(2_000.0));
        assert_eq!(report.total_pnl_percent(), Some(2.0));
    }

    #[test]
    fn renders_sections() {
        let account = traded();
        let series = CandleSeries::new("600000", "Pudong Bank", vec![candle(T, 10.5), candle(T + 86_400, 12.0)]);
        let text = Report::new(&account, &noop).with_series(&series).to_string();

        assert!(text.contains("Name: Pudong Bank  Code: 600000"));
        assert!(text.contains("custom closure strategy"));
        assert!(text.contains("Note: ladder test"));
        assert!(text.contains("#1, 2022-09-30 16:00:00, buy, price=10.00  volume=1000"));
        assert!(text.contains("Pending buys=2  Pending sells=1"));
        assert!(text.contains("Buy levels: 9.50, 9.00"));
        assert!(text.contains("Total value: 102000.00"));
        assert!(text.contains("Holding P&L: 2000.00  (20.00%)"));
    }

    #[test]
    fn unobserved_account() {
        let mut account = Account::new("idle", 500.0);
        account.fund().unwrap();
        let text = Report::new(&account, &noop).to_string();

        assert!(text.contains("No candle observed, cash: 500.00"));
        assert!(!text.contains("=== Data ==="));
    }
}
