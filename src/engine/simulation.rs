use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::{debug, error, info, info_span};

use crate::{
    engine::*,
    errors::{Error, Result},
    strategy::Strategy,
};

/// Tuning of the simulation driver.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of ticks between two prunings of filled and expired entrusts. `0` never prunes.
    pub prune_interval: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { prune_interval: 256 }
    }
}

/// Replays candles against an account, one strategy call per candle.
///
/// The account is owned by the simulation for the whole run and can be read back, complete
/// or partial, with [`Simulation::account`] or [`Simulation::into_account`].
#[derive(Debug, Clone)]
pub struct Simulation {
    account: Account,
    data: Arc<[Candle]>,
    config: SimulationConfig,
    // candles already processed
    ticks: usize,
}

impl Simulation {
    /// Creates a simulation with the default [`SimulationConfig`].
    ///
    /// ### Arguments
    /// * `account` - Account to trade with. Its cash is seeded from the initial funding when it
    ///   is exactly zero.
    /// * `data` - Time ordered candles.
    ///
    /// ### Returns
    /// The simulation, or an error when the candles are empty, the account has no name or
    /// its initial funding is not positive.
    ///
    /// ### Example
    /// ```rust
    /// use std::sync::Arc;
    ///
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
    /// let account = Account::new("grid", 100_000.0);
    /// let mut sim = Simulation::new(account, Arc::from_iter(vec![candle])).unwrap();
    /// sim.run(&mut |account: &mut Account, candle: &Candle| -> Result<()> {
    ///     let _ = account.trade(Side::Buy, candle.open(), 1000, candle);
    ///     Ok(())
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(sim.account().balance().volume(), 1000);
    /// ```
    pub fn new(account: Account, data: Arc<[Candle]>) -> Result<Self> {
        Self::with_config(account, data, SimulationConfig::default())
    }

    /// Creates a simulation with an explicit configuration.
    pub fn with_config(mut account: Account, data: Arc<[Candle]>, config: SimulationConfig) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::CandleDataEmpty);
        }
        account.fund()?;

        Ok(Self {
            account,
            data,
            config,
            ticks: 0,
        })
    }

    /// The account in its current state.
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Consumes the simulation and returns the account.
    pub fn into_account(self) -> Account {
        self.account
    }

    /// Returns an iterator over the data.
    pub fn candles(&self) -> std::slice::Iter<'_, Candle> {
        self.data.iter()
    }

    /// Number of candles processed so far.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs the strategy over the remaining candles.
    ///
    /// For each candle the account observes the price, then the strategy executes. A strategy
    /// error stops the run: the candle it failed on counts as processed, later candles are not
    /// touched, and the error comes back as [`Error::Aborted`].
    pub fn run<S>(&mut self, strategy: &mut S) -> Result<()>
    where
        S: Strategy + ?Sized,
    {
        let span = info_span!("simulation", account = %self.account.name(), candles = self.data.len());
        let _enter = span.enter();
        info!(strategy = %strategy.describe(), from = self.ticks, "simulation started");

        let candles = Arc::clone(&self.data);
        for (index, candle) in candles.iter().enumerate().skip(self.ticks) {
            self.account.observe(candle);
            let result = strategy.execute(&mut self.account, candle);
            self.ticks = index + 1;

            if let Err(err) = result {
                error!(index, timestamp = candle.timestamp(), error = %err, "strategy failed, simulation aborted");
                return Err(Error::Aborted {
                    index,
                    timestamp: candle.timestamp(),
                    source: Box::new(err),
                });
            }

            let interval = self.config.prune_interval;
            if interval > 0 && self.ticks % interval == 0 {
                let removed = self.account.prune_entrusts(candle.timestamp());
                if removed > 0 {
                    debug!(index, removed, "pruned resolved entrusts");
                }
            }
        }

        info!(
            trades = self.account.trade_log().len(),
            value = self.account.total_value(),
            "simulation finished"
        );
        Ok(())
    }
}
