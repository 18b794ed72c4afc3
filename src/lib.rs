//! # kline-backtest: deterministic candle replay for ladder strategies
//!
//! **kline-backtest** replays an ordered series of candlesticks (K-lines) against a simulated
//! trading account. A strategy looks at every candle in turn and either trades directly or leaves
//! conditional orders (*entrusts*) that fill once the price crosses their level. The account keeps
//! cash, holdings and cost basis, an audit trail of every attempt and running statistics, so a run
//! can be inspected and reported afterwards.
//!
//! ## Core Components
//! | Component       | Description                                                                  |
//! |-----------------|------------------------------------------------------------------------------|
//! | **`Candle`**    | One time bucket of OHLC data, plus optional amount/volume/turnover fields.  |
//! | **`Account`**   | Cash, holdings, locks, entrust books, trade and action logs, statistics.    |
//! | **`Entrust`**   | Conditional order triggered by a price crossing, with optional expiry.      |
//! | **`Strategy`**  | Trading policy called once per candle. Closures are strategies too.         |
//! | **`Simulation`**| The driver replaying candles against an account and a strategy.            |
//! | **`GridStrategy`** | Reference ladder policy: sell above, buy below the last fill.            |
//! | **`Report`**    | Human-readable summary of a run.                                             |
//!
//! ## Features
//! | Feature  | Description                                                                 |
//! |----------|-----------------------------------------------------------------------------|
//! | `report` | *(default)* The [`report`] module.                                          |
//! | `serde`  | Serialize/deserialize the data types and load candle series from JSON.     |
//!
//! ## Getting Started
//! ```rust
//! use std::sync::Arc;
//!
//! use kline_backtest::prelude::*;
//!
//! let candles: Vec<Candle> = (0..30)
//!     .map(|i| {
//!         let close = 10.0 + (i as f64 * 0.7).sin();
//!         CandleBuilder::builder()
//!             .timestamp(1_664_553_600 + i * 86_400)
//!             .open(10.0)
//!             .close(close)
//!             .high(close.max(10.0) + 0.2)
//!             .low(close.min(10.0) - 0.2)
//!             .build()
//!             .unwrap()
//!     })
//!     .collect();
//!
//! let mut grid = GridStrategy::new(GridConfig {
//!     flow_step_up: 5.0,
//!     flow_step_down: -5.0,
//!     first_volume: 3000,
//!     volume: 200,
//!     ..GridConfig::default()
//! })
//! .unwrap();
//!
//! let mut sim = Simulation::new(Account::new("demo", 100_000.0), Arc::from_iter(candles)).unwrap();
//! sim.run(&mut grid).unwrap();
//!
//! assert_eq!(sim.ticks(), 30);
//! assert!(sim.account().stats().trades() >= 1);
//! ```
//!
//! ## Logging
//! The crate emits [`tracing`](https://crates.io/crates/tracing) events and spans but never
//! installs a subscriber. Install one (globally or with `tracing::subscriber::with_default`) to
//! see what a simulation does.
//!
//! ## Error Handling
//! Setup problems and fatal strategy failures are [`errors::Error`]s. Trades refused by the account
//! (no cash, no holdings, locked side) are [`errors::Rejection`]s: they are recorded in the
//! action log and returned to the strategy, which may ignore them or escalate them with `?`.
//!
//! ## License
//! MIT
#![warn(missing_docs)]

/// Core engine: candles, entrusts, the account and the simulation driver.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// The strategy contract and the grid reference strategy.
pub mod strategy;

/// Candle series with their market metadata.
pub mod data;

/// Run summaries.
#[cfg(feature = "report")]
pub mod report;

/// Re-exports of commonly used types and traits for convenience.
pub mod prelude {
    pub use super::*;
    pub use crate::data::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::strategy::*;

    #[cfg(feature = "report")]
    pub use crate::report::*;
}

/// Percentage arithmetic used by price ladders.
pub trait PercentCalculus<Rhs = Self> {
    /// Moves the value by a signed percentage.
    ///
    /// ### Arguments
    /// * `percent` - The percentage to apply (e.g., 10.0 for +10%, -5.0 for -5%).
    ///
    /// ### Returns
    /// `self * (100 + percent) / 100`.
    fn shift_percent(self, percent: Rhs) -> Self;

    /// Calculates the percentage change between two values.
    ///
    /// ### Arguments
    /// * `new` - The new value to compare with.
    ///
    /// ### Returns
    /// The percentage change from the original value to the new value, `0` when the original
    /// value is zero.
    fn change_percent(self, new: Rhs) -> Self;
}

impl PercentCalculus for f64 {
    fn shift_percent(self, percent: Self) -> Self {
        self + self * percent / 100.0
    }

    fn change_percent(self, new: Self) -> Self {
        if self == 0.0 {
            return 0.0;
        }
        (new - self) / self * 100.0
    }
}
