//! Core trading engine components.
//!
//! This module provides the fundamental types for simulating:
//! - `Candle`: OHLCV data of one time bucket.
//! - `Account`: cash, holdings, entrust books, logs and statistics.
//! - `Entrust`: conditional orders triggered by price crossings.
//! - `Simulation`: the driver replaying candles against a strategy.

mod account;
mod candle;
mod entrust;
mod record;
mod simulation;
mod stats;

pub use account::*;
pub use candle::*;
pub use entrust::*;
pub use record::*;
pub use simulation::*;
pub use stats::*;
