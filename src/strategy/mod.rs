//! Trading policies driving an [`Account`] candle by candle.

mod grid;

pub use grid::*;

use crate::{
    engine::{Account, Candle},
    errors::Result,
};

/// A trading policy.
///
/// The simulation calls [`Strategy::execute`] once per candle, after the account observed
/// the candle's price. Trade rejections are ordinary outcomes handled inside `execute`; an
/// error means the strategy cannot go on and stops the simulation.
///
/// Closures `FnMut(&mut Account, &Candle) -> Result<()>` are strategies too.
pub trait Strategy {
    /// Inspects the account and the candle and issues trades or entrusts.
    fn execute(&mut self, account: &mut Account, candle: &Candle) -> Result<()>;

    /// Describes the configured behavior, for reports.
    fn describe(&self) -> String;
}

impl<F> Strategy for F
where
    F: FnMut(&mut Account, &Candle) -> Result<()>,
{
    fn execute(&mut self, account: &mut Account, candle: &Candle) -> Result<()> {
        self(account, candle)
    }

    fn describe(&self) -> String {
        "custom closure strategy".to_owned()
    }
}
