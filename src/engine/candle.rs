#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};

use crate::errors::{Error, Result};

/// One time bucket of price action (a K-line node).
///
/// Timestamps are unix seconds. Percentage fields are carried as given by the data source.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Candle {
    #[cfg_attr(feature = "serde", serde(alias = "sjc"))]
    timestamp: i64,
    #[cfg_attr(feature = "serde", serde(alias = "kpj"))]
    open: f64,
    #[cfg_attr(feature = "serde", serde(alias = "spj"))]
    close: f64,
    #[cfg_attr(feature = "serde", serde(alias = "zgj"))]
    high: f64,
    #[cfg_attr(feature = "serde", serde(alias = "zdj"))]
    low: f64,
    // traded value
    #[cfg_attr(feature = "serde", serde(default, alias = "cje"))]
    amount: f64,
    // traded volume
    #[cfg_attr(feature = "serde", serde(default, alias = "cjl"))]
    volume: f64,
    #[cfg_attr(feature = "serde", serde(default, alias = "zf"))]
    amplitude: f64,
    #[cfg_attr(feature = "serde", serde(default, alias = "zdf"))]
    change_pct: f64,
    #[cfg_attr(feature = "serde", serde(default, alias = "zde"))]
    change: f64,
    #[cfg_attr(feature = "serde", serde(default, alias = "hsl"))]
    turnover: f64,
}

impl Candle {
    /// Unix timestamp (seconds) of the bucket.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Timestamp as a UTC datetime, if representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    /// Traded value over the period.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Traded volume over the period.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Amplitude in percent.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Price change in percent.
    pub fn change_pct(&self) -> f64 {
        self.change_pct
    }

    /// Price change amount.
    pub fn change(&self) -> f64 {
        self.change
    }

    /// Turnover rate in percent.
    pub fn turnover(&self) -> f64 {
        self.turnover
    }

    /// Mid price of the period, `(high + low) / 2`.
    pub fn average_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Checks `low <= open, close <= high` with finite prices.
    pub fn validate(&self) -> Result<()> {
        let prices = [self.open, self.close, self.high, self.low];
        let finite = prices.iter().all(|p| p.is_finite());
        let ordered = self.low <= self.open.min(self.close) && self.open.max(self.close) <= self.high;
        if !finite || !ordered {
            return Err(Error::InvalidCandle(self.timestamp));
        }
        Ok(())
    }
}

/// Builder for [`Candle`]. Prices and timestamp are required, the rest defaults to zero.
#[derive(Debug, Default)]
pub struct CandleBuilder {
    timestamp: Option<i64>,
    open: Option<f64>,
    close: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    amount: f64,
    volume: f64,
    amplitude: f64,
    change_pct: f64,
    change: f64,
    turnover: f64,
}

impl CandleBuilder {
    /// Starts an empty builder.
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn open(mut self, open: f64) -> Self {
        self.open = Some(open);
        self
    }

    pub fn close(mut self, close: f64) -> Self {
        self.close = Some(close);
        self
    }

    pub fn high(mut self, high: f64) -> Self {
        self.high = Some(high);
        self
    }

    pub fn low(mut self, low: f64) -> Self {
        self.low = Some(low);
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn change_pct(mut self, change_pct: f64) -> Self {
        self.change_pct = change_pct;
        self
    }

    pub fn change(mut self, change: f64) -> Self {
        self.change = change;
        self
    }

    pub fn turnover(mut self, turnover: f64) -> Self {
        self.turnover = turnover;
        self
    }

    /// Builds the candle, rejecting missing prices and broken `low <= open, close <= high`.
    pub fn build(self) -> Result<Candle> {
        let candle = Candle {
            timestamp: self.timestamp.ok_or(Error::IncompleteCandle("timestamp"))?,
            open: self.open.ok_or(Error::IncompleteCandle("open"))?,
            close: self.close.ok_or(Error::IncompleteCandle("close"))?,
            high: self.high.ok_or(Error::IncompleteCandle("high"))?,
            low: self.low.ok_or(Error::IncompleteCandle("low"))?,
            amount: self.amount,
            volume: self.volume,
            amplitude: self.amplitude,
            change_pct: self.change_pct,
            change: self.change,
            turnover: self.turnover,
        };
        candle.validate()?;
        Ok(candle)
    }
}
