use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::Candle;

/// Direction of a trade. `Hold` is the no-op direction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
            Self::Hold => write!(f, "hold"),
        }
    }
}

/// A conditional order: trades `volume` at `price` once the market crosses `price`.
///
/// A buy entrust triggers when a candle's low reaches down to the price, a sell entrust when
/// the candle's high reaches up to it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entrust {
    start_time: i64,
    // 0 = never expires
    dead_time: i64,
    // 0 = not filled
    deal_time: i64,
    price: f64,
    volume: u64,
}

impl Entrust {
    pub(crate) fn new(price: f64, volume: u64, start_time: i64, dead_time: i64) -> Self {
        Self {
            start_time,
            dead_time,
            deal_time: 0,
            price,
            volume,
        }
    }

    /// Creation time.
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Deadline, `0` when the entrust never expires.
    pub fn dead_time(&self) -> i64 {
        self.dead_time
    }

    /// Fill time, `0` while unfilled.
    pub fn deal_time(&self) -> i64 {
        self.deal_time
    }

    /// Trigger price, also the execution price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Volume to trade.
    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// Returns `true` once the entrust has been filled.
    pub fn is_filled(&self) -> bool {
        self.deal_time != 0
    }

    /// Returns `true` when a deadline is set and `now` is past it.
    pub fn is_expired(&self, now: i64) -> bool {
        self.dead_time != 0 && now > self.dead_time
    }

    /// Returns `true` when the entrust is neither filled nor expired at `now`.
    pub fn is_pending(&self, now: i64) -> bool {
        !self.is_filled() && !self.is_expired(now)
    }

    /// Returns `true` if `candle` crosses the trigger price for the given side.
    pub fn triggered_by(&self, side: Side, candle: &Candle) -> bool {
        match side {
            Side::Sell => candle.high() >= self.price,
            Side::Buy => candle.low() <= self.price,
            Side::Hold => false,
        }
    }

    // fill time is written once
    pub(crate) fn fill(&mut self, timestamp: i64) -> bool {
        if self.is_filled() {
            return false;
        }
        self.deal_time = timestamp;
        true
    }
}

/// Entrusts of one side, kept sorted by trigger priority.
///
/// Buy books are sorted by descending price and sell books by ascending price, so the order
/// closest to the market comes first. Orders with equal prices keep their creation order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EntrustBook {
    side: Side,
    entrusts: Vec<Entrust>,
}

impl EntrustBook {
    pub(crate) fn new(side: Side) -> Self {
        Self {
            side,
            entrusts: Vec::new(),
        }
    }

    /// Side served by this book.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Entrusts in trigger priority order.
    pub fn entrusts(&self) -> &[Entrust] {
        &self.entrusts
    }

    /// Number of entrusts, resolved ones included.
    pub fn len(&self) -> usize {
        self.entrusts.len()
    }

    /// Returns `true` if the book holds no entrust.
    pub fn is_empty(&self) -> bool {
        self.entrusts.is_empty()
    }

    /// Iterates over entrusts that can still trigger at `now`.
    pub fn pending(&self, now: i64) -> impl Iterator<Item = &Entrust> {
        self.entrusts.iter().filter(move |e| e.is_pending(now))
    }

    // binary insertion after every entrust of equal or higher priority
    pub(crate) fn insert(&mut self, entrust: Entrust) {
        let side = self.side;
        let idx = self.entrusts.partition_point(|e| match side {
            Side::Buy => e.price >= entrust.price,
            _ => e.price <= entrust.price,
        });
        self.entrusts.insert(idx, entrust);
    }

    /// Index of the first entrust that can trigger on `candle`, in priority order.
    pub(crate) fn first_triggered(&self, candle: &Candle) -> Option<usize> {
        let now = candle.timestamp();
        self.entrusts
            .iter()
            .position(|e| e.is_pending(now) && e.triggered_by(self.side, candle))
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Entrust> {
        self.entrusts.get_mut(idx)
    }

    /// Removes filled and expired entrusts, returning how many were dropped.
    pub(crate) fn prune(&mut self, now: i64) -> usize {
        let before = self.entrusts.len();
        self.entrusts.retain(|e| e.is_pending(now));
        before - self.entrusts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CandleBuilder;

    fn candle(timestamp: i64, high: f64, low: f64) -> Candle {
        CandleBuilder::builder()
            .timestamp(timestamp)
            .open(low)
            .close(high)
            .high(high)
            .low(low)
            .build()
            .unwrap()
    }

    fn prices(book: &EntrustBook) -> Vec<f64> {
        book.entrusts().iter().map(|e| e.price()).collect()
    }

    #[test]
    fn buy_book_descending() {
        let mut book = EntrustBook::new(Side::Buy);
        for price in [9.0, 9.5, 8.0, 9.2, 10.0] {
            book.insert(Entrust::new(price, 100, 1, 0));
        }
        assert_eq!(prices(&book), vec![10.0, 9.5, 9.2, 9.0, 8.0]);
    }

    #[test]
    fn sell_book_ascending() {
        let mut book = EntrustBook::new(Side::Sell);
        for price in [11.0, 10.5, 12.0, 10.8] {
            book.insert(Entrust::new(price, 100, 1, 0));
        }
        assert_eq!(prices(&book), vec![10.5, 10.8, 11.0, 12.0]);
    }

    #[test]
    fn equal_prices_keep_creation_order() {
        let mut book = EntrustBook::new(Side::Sell);
        book.insert(Entrust::new(11.0, 100, 1, 0));
        book.insert(Entrust::new(11.0, 200, 2, 0));
        book.insert(Entrust::new(10.0, 300, 3, 0));
        let volumes: Vec<u64> = book.entrusts().iter().map(|e| e.volume()).collect();
        assert_eq!(volumes, vec![300, 100, 200]);
    }

    #[test]
    fn expiry() {
        let entrust = Entrust::new(10.0, 100, 1, 50);
        assert!(!entrust.is_expired(50));
        assert!(entrust.is_expired(51));

        let forever = Entrust::new(10.0, 100, 1, 0);
        assert!(!forever.is_expired(i64::MAX));
    }

    #[test]
    fn fill_only_once() {
        let mut entrust = Entrust::new(10.0, 100, 1, 0);
        assert!(entrust.fill(5));
        assert!(!entrust.fill(9));
        assert_eq!(entrust.deal_time(), 5);
        assert!(!entrust.is_pending(6));
    }

    #[test]
    fn trigger_rules() {
        let entrust = Entrust::new(10.0, 100, 1, 0);
        assert!(entrust.triggered_by(Side::Sell, &candle(2, 10.0, 9.0)));
        assert!(!entrust.triggered_by(Side::Sell, &candle(2, 9.9, 9.0)));
        assert!(entrust.triggered_by(Side::Buy, &candle(2, 11.0, 10.0)));
        assert!(!entrust.triggered_by(Side::Buy, &candle(2, 11.0, 10.1)));
        assert!(!entrust.triggered_by(Side::Hold, &candle(2, 11.0, 9.0)));
    }

    #[test]
    fn first_triggered_skips_resolved() {
        let mut book = EntrustBook::new(Side::Buy);
        book.insert(Entrust::new(10.0, 100, 1, 5)); // expires before the candle
        book.insert(Entrust::new(9.8, 100, 1, 0));
        book.insert(Entrust::new(9.5, 100, 1, 0));
        book.get_mut(1).unwrap().fill(3);

        let idx = book.first_triggered(&candle(10, 10.5, 9.4)).unwrap();
        assert_eq!(book.entrusts()[idx].price(), 9.5);
    }

    #[test]
    fn prune_keeps_order() {
        let mut book = EntrustBook::new(Side::Sell);
        book.insert(Entrust::new(10.0, 100, 1, 0));
        book.insert(Entrust::new(11.0, 100, 1, 20));
        book.insert(Entrust::new(12.0, 100, 1, 0));
        book.insert(Entrust::new(13.0, 100, 1, 0));
        book.get_mut(0).unwrap().fill(2);

        assert_eq!(book.prune(30), 2);
        assert_eq!(prices(&book), vec![12.0, 13.0]);
        assert_eq!(book.pending(30).count(), 2);
    }
}
