use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::Side;

/// An executed trade.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeRecord {
    timestamp: i64,
    side: Side,
    price: f64,
    volume: u64,
}

impl From<(i64, Side, f64, u64)> for TradeRecord {
    fn from((timestamp, side, price, volume): (i64, Side, f64, u64)) -> Self {
        Self {
            timestamp,
            side,
            price,
            volume,
        }
    }
}

impl TradeRecord {
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// Traded value, `price * volume`.
    pub fn value(&self) -> f64 {
        self.price * self.volume as f64
    }
}

/// Kind of an audited account action.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// A buy was executed.
    Bought,
    /// A sell was executed.
    Sold,
    /// An entrust was created.
    Entrusted,
    /// A trade was rejected.
    GaveUp,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bought => write!(f, "bought"),
            Self::Sold => write!(f, "sold"),
            Self::Entrusted => write!(f, "entrusted"),
            Self::GaveUp => write!(f, "gave up"),
        }
    }
}

/// Audit log entry.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    timestamp: i64,
    kind: ActionKind,
    desc: String,
}

impl From<(i64, ActionKind, String)> for Action {
    fn from((timestamp, kind, desc): (i64, ActionKind, String)) -> Self {
        Self { timestamp, kind, desc }
    }
}

impl Action {
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Human readable description.
    pub fn desc(&self) -> &str {
        &self.desc
    }
}
