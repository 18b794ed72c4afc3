use crate::engine::Side;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors: invalid setup, invalid data, or a strategy that cannot continue.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The candle data provided is empty. A simulation requires at least one candle.
    #[error("Candle data is empty: simulation requires at least one candle")]
    CandleDataEmpty,

    /// The initial funding is not positive.
    #[error("Initial funding must be positive (got: {0})")]
    NegZeroFund(f64),

    /// The account has no name.
    #[error("Account name must not be empty")]
    EmptyAccountName,

    /// A candle breaks `low <= open, close <= high` or carries a non finite price.
    #[error("Invalid candle at timestamp {0}: expected low <= open, close <= high")]
    InvalidCandle(i64),

    /// Candle timestamps are not strictly increasing.
    #[error("Unordered candles: timestamp {timestamp} follows {previous}")]
    UnorderedCandles {
        /// Timestamp of the preceding candle.
        previous: i64,
        /// Timestamp of the offending candle.
        timestamp: i64,
    },

    /// The candle builder is missing a required field.
    #[error("Incomplete candle: missing `{0}`")]
    IncompleteCandle(&'static str),

    /// A strategy parameter is out of range.
    #[error("Invalid strategy parameter: {0}")]
    InvalidParameter(String),

    /// The strategy reached a state it cannot recover from.
    #[error("Strategy failure: {0}")]
    Strategy(String),

    /// A trade rejection escalated by the strategy.
    #[error("Trade rejected: {0}")]
    Rejected(#[from] Rejection),

    /// The strategy failed while processing a candle; the remaining candles were skipped.
    #[error("Simulation aborted at tick {index} (timestamp {timestamp}): {source}")]
    Aborted {
        /// Position of the candle in the sequence.
        index: usize,
        /// Timestamp of the candle.
        timestamp: i64,
        /// Error returned by the strategy.
        #[source]
        source: Box<Error>,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error occurred.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Reasons a trade is not executed. These are expected outcomes, not failures of the run.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Zero volume, non positive price or a `Hold` side.
    #[error("invalid trade arguments: side={side} price={price} volume={volume}")]
    InvalidArguments {
        /// Requested side.
        side: Side,
        /// Requested unit price.
        price: f64,
        /// Requested volume.
        volume: u64,
    },

    /// Buying would need more cash than available.
    #[error("insufficient balance: required {required:.2}, available {available:.2}")]
    InsufficientBalance {
        /// Cash needed for the trade.
        required: f64,
        /// Cash on hand.
        available: f64,
    },

    /// Selling more shares than held.
    #[error("insufficient holdings: requested {requested}, held {held}")]
    InsufficientHoldings {
        /// Requested volume.
        requested: u64,
        /// Held volume.
        held: u64,
    },

    /// The side is locked by the strategy.
    #[error("{side} side is locked")]
    Locked {
        /// Locked side.
        side: Side,
    },
}
