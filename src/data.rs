use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    engine::Candle,
    errors::{Error, Result},
};

/// A candle series of one instrument, with the metadata of its source.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    #[cfg_attr(feature = "serde", serde(default))]
    code: String,
    #[cfg_attr(feature = "serde", serde(default))]
    name: String,
    // unix seconds
    #[cfg_attr(feature = "serde", serde(default, alias = "updateTime"))]
    update_time: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    from: String,
    #[cfg_attr(feature = "serde", serde(default))]
    to: String,
    #[cfg_attr(feature = "serde", serde(alias = "kLines"))]
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Creates a series from its identity and candles.
    pub fn new(code: impl Into<String>, name: impl Into<String>, candles: Vec<Candle>) -> Self {
        let from = candles.first().map(date_label).unwrap_or_default();
        let to = candles.last().map(date_label).unwrap_or_default();
        Self {
            code: code.into(),
            name: name.into(),
            update_time: 0,
            from,
            to,
            candles,
        }
    }

    /// Sets the time the data was fetched.
    pub fn with_update_time(mut self, update_time: i64) -> Self {
        self.update_time = update_time;
        self
    }

    /// Instrument code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Instrument name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn update_time(&self) -> i64 {
        self.update_time
    }

    /// Label of the first bucket, as given by the source.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Label of the last bucket, as given by the source.
    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Checks that the series can be replayed: not empty, every candle valid, timestamps
    /// strictly increasing.
    pub fn validate(&self) -> Result<()> {
        if self.candles.is_empty() {
            return Err(Error::CandleDataEmpty);
        }
        for candle in &self.candles {
            candle.validate()?;
        }
        for pair in self.candles.windows(2) {
            if pair[1].timestamp() <= pair[0].timestamp() {
                return Err(Error::UnorderedCandles {
                    previous: pair[0].timestamp(),
                    timestamp: pair[1].timestamp(),
                });
            }
        }
        Ok(())
    }

    /// Shared candle data for a [`Simulation`](crate::engine::Simulation).
    pub fn to_data(&self) -> Arc<[Candle]> {
        Arc::from(self.candles.as_slice())
    }
}

fn date_label(candle: &Candle) -> String {
    candle
        .datetime()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(feature = "serde")]
/// Reads a candle series from a JSON file at `filepath` and validates it.
pub fn read_series_from_file(filepath: impl AsRef<std::path::Path>) -> Result<CandleSeries> {
    use std::{fs::File, io::BufReader};

    let file = File::open(filepath)?;
    let reader = BufReader::new(file);
    let series: CandleSeries = serde_json::from_reader(reader)?;
    series.validate()?;
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CandleBuilder;

    const T: i64 = 1_664_553_600;

    fn candle(timestamp: i64) -> Candle {
        CandleBuilder::builder()
            .timestamp(timestamp)
            .open(10.0)
            .close(10.5)
            .high(11.0)
            .low(9.5)
            .build()
            .unwrap()
    }

    #[test]
    fn new_labels_range() {
        let series = CandleSeries::new("600000", "Pudong Bank", vec![candle(T), candle(T + 86_400)]);
        assert_eq!(series.from(), "2022-09-30");
        assert_eq!(series.to(), "2022-10-01");
        assert_eq!(series.len(), 2);
        assert!(series.validate().is_ok());
        assert_eq!(series.to_data().len(), 2);
    }

    #[test]
    fn validate_rejects_empty() {
        let series = CandleSeries::new("600000", "Pudong Bank", vec![]);
        assert!(matches!(series.validate(), Err(Error::CandleDataEmpty)));
    }

    #[test]
    fn validate_rejects_unordered() {
        let series = CandleSeries::new("600000", "Pudong Bank", vec![candle(T), candle(T)]);
        assert!(matches!(
            series.validate(),
            Err(Error::UnorderedCandles { previous: T, timestamp: T })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_market_keys() {
        let json = r#"{
            "code": "600000",
            "name": "Pudong Bank",
            "updateTime": 1664600000,
            "length": 2,
            "from": "2022-09-30",
            "to": "2022-10-01",
            "kLines": [
                {"sjc": 1664553600, "kpj": 10.0, "spj": 10.5, "zgj": 11.0, "zdj": 9.5, "cjl": 12000.0},
                {"sjc": 1664640000, "kpj": 10.5, "spj": 10.2, "zgj": 10.8, "zdj": 10.1, "hsl": 0.3}
            ]
        }"#;
        let series: CandleSeries = serde_json::from_str(json).unwrap();
        assert!(series.validate().is_ok());
        assert_eq!(series.update_time(), 1_664_600_000);
        assert_eq!(series.candles()[0].volume(), 12000.0);
        assert_eq!(series.candles()[1].turnover(), 0.3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn read_missing_file() {
        let result = read_series_from_file("/nonexistent/kline.json");
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
