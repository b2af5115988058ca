use crate::domain::errors::BarSeriesError;
use serde::{Deserialize, Serialize};

/// One OHLCV sample. `timestamp` is unix seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    fn validate(&self, index: usize) -> Result<(), BarSeriesError> {
        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BarSeriesError::NonFinite { index });
        }
        if self.high < self.open.max(self.close) {
            return Err(BarSeriesError::InconsistentRange {
                index,
                reason: format!(
                    "high {} below max(open {}, close {})",
                    self.high, self.open, self.close
                ),
            });
        }
        if self.low > self.open.min(self.close) {
            return Err(BarSeriesError::InconsistentRange {
                index,
                reason: format!(
                    "low {} above min(open {}, close {})",
                    self.low, self.open, self.close
                ),
            });
        }
        if self.volume < 0.0 {
            return Err(BarSeriesError::NegativeVolume { index });
        }
        Ok(())
    }
}

/// Ordered, validated bar history for one instrument.
///
/// Immutable once constructed: fields are private and only exposed through
/// slices and copies.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarSeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.validate(index)?;
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(BarSeriesError::NonMonotonicTimestamp { index });
            }
        }

        Ok(Self {
            ticker: ticker.into(),
            bars,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The bar before the latest one, or the latest itself for single-bar series
    pub fn previous(&self) -> Option<&Bar> {
        match self.bars.len() {
            0 => None,
            1 => self.bars.first(),
            n => self.bars.get(n - 2),
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn typical_prices(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::typical_price).collect()
    }

    pub fn mean_volume(&self) -> Option<f64> {
        if self.bars.is_empty() {
            return None;
        }
        Some(self.bars.iter().map(|b| b.volume).sum::<f64>() / self.bars.len() as f64)
    }

    /// Percent change from the first to the last close of the window
    pub fn price_change_pct(&self) -> Option<f64> {
        let first = self.bars.first()?.close;
        let last = self.bars.last()?.close;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar {
            timestamp: ts,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_valid_series() {
        let series = BarSeries::new("AAPL", vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.ticker(), "AAPL");
        assert_eq!(series.latest().unwrap().close, 12.0);
        assert_eq!(series.previous().unwrap().close, 11.0);
        assert!((series.price_change_pct().unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        let err = BarSeries::new("AAPL", vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert_eq!(err, BarSeriesError::NonMonotonicTimestamp { index: 1 });
    }

    #[test]
    fn test_rejects_high_below_close() {
        let mut broken = bar(1, 10.0);
        broken.high = 9.5;
        let err = BarSeries::new("AAPL", vec![broken]).unwrap_err();
        assert!(matches!(err, BarSeriesError::InconsistentRange { index: 0, .. }));
    }

    #[test]
    fn test_rejects_negative_volume() {
        let mut broken = bar(1, 10.0);
        broken.volume = -5.0;
        let err = BarSeries::new("AAPL", vec![broken]).unwrap_err();
        assert_eq!(err, BarSeriesError::NegativeVolume { index: 0 });
    }

    #[test]
    fn test_single_bar_previous_is_latest() {
        let series = BarSeries::new("AAPL", vec![bar(1, 10.0)]).unwrap();
        assert_eq!(series.previous(), series.latest());
    }

    #[test]
    fn test_empty_series_is_allowed() {
        let series = BarSeries::new("AAPL", vec![]).unwrap();
        assert!(series.is_empty());
        assert!(series.latest().is_none());
        assert!(series.mean_volume().is_none());
    }
}
