use thiserror::Error;

/// Why a single instrument could not be screened.
///
/// The scanner applies a different partial-failure policy per variant:
/// `NoData` and `InsufficientHistory` count as skips, `TransientFetch` and
/// `Throttled` as per-instrument failures, `Configuration` aborts the scan.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScreenError {
    #[error("No market data returned")]
    NoData,

    #[error("Insufficient history: {bars} bars < {required} required")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("Transient fetch failure: {reason}")]
    TransientFetch { reason: String },

    #[error("Throttled by data provider: retry after {retry_after_secs}s")]
    Throttled { retry_after_secs: u64 },

    #[error("Fatal configuration error: {0}")]
    Configuration(String),
}

impl ScreenError {
    /// Skips are silent outcomes that only show up in the scan counts.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ScreenError::NoData | ScreenError::InsufficientHistory { .. }
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ScreenError::Configuration(_))
    }
}

/// Errors raised at the market-data provider boundary
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarketDataError {
    #[error("No data available for {symbol}")]
    NotFound { symbol: String },

    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("Invalid market data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },

    #[error("Service timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },
}

impl From<MarketDataError> for ScreenError {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::NotFound { .. } => ScreenError::NoData,
            MarketDataError::RateLimitExceeded { retry_after_secs } => {
                ScreenError::Throttled { retry_after_secs }
            }
            other => ScreenError::TransientFetch {
                reason: other.to_string(),
            },
        }
    }
}

/// Violations of the bar series invariants
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BarSeriesError {
    #[error("Timestamps not strictly increasing at index {index}")]
    NonMonotonicTimestamp { index: usize },

    #[error("Inconsistent OHLC at index {index}: {reason}")]
    InconsistentRange { index: usize, reason: String },

    #[error("Negative volume at index {index}")]
    NegativeVolume { index: usize },

    #[error("Non-finite value at index {index}")]
    NonFinite { index: usize },
}

impl From<BarSeriesError> for ScreenError {
    fn from(err: BarSeriesError) -> Self {
        ScreenError::TransientFetch {
            reason: format!("malformed bar series: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_error_formatting() {
        let err = ScreenError::InsufficientHistory {
            bars: 12,
            required: 50,
        };

        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("50"));
        assert!(err.is_skip());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_rate_limit_maps_to_throttled() {
        let err: ScreenError = MarketDataError::RateLimitExceeded {
            retry_after_secs: 60,
        }
        .into();
        assert_eq!(
            err,
            ScreenError::Throttled {
                retry_after_secs: 60
            }
        );
    }

    #[test]
    fn test_not_found_maps_to_no_data() {
        let err: ScreenError = MarketDataError::NotFound {
            symbol: "ZZZZ".to_string(),
        }
        .into();
        assert!(err.is_skip());
    }

    #[test]
    fn test_connection_loss_is_transient() {
        let err: ScreenError = MarketDataError::ConnectionLost {
            reason: "reset by peer".to_string(),
        }
        .into();
        assert!(matches!(err, ScreenError::TransientFetch { .. }));
        assert!(!err.is_skip());
    }
}
