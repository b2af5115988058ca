use crate::domain::errors::MarketDataError;
use crate::domain::market::instrument::InstrumentData;
use crate::domain::market::timeframe::Timeframe;
use async_trait::async_trait;
use chrono::Duration;

// Need async_trait for async functions in traits
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Bars for `ticker` at `timeframe` granularity covering `lookback`
    async fn fetch_bars(
        &self,
        ticker: &str,
        timeframe: Timeframe,
        lookback: Duration,
    ) -> Result<InstrumentData, MarketDataError>;
}

/// Remote list of tradable instruments
#[async_trait]
pub trait UniverseSource: Send + Sync {
    async fn fetch_universe(&self) -> anyhow::Result<Vec<String>>;

    fn name(&self) -> &str;
}
