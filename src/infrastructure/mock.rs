use crate::domain::errors::MarketDataError;
use crate::domain::market::bar::{Bar, BarSeries};
use crate::domain::market::instrument::{InstrumentData, InstrumentProfile};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::MarketDataProvider;
use async_trait::async_trait;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

/// First synthetic bar timestamp (2023-11-14T22:13:20Z)
const BASE_TIMESTAMP: i64 = 1_700_000_000;

struct WalkParams {
    start_price: f64,
    base_volume: f64,
    drift: f64,
    beta: f64,
}

/// Offline market data for tests and demos.
///
/// Every ticker gets a seeded random walk, so the same ticker always yields
/// the same bars. Fixed series, profiles and scripted errors can be layered
/// on top per ticker.
pub struct MockMarketDataProvider {
    seed: u64,
    bar_count: usize,
    fixtures: HashMap<String, Vec<Bar>>,
    profiles: HashMap<String, InstrumentProfile>,
    scripted_errors: Mutex<HashMap<String, VecDeque<MarketDataError>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockMarketDataProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            bar_count: 390,
            fixtures: HashMap::new(),
            profiles: HashMap::new(),
            scripted_errors: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_bar_count(mut self, bar_count: usize) -> Self {
        self.bar_count = bar_count;
        self
    }

    /// Serve exactly these bars for `ticker`
    pub fn with_series(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.fixtures.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_profile(mut self, ticker: &str, profile: InstrumentProfile) -> Self {
        self.profiles.insert(ticker.to_string(), profile);
        self
    }

    /// Errors returned, in order, before `ticker` starts succeeding
    pub fn with_errors(self, ticker: &str, errors: Vec<MarketDataError>) -> Self {
        if let Ok(mut scripted) = self.scripted_errors.lock() {
            scripted.insert(ticker.to_string(), errors.into());
        }
        self
    }

    /// Number of fetches issued for `ticker`
    pub fn calls(&self, ticker: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(ticker).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn ticker_seed(&self, ticker: &str) -> u64 {
        // FNV-1a, stable across runs and platforms
        ticker.bytes().fold(0xcbf2_9ce4_8422_2325 ^ self.seed, |hash, b| {
            (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        })
    }

    /// Per-ticker walk parameters, drawn before any bar
    fn walk(&self, ticker: &str) -> (StdRng, WalkParams) {
        let mut rng = StdRng::seed_from_u64(self.ticker_seed(ticker));
        let params = WalkParams {
            start_price: rng.random_range(10.0..250.0),
            base_volume: rng.random_range(5_000.0..50_000.0),
            drift: rng.random_range(-0.0005..0.0005),
            beta: rng.random_range(0.6..1.8),
        };
        (rng, params)
    }

    /// Seeded random walk with intrabar ranges and noisy volume
    pub fn synthetic_bars(&self, ticker: &str, timeframe: Timeframe) -> Vec<Bar> {
        let (mut rng, params) = self.walk(ticker);
        let mut price = params.start_price;
        let step = timeframe.to_seconds();

        (0..self.bar_count)
            .map(|i| {
                let open = price;
                let change = params.drift + rng.random_range(-0.004..0.004);
                let close = (open * (1.0 + change)).max(0.01);
                let high = open.max(close) * (1.0 + rng.random_range(0.0..0.002));
                let low = open.min(close) * (1.0 - rng.random_range(0.0..0.002));
                let volume = (params.base_volume * rng.random_range(0.5..2.0)).round();
                price = close;

                Bar {
                    timestamp: BASE_TIMESTAMP + i as i64 * step,
                    open,
                    high,
                    low,
                    close,
                    volume,
                }
            })
            .collect()
    }

    /// Reference data consistent with the synthetic bars: daily average
    /// volume extrapolated from the per-bar base, beta drawn around 1
    pub fn synthetic_profile(&self, ticker: &str, timeframe: Timeframe) -> InstrumentProfile {
        let (_, params) = self.walk(ticker);
        // 6.5 trading hours per session
        let bars_per_day = (390 / timeframe.to_minutes()).max(1) as f64;

        InstrumentProfile {
            beta: Some(params.beta),
            avg_volume: Some((params.base_volume * 1.25 * bars_per_day).round()),
            market_cap: None,
            sector: None,
        }
    }

    fn next_scripted_error(&self, ticker: &str) -> Option<MarketDataError> {
        self.scripted_errors
            .lock()
            .ok()?
            .get_mut(ticker)?
            .pop_front()
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    async fn fetch_bars(
        &self,
        ticker: &str,
        timeframe: Timeframe,
        _lookback: Duration,
    ) -> Result<InstrumentData, MarketDataError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(ticker.to_string()).or_insert(0) += 1;
        }

        if let Some(err) = self.next_scripted_error(ticker) {
            debug!("MockMarketDataProvider: scripted error for {}: {}", ticker, err);
            return Err(err);
        }

        let (bars, synthetic) = match self.fixtures.get(ticker) {
            Some(bars) => (bars.clone(), false),
            None => (self.synthetic_bars(ticker, timeframe), true),
        };
        if bars.is_empty() {
            return Err(MarketDataError::NotFound {
                symbol: ticker.to_string(),
            });
        }

        let series = BarSeries::new(ticker, bars).map_err(|e| MarketDataError::InvalidData {
            symbol: ticker.to_string(),
            reason: e.to_string(),
        })?;
        let data = InstrumentData::new(series);
        Ok(match self.profiles.get(ticker) {
            Some(profile) => data.with_profile(profile.clone()),
            None if synthetic => data.with_profile(self.synthetic_profile(ticker, timeframe)),
            None => data,
        })
    }
}
