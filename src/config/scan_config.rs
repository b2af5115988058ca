//! Instrument filters and scan scheduling.

use super::{parse_f64, parse_u64, parse_usize};
use crate::domain::market::timeframe::Timeframe;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_price: f64,
    pub max_price: f64,
    pub min_volume: f64,
    pub min_bars: usize,
    pub min_confidence: f64,
    pub top_n: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_price: 5.0,
            max_price: 500.0,
            min_volume: 1_000_000.0,
            min_bars: 50,
            min_confidence: 0.0,
            top_n: 20,
        }
    }
}

impl FilterConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            min_price: parse_f64("SCREENER_MIN_PRICE", d.min_price)?,
            max_price: parse_f64("SCREENER_MAX_PRICE", d.max_price)?,
            min_volume: parse_f64("SCREENER_MIN_VOLUME", d.min_volume)?,
            min_bars: parse_usize("SCREENER_MIN_BARS", d.min_bars)?,
            min_confidence: parse_f64("SCREENER_MIN_CONFIDENCE", d.min_confidence)?,
            top_n: parse_usize("SCREENER_TOP_N", d.top_n)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub timeframe: Timeframe,
    pub lookback_days: i64,
    /// Pause between consecutive provider requests
    pub request_delay_ms: u64,
    /// Pause before the single retry after a rate-limit response
    pub throttle_backoff_ms: u64,
    pub universe_cache_ttl_secs: u64,
    pub universe_cache_path: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::FiveMin,
            lookback_days: 5,
            request_delay_ms: 10_000,
            throttle_backoff_ms: 60_000,
            universe_cache_ttl_secs: 24 * 60 * 60,
            universe_cache_path: PathBuf::from("data/universe_cache.json"),
        }
    }
}

impl ScanConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let timeframe = env::var("SCREENER_TIMEFRAME")
            .unwrap_or_else(|_| d.timeframe.to_string())
            .parse::<Timeframe>()
            .context("Failed to parse SCREENER_TIMEFRAME")?;
        let lookback_days = env::var("SCREENER_LOOKBACK_DAYS")
            .unwrap_or_else(|_| d.lookback_days.to_string())
            .parse::<i64>()
            .context("Failed to parse SCREENER_LOOKBACK_DAYS")?;

        Ok(Self {
            timeframe,
            lookback_days,
            request_delay_ms: parse_u64("SCREENER_REQUEST_DELAY_MS", d.request_delay_ms)?,
            throttle_backoff_ms: parse_u64("SCREENER_THROTTLE_BACKOFF_MS", d.throttle_backoff_ms)?,
            universe_cache_ttl_secs: parse_u64(
                "SCREENER_UNIVERSE_CACHE_TTL_SECS",
                d.universe_cache_ttl_secs,
            )?,
            universe_cache_path: env::var("SCREENER_UNIVERSE_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.universe_cache_path),
        })
    }

    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(self.lookback_days)
    }
}
