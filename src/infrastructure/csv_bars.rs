//! Bar history from CSV files, one file per ticker.
//!
//! Layout: `<dir>/<TICKER>.csv` with a `timestamp,open,high,low,close,volume`
//! header. Timestamps may be unix seconds, RFC 3339 or `YYYY-MM-DD`. An
//! optional `<dir>/profiles.json` maps tickers to instrument profiles.

use crate::domain::errors::MarketDataError;
use crate::domain::market::bar::{Bar, BarSeries};
use crate::domain::market::instrument::{InstrumentData, InstrumentProfile};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::MarketDataProvider;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Some(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Parse CSV content into bars, sorted by timestamp
pub fn parse_bars(content: &str, ticker: &str) -> Result<Vec<Bar>, MarketDataError> {
    let invalid = |reason: String| MarketDataError::InvalidData {
        symbol: ticker.to_string(),
        reason,
    };

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();
    for (line, result) in reader.deserialize().enumerate() {
        let record: BarRecord = result.map_err(|e| invalid(format!("row {}: {}", line + 1, e)))?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            invalid(format!(
                "row {}: unrecognized timestamp '{}'",
                line + 1,
                record.timestamp
            ))
        })?;
        bars.push(Bar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Load one ticker's full history from a CSV file
pub fn load_series(path: &Path, ticker: &str) -> anyhow::Result<BarSeries> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bars from {:?}", path))?;
    let bars = parse_bars(&content, ticker)?;
    BarSeries::new(ticker, bars).with_context(|| format!("Invalid bar series in {:?}", path))
}

pub struct CsvBarProvider {
    dir: PathBuf,
    profiles: HashMap<String, InstrumentProfile>,
}

impl CsvBarProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let profiles = Self::load_profiles(&dir.join("profiles.json"));
        Self { dir, profiles }
    }

    fn load_profiles(path: &Path) -> HashMap<String, InstrumentProfile> {
        if !path.exists() {
            return HashMap::new();
        }
        match std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|c| {
                serde_json::from_str::<HashMap<String, InstrumentProfile>>(&c)
                    .map_err(anyhow::Error::from)
            }) {
            Ok(profiles) => {
                info!("Loaded {} instrument profiles from {:?}", profiles.len(), path);
                profiles
            }
            Err(e) => {
                warn!("Ignoring unreadable profiles file {:?}: {}", path, e);
                HashMap::new()
            }
        }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker.to_uppercase()))
    }

    /// Tickers with a CSV file in the data directory
    pub fn available_tickers(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut tickers: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_uppercase()))
            .collect();
        tickers.sort();
        tickers
    }
}

#[async_trait]
impl MarketDataProvider for CsvBarProvider {
    async fn fetch_bars(
        &self,
        ticker: &str,
        timeframe: Timeframe,
        lookback: Duration,
    ) -> Result<InstrumentData, MarketDataError> {
        let path = self.path_for(ticker);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No bar file for {} at {:?}: {}", ticker, path, e);
                return Err(MarketDataError::NotFound {
                    symbol: ticker.to_string(),
                });
            }
        };

        let mut bars = parse_bars(&content, ticker)?;
        // Keep the trailing window ending at the latest bar
        if let Some(last) = bars.last().map(|b| b.timestamp) {
            let cutoff = last - lookback.num_seconds();
            bars.retain(|b| b.timestamp > cutoff);
        }
        if bars.is_empty() {
            return Err(MarketDataError::NotFound {
                symbol: ticker.to_string(),
            });
        }
        debug!(
            "Loaded {} bars for {} from {:?} (requested {})",
            bars.len(),
            ticker,
            path,
            timeframe
        );

        let series = BarSeries::new(ticker.to_uppercase(), bars).map_err(|e| {
            MarketDataError::InvalidData {
                symbol: ticker.to_string(),
                reason: e.to_string(),
            }
        })?;
        let data = InstrumentData::new(series);
        Ok(match self.profiles.get(&ticker.to_uppercase()) {
            Some(profile) => data.with_profile(profile.clone()),
            None => data,
        })
    }
}
