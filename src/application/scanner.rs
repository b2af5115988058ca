use crate::application::pipeline::ScreeningPipeline;
use crate::config::ScanConfig;
use crate::domain::errors::{MarketDataError, ScreenError};
use crate::domain::market::instrument::InstrumentData;
use crate::domain::ports::MarketDataProvider;
use crate::domain::screening::{ScreenOutcome, ScreenResult, SkipReason, Variant};
use crate::domain::sentiment::{SentimentScore, SentimentSource};
use crate::infrastructure::observability::ScanMetrics;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const EMPTY_SCAN_MESSAGE: &str = "No instruments met the screening criteria. \
     Try loosening the filters (lower min_price, min_volume or min_confidence, \
     or raise max_price).";

/// An instrument left out of the ranked results, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanIssue {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub variant: Variant,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub universe_size: usize,
    /// Ranked by confidence, truncated to top N
    pub results: Vec<ScreenResult>,
    /// Qualified instruments before truncation
    pub qualified: usize,
    /// Rejected by price, volume or confidence filters
    pub filtered: Vec<ScanIssue>,
    /// Not enough data to analyze
    pub skipped: Vec<ScanIssue>,
    /// Fetch or processing failures
    pub failures: Vec<ScanIssue>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Explicit message for a scan with nothing to show
    pub fn empty_state_message(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_SCAN_MESSAGE)
    }

    pub fn summary(&self) -> String {
        format!(
            "Scan {} ({}): {} instruments, {} qualified, {} filtered, {} skipped, {} failed",
            self.scan_id,
            self.variant,
            self.universe_size,
            self.qualified,
            self.filtered.len(),
            self.skipped.len(),
            self.failures.len()
        )
    }
}

/// Ranks by confidence descending, ticker ascending on ties
pub fn rank_results(results: &mut [ScreenResult]) {
    results.sort_by(|a, b| {
        b.confidence_score
            .total_cmp(&a.confidence_score)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
}

/// Runs the screening pipeline across a universe.
///
/// Fetches are serialized with a fixed delay between requests and a single
/// retry after a rate-limit response. The analytic stage then runs in
/// parallel since each instrument is independent.
pub struct MarketScanner {
    provider: Arc<dyn MarketDataProvider>,
    pipeline: Arc<ScreeningPipeline>,
    sentiment: Option<Arc<dyn SentimentSource>>,
    scan_config: ScanConfig,
    top_n: usize,
    metrics: Option<ScanMetrics>,
}

impl MarketScanner {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        pipeline: Arc<ScreeningPipeline>,
        scan_config: ScanConfig,
    ) -> Self {
        let top_n = pipeline.filters().top_n;
        Self {
            provider,
            pipeline,
            sentiment: None,
            scan_config,
            top_n,
            metrics: None,
        }
    }

    pub fn with_sentiment(mut self, source: Arc<dyn SentimentSource>) -> Self {
        self.sentiment = Some(source);
        self
    }

    pub fn with_metrics(mut self, metrics: ScanMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub async fn scan(&self, tickers: &[String]) -> Result<ScanReport, ScreenError> {
        let scan_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(
            "MarketScanner: scan {} started over {} instruments ({})",
            scan_id,
            tickers.len(),
            self.pipeline.variant()
        );

        let mut skipped = Vec::new();
        let mut failures = Vec::new();
        let mut fetched: Vec<(InstrumentData, Option<SentimentScore>)> = Vec::new();

        // 1. Serialized fetch stage
        let delay = Duration::from_millis(self.scan_config.request_delay_ms);
        for (i, ticker) in tickers.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                time::sleep(delay).await;
            }

            match self.fetch_with_retry(ticker).await {
                Ok(data) => {
                    let sentiment = self.sentiment_for(ticker).await;
                    fetched.push((data, sentiment));
                }
                Err(e) if e.is_fatal() => {
                    error!("MarketScanner: aborting scan {}: {}", scan_id, e);
                    return Err(e);
                }
                Err(e) if e.is_skip() => {
                    debug!("MarketScanner: skipping {}: {}", ticker, e);
                    skipped.push(issue(ticker, &e));
                }
                Err(e) => {
                    warn!("MarketScanner: failed to fetch {}: {}", ticker, e);
                    failures.push(issue(ticker, &e));
                }
            }
        }

        // 2. Parallel analytic stage
        let pipeline = &self.pipeline;
        let analyzed: Vec<(String, Result<ScreenOutcome, ScreenError>)> = fetched
            .par_iter()
            .map(|(data, sentiment)| {
                (
                    data.series.ticker().to_string(),
                    pipeline.analyze(data, *sentiment),
                )
            })
            .collect();

        let mut results = Vec::new();
        let mut filtered = Vec::new();
        for (ticker, outcome) in analyzed {
            match outcome {
                Ok(ScreenOutcome::Qualified(result)) => results.push(*result),
                Ok(ScreenOutcome::Skipped(reason)) => filtered.push(filtered_issue(&ticker, &reason)),
                Err(e) if e.is_fatal() => {
                    error!("MarketScanner: aborting scan {}: {}", scan_id, e);
                    return Err(e);
                }
                Err(e) if e.is_skip() => skipped.push(issue(&ticker, &e)),
                Err(e) => {
                    warn!("MarketScanner: failed to analyze {}: {}", ticker, e);
                    failures.push(issue(&ticker, &e));
                }
            }
        }

        // 3. Rank and truncate
        let qualified = results.len();
        rank_results(&mut results);
        results.truncate(self.top_n);

        let report = ScanReport {
            scan_id,
            variant: self.pipeline.variant(),
            started_at,
            finished_at: Utc::now(),
            universe_size: tickers.len(),
            results,
            qualified,
            filtered,
            skipped,
            failures,
        };

        if let Some(metrics) = &self.metrics {
            metrics.inc_outcome("qualified", report.qualified as u64);
            metrics.inc_outcome("filtered", report.filtered.len() as u64);
            metrics.inc_outcome("skipped", report.skipped.len() as u64);
            metrics.inc_outcome("failed", report.failures.len() as u64);
            metrics
                .scan_duration_seconds
                .observe(clock.elapsed().as_secs_f64());
            metrics.last_scan_qualified.set(report.qualified as f64);
        }

        info!("MarketScanner: {}", report.summary());
        if let Some(message) = report.empty_state_message() {
            info!("MarketScanner: {}", message);
        }
        Ok(report)
    }

    /// One bounded retry after a fixed backoff when the provider throttles
    async fn fetch_with_retry(&self, ticker: &str) -> Result<InstrumentData, ScreenError> {
        let timeframe = self.scan_config.timeframe;
        let lookback = self.scan_config.lookback();

        match self.provider.fetch_bars(ticker, timeframe, lookback).await {
            Err(MarketDataError::RateLimitExceeded { retry_after_secs }) => {
                let backoff = Duration::from_millis(self.scan_config.throttle_backoff_ms);
                warn!(
                    "MarketScanner: rate limited on {} (provider asked for {}s), retrying once in {:?}",
                    ticker, retry_after_secs, backoff
                );
                if let Some(metrics) = &self.metrics {
                    metrics.inc_throttle_retry("market_data");
                }
                time::sleep(backoff).await;
                self.provider
                    .fetch_bars(ticker, timeframe, lookback)
                    .await
                    .map_err(ScreenError::from)
            }
            other => other.map_err(ScreenError::from),
        }
    }

    async fn sentiment_for(&self, ticker: &str) -> Option<SentimentScore> {
        if !self.pipeline.variant().uses_sentiment() {
            return None;
        }
        let source = self.sentiment.as_ref()?;
        match source.sentiment_for(ticker).await {
            Ok(score) => score,
            Err(e) => {
                warn!("MarketScanner: sentiment unavailable for {}: {}", ticker, e);
                None
            }
        }
    }
}

fn issue(ticker: &str, error: &ScreenError) -> ScanIssue {
    ScanIssue {
        ticker: ticker.to_string(),
        reason: error.to_string(),
    }
}

fn filtered_issue(ticker: &str, reason: &SkipReason) -> ScanIssue {
    ScanIssue {
        ticker: ticker.to_string(),
        reason: reason.to_string(),
    }
}
