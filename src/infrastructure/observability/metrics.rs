//! Prometheus metrics for screening scans
//!
//! All metrics use the `screener_` prefix. Nothing is served; callers render
//! the registry to text and ship it wherever they like.

use prometheus::{
    CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ScanMetrics {
    registry: Arc<Registry>,
    /// Instruments processed, by outcome (qualified, filtered, skipped, failed)
    pub instruments_total: CounterVec,
    /// Wall time of a full scan
    pub scan_duration_seconds: Histogram,
    /// Qualified instruments in the most recent scan
    pub last_scan_qualified: GenericGauge<AtomicF64>,
    /// Rate-limit retries issued against the data provider
    pub throttle_retries_total: CounterVec,
}

impl ScanMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let instruments_total = CounterVec::new(
            Opts::new(
                "screener_instruments_total",
                "Instruments processed by scan outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(instruments_total.clone()))?;

        let scan_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "screener_scan_duration_seconds",
                "Duration of a full universe scan in seconds",
            )
            .buckets(vec![1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0]),
        )?;
        registry.register(Box::new(scan_duration_seconds.clone()))?;

        let last_scan_qualified = Gauge::with_opts(Opts::new(
            "screener_last_scan_qualified",
            "Qualified instruments in the most recent scan",
        ))?;
        registry.register(Box::new(last_scan_qualified.clone()))?;

        let throttle_retries_total = CounterVec::new(
            Opts::new(
                "screener_throttle_retries_total",
                "Retries issued after a rate-limit response",
            ),
            &["provider"],
        )?;
        registry.register(Box::new(throttle_retries_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            instruments_total,
            scan_duration_seconds,
            last_scan_qualified,
            throttle_retries_total,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_outcome(&self, outcome: &str, count: u64) {
        self.instruments_total
            .with_label_values(&[outcome])
            .inc_by(count as f64);
    }

    pub fn inc_throttle_retry(&self, provider: &str) {
        self.throttle_retries_total
            .with_label_values(&[provider])
            .inc();
    }
}
