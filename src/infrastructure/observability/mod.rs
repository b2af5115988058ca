//! Scan observability. Metrics are collected in-process and rendered on
//! demand; there is no HTTP endpoint.

pub mod metrics;

pub use metrics::ScanMetrics;
