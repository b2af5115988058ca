// Bar series, timeframes and instrument reference data
pub mod market;

// Feature layout shared by the feature builder and the predictor
pub mod ml;

// Port interfaces
pub mod ports;

// Sentiment scores and sources
pub mod sentiment;

// Discrete indicator signals
pub mod signals;

// Result records, variants and classifications
pub mod screening;

// Domain-specific error types
pub mod errors;
