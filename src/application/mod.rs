// Technical indicator library
pub mod indicators;

// Signal generation and predictor features
pub mod market_data;

// Learned up/down predictor
pub mod ml;

// Confidence fusion and classification
pub mod scoring;

// Per-instrument pipeline and universe scanner
pub mod pipeline;
pub mod scanner;
