// Indicator frames to signals and predictor features
pub mod feature_builder;
pub mod signal_generator;
