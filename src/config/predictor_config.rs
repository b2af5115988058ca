//! Predictor hyperparameters and sentiment switches.

use super::{parse_bool, parse_f64, parse_usize};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorParams {
    pub enabled: bool,
    /// Number of trees in the bagged ensemble
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_training_samples: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            enabled: true,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_training_samples: 100,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl PredictorParams {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let max_depth = env::var("SCREENER_PREDICTOR_MAX_DEPTH")
            .unwrap_or_else(|_| d.max_depth.to_string())
            .parse::<u16>()
            .context("Failed to parse SCREENER_PREDICTOR_MAX_DEPTH")?;
        let seed = env::var("SCREENER_PREDICTOR_SEED")
            .unwrap_or_else(|_| d.seed.to_string())
            .parse::<u64>()
            .context("Failed to parse SCREENER_PREDICTOR_SEED")?;

        Ok(Self {
            enabled: parse_bool("SCREENER_PREDICTOR_ENABLED", d.enabled)?,
            n_trees: parse_usize("SCREENER_PREDICTOR_TREES", d.n_trees)?,
            max_depth,
            min_samples_split: parse_usize(
                "SCREENER_PREDICTOR_MIN_SAMPLES_SPLIT",
                d.min_samples_split,
            )?,
            min_training_samples: parse_usize(
                "SCREENER_PREDICTOR_MIN_SAMPLES",
                d.min_training_samples,
            )?,
            test_fraction: parse_f64("SCREENER_PREDICTOR_TEST_FRACTION", d.test_fraction)?,
            seed,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub enabled: bool,
    /// Weight of the finance keyword boost relative to the VADER compound score
    pub keyword_boost_weight: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keyword_boost_weight: 0.5,
        }
    }
}

impl SentimentConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            enabled: parse_bool("SCREENER_SENTIMENT_ENABLED", d.enabled)?,
            keyword_boost_weight: parse_f64(
                "SCREENER_SENTIMENT_KEYWORD_WEIGHT",
                d.keyword_boost_weight,
            )?,
        })
    }
}
