//! Fusion weights, bonus multipliers and classifier thresholds.

use super::parse_f64;
use crate::domain::signals::SignalChannel;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed baseline confidence the advanced fusion path starts from when a
/// deployment opts into it through `FusionConfig::baseline_override`.
/// Uncalibrated placeholder.
pub const PLACEHOLDER_BASELINE_CONFIDENCE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    /// Channels absent from this map do not contribute to the base score
    pub weights: BTreeMap<SignalChannel, f64>,
    pub alignment_bonus: f64,
    pub squeeze_bonus: f64,
    /// Share of the final score taken from predictor confidence
    pub predictor_weight: f64,
    /// Points added per unit of absolute sentiment
    pub sentiment_boost_points: f64,
    /// Replaces the weighted base score when set
    pub baseline_override: Option<f64>,
}

impl FusionConfig {
    pub fn default_weights() -> BTreeMap<SignalChannel, f64> {
        BTreeMap::from([
            (SignalChannel::Rsi, 0.15),
            (SignalChannel::Macd, 0.20),
            (SignalChannel::Bollinger, 0.10),
            (SignalChannel::Vwap, 0.20),
            (SignalChannel::MovingAverage, 0.15),
            (SignalChannel::Volume, 0.10),
            (SignalChannel::Momentum, 0.10),
        ])
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let mut weights = BTreeMap::new();
        for (channel, default) in &d.weights {
            let key = format!("SCREENER_WEIGHT_{}", channel.as_str().to_uppercase());
            weights.insert(*channel, parse_f64(&key, *default)?);
        }

        let baseline_override = match std::env::var("SCREENER_BASELINE_CONFIDENCE") {
            Ok(_) => Some(parse_f64(
                "SCREENER_BASELINE_CONFIDENCE",
                PLACEHOLDER_BASELINE_CONFIDENCE,
            )?),
            Err(_) => None,
        };

        Ok(Self {
            weights,
            alignment_bonus: parse_f64("SCREENER_ALIGNMENT_BONUS", d.alignment_bonus)?,
            squeeze_bonus: parse_f64("SCREENER_SQUEEZE_BONUS", d.squeeze_bonus)?,
            predictor_weight: parse_f64("SCREENER_PREDICTOR_WEIGHT", d.predictor_weight)?,
            sentiment_boost_points: parse_f64(
                "SCREENER_SENTIMENT_BOOST_POINTS",
                d.sentiment_boost_points,
            )?,
            baseline_override,
        })
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: Self::default_weights(),
            alignment_bonus: 1.20,
            squeeze_bonus: 1.10,
            predictor_weight: 0.3,
            sentiment_boost_points: 10.0,
            baseline_override: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveEstimatorConfig {
    /// Number of directional channels the strength multiplier normalizes by
    pub directional_channels: f64,
    pub volume_amplifier: f64,
    pub predictor_nudge: f64,
    pub sentiment_scale: f64,
    /// Closes used for the volatility fallback when ATR is undefined
    pub fallback_window: usize,
}

impl Default for MoveEstimatorConfig {
    fn default() -> Self {
        Self {
            directional_channels: 6.0,
            volume_amplifier: 1.2,
            predictor_nudge: 0.5,
            sentiment_scale: 2.0,
            fallback_window: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionThresholds {
    /// Five-class: |sum| above this is STRONG
    pub strong: f64,
    /// Three-class: |sum| above this leaves NEUTRAL
    pub basic: f64,
    /// Up-probability above which the predictor votes long
    pub predictor_threshold: f64,
    pub predictor_vote: f64,
    pub sentiment_scale: f64,
}

impl Default for DirectionThresholds {
    fn default() -> Self {
        Self {
            strong: 2.0,
            basic: 1.0,
            predictor_threshold: 0.6,
            predictor_vote: 1.0,
            sentiment_scale: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub low_volatility_pct: f64,
    pub high_volatility_pct: f64,
    pub low_beta: f64,
    pub high_beta: f64,
    pub low_volume_ratio: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_volatility_pct: 2.0,
            high_volatility_pct: 5.0,
            low_beta: 1.2,
            high_beta: 1.5,
            low_volume_ratio: 1.5,
        }
    }
}

impl RiskThresholds {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            low_volatility_pct: parse_f64("SCREENER_LOW_VOLATILITY_PCT", d.low_volatility_pct)?,
            high_volatility_pct: parse_f64(
                "SCREENER_HIGH_VOLATILITY_PCT",
                d.high_volatility_pct,
            )?,
            low_beta: parse_f64("SCREENER_LOW_BETA", d.low_beta)?,
            high_beta: parse_f64("SCREENER_HIGH_BETA", d.high_beta)?,
            low_volume_ratio: parse_f64("SCREENER_LOW_VOLUME_RATIO", d.low_volume_ratio)?,
        })
    }
}
