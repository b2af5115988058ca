//! Configuration module for the screener.
//!
//! Settings load from `SCREENER_*` environment variables with typed
//! defaults, organized by concern: filters, indicators, scoring, predictor
//! and scan scheduling. An optional TOML file can then override whole
//! sections (plus individual fusion weights).

mod indicator_config;
mod predictor_config;
mod scan_config;
mod scoring_config;

pub use indicator_config::{IndicatorSettings, SignalThresholds};
pub use predictor_config::{PredictorParams, SentimentConfig};
pub use scan_config::{FilterConfig, ScanConfig};
pub use scoring_config::{
    DirectionThresholds, FusionConfig, MoveEstimatorConfig, PLACEHOLDER_BASELINE_CONFIDENCE,
    RiskThresholds,
};

use crate::domain::screening::Variant;
use crate::domain::signals::SignalChannel;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Error type for ScreenerConfig validation
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid price bounds: min_price = {min}, max_price = {max}")]
    InvalidPriceBounds { min: f64, max: f64 },

    #[error("Invalid volume floor: {0}. Must be >= 0")]
    InvalidVolumeFloor(f64),

    #[error("Invalid min_confidence: {0}. Must be within [0, 100]")]
    InvalidMinConfidence(f64),

    #[error("Signal weights sum to {0:.3}. Must be within [0.95, 1.05]")]
    WeightSum(f64),

    #[error("Negative weight for {channel}: {value}")]
    NegativeWeight { channel: SignalChannel, value: f64 },

    #[error("Invalid period: {field} = {value}. Must be > 0")]
    InvalidPeriod { field: String, value: usize },

    #[error("Invalid bonus multiplier: {field} = {value}. Must be >= 1.0")]
    InvalidBonus { field: String, value: f64 },

    #[error("Invalid fraction: {field} = {value}")]
    InvalidFraction { field: String, value: f64 },

    #[error("Predictor minimum training samples must be >= 1")]
    InvalidMinSamples,
}

/// Top-level screener configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenerConfig {
    pub variant: Variant,
    pub filters: FilterConfig,
    pub indicators: IndicatorSettings,
    pub thresholds: SignalThresholds,
    pub fusion: FusionConfig,
    pub move_estimator: MoveEstimatorConfig,
    pub direction: DirectionThresholds,
    pub risk: RiskThresholds,
    pub predictor: PredictorParams,
    pub sentiment: SentimentConfig,
    pub scan: ScanConfig,
}

/// Sections accepted in the TOML overrides file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverrides {
    variant: Option<String>,
    filters: Option<FilterConfig>,
    indicators: Option<IndicatorSettings>,
    thresholds: Option<SignalThresholds>,
    weights: BTreeMap<String, f64>,
    fusion: Option<FusionOverrides>,
    move_estimator: Option<MoveEstimatorConfig>,
    direction: Option<DirectionThresholds>,
    risk: Option<RiskThresholds>,
    predictor: Option<PredictorParams>,
    sentiment: Option<SentimentConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FusionOverrides {
    alignment_bonus: Option<f64>,
    squeeze_bonus: Option<f64>,
    predictor_weight: Option<f64>,
    sentiment_boost_points: Option<f64>,
    baseline_override: Option<f64>,
}

impl ScreenerConfig {
    pub fn from_env() -> Result<Self> {
        let variant = Variant::from_str(
            &env::var("SCREENER_VARIANT").unwrap_or_else(|_| "basic".to_string()),
        )?;

        let filters = FilterConfig::from_env().context("Failed to load filter config")?;
        let indicators =
            IndicatorSettings::from_env().context("Failed to load indicator config")?;
        let thresholds = SignalThresholds::from_env().context("Failed to load signal thresholds")?;
        let fusion = FusionConfig::from_env().context("Failed to load fusion config")?;
        let risk = RiskThresholds::from_env().context("Failed to load risk thresholds")?;
        let predictor = PredictorParams::from_env().context("Failed to load predictor config")?;
        let sentiment = SentimentConfig::from_env().context("Failed to load sentiment config")?;
        let scan = ScanConfig::from_env().context("Failed to load scan config")?;

        Ok(Self {
            variant,
            filters,
            indicators,
            thresholds,
            fusion,
            move_estimator: MoveEstimatorConfig::default(),
            direction: DirectionThresholds::default(),
            risk,
            predictor,
            sentiment,
            scan,
        })
    }

    /// Apply a TOML overrides file on top of the current values
    pub fn apply_toml_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        self.apply_toml_str(&content)
            .with_context(|| format!("Failed to apply config file {}", path.display()))
    }

    pub fn apply_toml_str(&mut self, content: &str) -> Result<()> {
        let overrides: ConfigOverrides =
            toml::from_str(content).context("Failed to parse TOML overrides")?;

        if let Some(variant) = overrides.variant {
            self.variant = Variant::from_str(&variant)?;
        }
        if let Some(filters) = overrides.filters {
            self.filters = filters;
        }
        if let Some(indicators) = overrides.indicators {
            self.indicators = indicators;
        }
        if let Some(thresholds) = overrides.thresholds {
            self.thresholds = thresholds;
        }
        for (name, weight) in overrides.weights {
            let channel = SignalChannel::from_str(&name)
                .with_context(|| format!("Unknown weight key {}", name))?;
            self.fusion.weights.insert(channel, weight);
        }
        if let Some(fusion) = overrides.fusion {
            if let Some(v) = fusion.alignment_bonus {
                self.fusion.alignment_bonus = v;
            }
            if let Some(v) = fusion.squeeze_bonus {
                self.fusion.squeeze_bonus = v;
            }
            if let Some(v) = fusion.predictor_weight {
                self.fusion.predictor_weight = v;
            }
            if let Some(v) = fusion.sentiment_boost_points {
                self.fusion.sentiment_boost_points = v;
            }
            if fusion.baseline_override.is_some() {
                self.fusion.baseline_override = fusion.baseline_override;
            }
        }
        if let Some(move_estimator) = overrides.move_estimator {
            self.move_estimator = move_estimator;
        }
        if let Some(direction) = overrides.direction {
            self.direction = direction;
        }
        if let Some(risk) = overrides.risk {
            self.risk = risk;
        }
        if let Some(predictor) = overrides.predictor {
            self.predictor = predictor;
        }
        if let Some(sentiment) = overrides.sentiment {
            self.sentiment = sentiment;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.filters;
        if !(f.min_price >= 0.0 && f.min_price < f.max_price) {
            return Err(ConfigError::InvalidPriceBounds {
                min: f.min_price,
                max: f.max_price,
            });
        }
        if f.min_volume < 0.0 || f.min_volume.is_nan() {
            return Err(ConfigError::InvalidVolumeFloor(f.min_volume));
        }
        if !(0.0..=100.0).contains(&f.min_confidence) {
            return Err(ConfigError::InvalidMinConfidence(f.min_confidence));
        }
        self.validate_period("min_bars", f.min_bars)?;
        self.validate_period("top_n", f.top_n)?;

        for (field, value) in self.indicators.periods() {
            self.validate_period(field, value)?;
        }
        self.validate_period("momentum_window", self.thresholds.momentum_window)?;
        self.validate_period("fallback_window", self.move_estimator.fallback_window)?;

        for (channel, weight) in &self.fusion.weights {
            if *weight < 0.0 {
                return Err(ConfigError::NegativeWeight {
                    channel: *channel,
                    value: *weight,
                });
            }
        }
        let sum = self.fusion.weight_sum();
        if !(0.95..=1.05).contains(&sum) {
            return Err(ConfigError::WeightSum(sum));
        }

        self.validate_bonus("alignment_bonus", self.fusion.alignment_bonus)?;
        self.validate_bonus("squeeze_bonus", self.fusion.squeeze_bonus)?;
        self.validate_bonus("volume_amplifier", self.move_estimator.volume_amplifier)?;

        self.validate_fraction("predictor_weight", self.fusion.predictor_weight, true)?;
        self.validate_fraction(
            "squeeze_percentile",
            self.thresholds.squeeze_percentile,
            true,
        )?;

        if self.predictor.min_training_samples < 1 {
            return Err(ConfigError::InvalidMinSamples);
        }
        self.validate_period("n_trees", self.predictor.n_trees)?;
        self.validate_fraction("test_fraction", self.predictor.test_fraction, false)?;

        Ok(())
    }

    fn validate_period(&self, field: &str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::InvalidPeriod {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn validate_bonus(&self, field: &str, value: f64) -> Result<(), ConfigError> {
        if value.is_nan() || value < 1.0 {
            return Err(ConfigError::InvalidBonus {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// `inclusive` accepts the closed interval [0, 1], otherwise (0, 1)
    fn validate_fraction(&self, field: &str, value: f64, inclusive: bool) -> Result<(), ConfigError> {
        let ok = if inclusive {
            (0.0..=1.0).contains(&value)
        } else {
            value > 0.0 && value < 1.0
        };
        if !ok {
            return Err(ConfigError::InvalidFraction {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }
}

pub(crate) fn parse_usize(key: &str, default: usize) -> Result<usize> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_u64(key: &str, default: u64) -> Result<u64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_f64(key: &str, default: f64) -> Result<f64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<f64>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_bool(key: &str, default: bool) -> Result<bool> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<bool>()
        .context(format!("Failed to parse {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_are_valid() {
        let config = ScreenerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.variant, Variant::Basic);
        assert_eq!(config.filters.min_price, 5.0);
        assert_eq!(config.filters.top_n, 20);
        assert_eq!(config.predictor.n_trees, 100);
        assert_eq!(config.scan.throttle_backoff_ms, 60_000);
    }

    #[test]
    fn test_from_env_reads_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            env::set_var("SCREENER_MIN_PRICE", "10");
            env::set_var("SCREENER_VARIANT", "advanced-ml");
            env::set_var("SCREENER_WEIGHT_RSI", "0.25");
        }

        let config = ScreenerConfig::from_env().unwrap();

        unsafe {
            env::remove_var("SCREENER_MIN_PRICE");
            env::remove_var("SCREENER_VARIANT");
            env::remove_var("SCREENER_WEIGHT_RSI");
        }

        assert_eq!(config.filters.min_price, 10.0);
        assert_eq!(config.variant, Variant::AdvancedMl);
        assert_eq!(config.fusion.weights[&SignalChannel::Rsi], 0.25);
        // Weight sum is now 1.10
        assert!(matches!(config.validate(), Err(ConfigError::WeightSum(_))));
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            env::set_var("SCREENER_TOP_N", "twenty");
        }
        let result = ScreenerConfig::from_env();
        unsafe {
            env::remove_var("SCREENER_TOP_N");
        }
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_overrides() {
        let mut config = ScreenerConfig::default();
        config
            .apply_toml_str(
                r#"
variant = "advanced-sentiment"

[filters]
min_price = 1.0
max_price = 50.0

[weights]
rsi_signal = 0.10
stoch = 0.05

[fusion]
squeeze_bonus = 1.25
"#,
            )
            .unwrap();

        assert_eq!(config.variant, Variant::AdvancedSentiment);
        assert_eq!(config.filters.min_price, 1.0);
        assert_eq!(config.filters.max_price, 50.0);
        // Missing keys in a section fall back to defaults
        assert_eq!(config.filters.top_n, 20);
        assert_eq!(config.fusion.weights[&SignalChannel::Rsi], 0.10);
        assert_eq!(config.fusion.weights[&SignalChannel::Stochastic], 0.05);
        assert_eq!(config.fusion.squeeze_bonus, 1.25);
        assert_eq!(config.fusion.alignment_bonus, 1.20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_unknown_weight_fails() {
        let mut config = ScreenerConfig::default();
        let result = config.apply_toml_str("[weights]\nsentiment = 0.1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rules() {
        let mut config = ScreenerConfig::default();
        config.filters.min_price = 600.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPriceBounds { .. })
        ));

        let mut config = ScreenerConfig::default();
        config.filters.min_confidence = 101.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidMinConfidence(101.0))
        );

        let mut config = ScreenerConfig::default();
        config.indicators.rsi_period = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPeriod { .. })
        ));

        let mut config = ScreenerConfig::default();
        config.fusion.alignment_bonus = 0.9;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBonus { .. })));

        let mut config = ScreenerConfig::default();
        config.predictor.test_fraction = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFraction { .. })
        ));

        let mut config = ScreenerConfig::default();
        config.predictor.min_training_samples = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMinSamples));
    }
}
