use super::sentiment::SentimentImpact;
use super::signals::TrendStrength;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which fusion rules apply to a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Technical signals only, three-class direction, volume-aware risk
    #[default]
    Basic,
    /// Adds the learned predictor, five-class direction, beta-aware risk
    AdvancedMl,
    /// Advanced with predictor (when trained) and external sentiment
    AdvancedSentiment,
}

impl Variant {
    pub fn is_advanced(&self) -> bool {
        !matches!(self, Variant::Basic)
    }

    pub fn uses_predictor(&self) -> bool {
        self.is_advanced()
    }

    pub fn uses_sentiment(&self) -> bool {
        matches!(self, Variant::AdvancedSentiment)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Basic => write!(f, "basic"),
            Variant::AdvancedMl => write!(f, "advanced-ml"),
            Variant::AdvancedSentiment => write!(f, "advanced-sentiment"),
        }
    }
}

impl FromStr for Variant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "basic" => Ok(Variant::Basic),
            "advanced-ml" | "ml" | "advanced" => Ok(Variant::AdvancedMl),
            "advanced-sentiment" | "sentiment" => Ok(Variant::AdvancedSentiment),
            _ => Err(anyhow!(
                "Invalid variant: {}. Must be 'basic', 'advanced-ml' or 'advanced-sentiment'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    StrongLong,
    Long,
    Neutral,
    Short,
    StrongShort,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::StrongLong => write!(f, "STRONG_LONG"),
            Direction::Long => write!(f, "LONG"),
            Direction::Neutral => write!(f, "NEUTRAL"),
            Direction::Short => write!(f, "SHORT"),
            Direction::StrongShort => write!(f, "STRONG_SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// One screened instrument. Created once per instrument per scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenResult {
    pub ticker: String,
    pub current_price: f64,
    pub price_change_pct: Option<f64>,
    pub confidence_score: f64,
    pub predicted_move_pct: f64,
    pub direction: Direction,
    pub risk_level: RiskLevel,
    pub variant: Variant,

    pub rsi_signal: f64,
    pub rsi_value: Option<f64>,
    pub macd_signal: f64,
    pub bb_signal: f64,
    pub bb_width: Option<f64>,
    pub bb_squeeze: bool,
    pub vwap_signal: f64,
    pub vwap_distance: Option<f64>,
    pub ma_signal: f64,
    pub volume_signal: f64,
    pub volume_ratio: Option<f64>,
    pub momentum_signal: f64,
    pub momentum_pct: Option<f64>,
    pub stoch_signal: f64,
    pub stoch_value: Option<f64>,
    pub mfi_signal: f64,
    pub mfi_value: Option<f64>,
    pub adx_value: Option<f64>,
    pub trend_strength: Option<TrendStrength>,

    pub ml_probability: Option<f64>,
    pub ml_confidence: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub sentiment_impact: Option<SentimentImpact>,
    pub beta: f64,
}

/// Why an instrument with usable data was left out of the results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    PriceOutOfRange { price: f64 },
    VolumeBelowFloor { avg_volume: f64 },
    BelowMinConfidence { confidence: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PriceOutOfRange { price } => write!(f, "price {:.2} out of range", price),
            SkipReason::VolumeBelowFloor { avg_volume } => {
                write!(f, "average volume {:.0} below floor", avg_volume)
            }
            SkipReason::BelowMinConfidence { confidence } => {
                write!(f, "confidence {:.2} below minimum", confidence)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenOutcome {
    Qualified(Box<ScreenResult>),
    Skipped(SkipReason),
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!("basic".parse::<Variant>().unwrap(), Variant::Basic);
        assert_eq!("advanced_ml".parse::<Variant>().unwrap(), Variant::AdvancedMl);
        assert_eq!(
            "Advanced-Sentiment".parse::<Variant>().unwrap(),
            Variant::AdvancedSentiment
        );
        assert!("turbo".parse::<Variant>().is_err());
    }

    #[test]
    fn test_variant_capabilities() {
        assert!(!Variant::Basic.uses_predictor());
        assert!(Variant::AdvancedMl.uses_predictor());
        assert!(!Variant::AdvancedMl.uses_sentiment());
        assert!(Variant::AdvancedSentiment.uses_predictor());
        assert!(Variant::AdvancedSentiment.uses_sentiment());
    }

    #[test]
    fn test_direction_serializes_screaming_case() {
        let json = serde_json::to_string(&Direction::StrongShort).unwrap();
        assert_eq!(json, "\"STRONG_SHORT\"");
        assert_eq!(RiskLevel::Medium.to_string(), "MEDIUM");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(-0.004, 2), -0.0);
    }
}
