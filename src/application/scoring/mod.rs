//! Confidence fusion, move estimation and classification.
//!
//! One engine serves every variant. The variant decides which optional
//! inputs are honoured and which threshold set the direction call uses.

pub mod confidence;
pub mod direction;
pub mod move_estimator;
pub mod risk;

use crate::application::ml::PredictorOutput;
use crate::config::ScreenerConfig;
use crate::domain::screening::{Direction, RiskLevel, Variant};
use crate::domain::sentiment::SentimentScore;
use crate::domain::signals::SignalVector;
use confidence::ConfidenceFusion;
use direction::DirectionClassifier;
use move_estimator::MoveEstimator;
use risk::RiskClassifier;

/// Everything the fusion stage reads for one instrument
#[derive(Debug, Clone, Copy)]
pub struct FusionInputs<'a> {
    pub signals: &'a SignalVector,
    pub predictor: Option<PredictorOutput>,
    pub sentiment: Option<SentimentScore>,
    pub volatility_pct: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub beta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionOutput {
    pub confidence: f64,
    pub predicted_move_pct: f64,
    pub direction: Direction,
    pub risk_level: RiskLevel,
}

pub struct FusionEngine {
    variant: Variant,
    confidence: ConfidenceFusion,
    moves: MoveEstimator,
    direction: DirectionClassifier,
    risk: RiskClassifier,
}

impl FusionEngine {
    pub fn new(config: &ScreenerConfig) -> Self {
        let mut fusion = config.fusion.clone();
        // The fixed baseline only exists on the advanced path
        if !config.variant.is_advanced() {
            fusion.baseline_override = None;
        }

        Self {
            variant: config.variant,
            confidence: ConfidenceFusion::new(fusion),
            moves: MoveEstimator::new(config.move_estimator.clone()),
            direction: DirectionClassifier::new(config.direction.clone()),
            risk: RiskClassifier::new(config.risk.clone()),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn move_estimator(&self) -> &MoveEstimator {
        &self.moves
    }

    pub fn fuse(&self, inputs: &FusionInputs<'_>) -> FusionOutput {
        let predictor = inputs.predictor.filter(|_| self.variant.uses_predictor());
        let sentiment = inputs.sentiment.filter(|_| self.variant.uses_sentiment());

        FusionOutput {
            confidence: self.confidence.score(inputs.signals, predictor, sentiment),
            predicted_move_pct: self.moves.estimate(
                inputs.signals,
                inputs.volatility_pct,
                predictor,
                sentiment,
            ),
            direction: self
                .direction
                .classify(self.variant, inputs.signals, predictor, sentiment),
            risk_level: self.risk.classify(
                self.variant,
                inputs.volatility_pct,
                inputs.volume_ratio,
                inputs.beta,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signals::SignalChannel;

    fn config(variant: Variant) -> ScreenerConfig {
        ScreenerConfig {
            variant,
            ..ScreenerConfig::default()
        }
    }

    fn inputs(signals: &SignalVector) -> FusionInputs<'_> {
        FusionInputs {
            signals,
            predictor: Some(PredictorOutput::from_probability(0.9)),
            sentiment: Some(SentimentScore::new(0.8)),
            volatility_pct: Some(1.5),
            volume_ratio: Some(1.0),
            beta: 1.0,
        }
    }

    #[test]
    fn test_basic_ignores_predictor_and_sentiment() {
        let signals = SignalVector::new()
            .with_signal(SignalChannel::Rsi, 1.0, None)
            .with_signal(SignalChannel::Macd, -1.0, None);
        let out = FusionEngine::new(&config(Variant::Basic)).fuse(&inputs(&signals));

        assert_eq!(out.confidence, 100.0);
        assert_eq!(out.predicted_move_pct, 0.0);
        assert_eq!(out.direction, Direction::Neutral);
        assert_eq!(out.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_advanced_ml_skips_sentiment() {
        let signals = SignalVector::new()
            .with_signal(SignalChannel::Rsi, 1.0, None)
            .with_signal(SignalChannel::Macd, -1.0, None);
        let ml = FusionEngine::new(&config(Variant::AdvancedMl)).fuse(&inputs(&signals));
        let full = FusionEngine::new(&config(Variant::AdvancedSentiment)).fuse(&inputs(&signals));

        assert_eq!(ml.confidence, 97.0);
        assert_eq!(ml.predicted_move_pct, 0.5);
        assert_eq!(ml.direction, Direction::Long);

        assert_eq!(full.confidence, 100.0);
        assert_eq!(full.predicted_move_pct, 2.1);
        assert_eq!(full.direction, Direction::StrongLong);
    }

    #[test]
    fn test_baseline_override_ignored_for_basic() {
        let mut basic = config(Variant::Basic);
        basic.fusion.baseline_override = Some(50.0);
        let signals = SignalVector::new().with_signal(SignalChannel::Rsi, 0.0, None);

        let out = FusionEngine::new(&basic).fuse(&inputs(&signals));
        assert_eq!(out.confidence, 0.0);
    }
}
