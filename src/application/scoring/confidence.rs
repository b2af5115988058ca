//! Weighted fusion of discrete signals into a bounded confidence score.

use crate::application::ml::PredictorOutput;
use crate::config::FusionConfig;
use crate::domain::screening::round_to;
use crate::domain::sentiment::SentimentScore;
use crate::domain::signals::SignalVector;

pub struct ConfidenceFusion {
    config: FusionConfig,
}

impl ConfidenceFusion {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Σ|signal|·w / Σw over the weighted channels present, scaled to [0, 100]
    pub fn base_score(&self, signals: &SignalVector) -> f64 {
        if let Some(baseline) = self.config.baseline_override {
            return baseline;
        }

        let (weighted, total_weight) = self
            .config
            .weights
            .iter()
            .filter(|(channel, _)| signals.contains(**channel))
            .fold((0.0, 0.0), |(sum, total), (channel, weight)| {
                (sum + signals.value(*channel).abs() * weight, total + weight)
            });

        if total_weight > 0.0 {
            weighted / total_weight * 100.0
        } else {
            0.0
        }
    }

    /// True when at least one weighted signal is nonzero and all nonzero
    /// weighted signals share a sign
    pub fn is_aligned(&self, signals: &SignalVector) -> bool {
        let nonzero: Vec<f64> = self
            .config
            .weights
            .keys()
            .filter(|c| signals.contains(**c))
            .map(|c| signals.value(*c))
            .filter(|v| *v != 0.0)
            .collect();

        !nonzero.is_empty()
            && (nonzero.iter().all(|v| *v > 0.0) || nonzero.iter().all(|v| *v < 0.0))
    }

    pub fn score(
        &self,
        signals: &SignalVector,
        predictor: Option<PredictorOutput>,
        sentiment: Option<SentimentScore>,
    ) -> f64 {
        let mut score = self.base_score(signals);

        if self.is_aligned(signals) {
            score = (score * self.config.alignment_bonus).min(100.0);
        }
        if signals.bb_squeeze() {
            score = (score * self.config.squeeze_bonus).min(100.0);
        }

        if let Some(output) = predictor {
            let w = self.config.predictor_weight;
            score = score * (1.0 - w) + output.confidence * 100.0 * w;
        }

        if let Some(sentiment) = sentiment {
            score = (score + sentiment.value().abs() * self.config.sentiment_boost_points).min(100.0);
        }

        if !score.is_finite() {
            return 0.0;
        }
        round_to(score, 2).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signals::SignalChannel;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn engine() -> ConfidenceFusion {
        ConfidenceFusion::new(FusionConfig::default())
    }

    fn vector(values: &[(SignalChannel, f64)]) -> SignalVector {
        values
            .iter()
            .fold(SignalVector::new(), |v, (c, s)| v.with_signal(*c, *s, None))
    }

    #[test]
    fn test_base_score_uses_only_present_channels() {
        let signals = vector(&[(SignalChannel::Rsi, 1.0), (SignalChannel::Macd, 0.0)]);
        // 0.15 / (0.15 + 0.20)
        let expected = 0.15 / 0.35 * 100.0;
        assert!((engine().base_score(&signals) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unweighted_channels_are_ignored() {
        let signals = vector(&[(SignalChannel::Stochastic, 1.0), (SignalChannel::Mfi, -1.0)]);
        assert_eq!(engine().base_score(&signals), 0.0);
        assert!(!engine().is_aligned(&signals));
    }

    #[test]
    fn test_alignment_bonus_applies_only_to_shared_sign() {
        let aligned = vector(&[
            (SignalChannel::Rsi, 1.0),
            (SignalChannel::Macd, 0.5),
            (SignalChannel::Vwap, 0.0),
        ]);
        let mixed = vector(&[
            (SignalChannel::Rsi, 1.0),
            (SignalChannel::Macd, -0.5),
            (SignalChannel::Vwap, 0.0),
        ]);
        let fusion = engine();

        assert!(fusion.is_aligned(&aligned));
        assert!(!fusion.is_aligned(&mixed));

        let base = fusion.base_score(&aligned);
        assert_eq!(fusion.score(&aligned, None, None), round_to(base * 1.2, 2));
        assert_eq!(
            fusion.score(&mixed, None, None),
            round_to(fusion.base_score(&mixed), 2)
        );
    }

    #[test]
    fn test_squeeze_bonus_and_cap() {
        let all_in: Vec<(SignalChannel, f64)> = FusionConfig::default_weights()
            .keys()
            .map(|c| (*c, 1.0))
            .collect();
        let signals = vector(&all_in).with_squeeze(true, Some(0.0));
        assert_eq!(engine().score(&signals, None, None), 100.0);
    }

    #[test]
    fn test_predictor_blend_and_sentiment_boost() {
        let signals = vector(&[(SignalChannel::Rsi, 1.0), (SignalChannel::Macd, -1.0)]);
        let fusion = engine();
        let prediction = PredictorOutput::from_probability(0.8);

        // base 100, mixed signs so no bonus
        let blended = fusion.score(&signals, Some(prediction), None);
        assert_eq!(blended, round_to(100.0 * 0.7 + 80.0 * 0.3, 2));

        let boosted = fusion.score(&signals, Some(prediction), Some(SentimentScore::new(-0.5)));
        assert_eq!(boosted, 99.0);
    }

    #[test]
    fn test_baseline_override_replaces_weighted_base() {
        let fusion = ConfidenceFusion::new(FusionConfig {
            baseline_override: Some(50.0),
            ..FusionConfig::default()
        });
        let signals = vector(&[(SignalChannel::Rsi, 0.0)]);
        let score = fusion.score(
            &signals,
            Some(PredictorOutput::from_probability(0.9)),
            Some(SentimentScore::new(0.2)),
        );
        assert_eq!(score, round_to(50.0 * 0.7 + 90.0 * 0.3 + 2.0, 2));
    }

    #[test]
    fn test_score_stays_bounded_for_random_inputs() {
        let mut rng = StdRng::seed_from_u64(7);
        let levels = [-1.0, -0.5, 0.0, 0.5, 1.0];
        let fusion = engine();

        for _ in 0..2_000 {
            let mut signals = SignalVector::new();
            for channel in SignalChannel::ALL {
                if rng.random_bool(0.8) {
                    let level = levels[rng.random_range(0..levels.len())];
                    signals = signals.with_signal(channel, level, None);
                }
            }
            signals = signals.with_squeeze(rng.random_bool(0.3), None);
            let predictor = rng
                .random_bool(0.5)
                .then(|| PredictorOutput::from_probability(rng.random_range(0.0..=1.0)));
            let sentiment = rng
                .random_bool(0.5)
                .then(|| SentimentScore::new(rng.random_range(-1.0..=1.0)));

            let score = fusion.score(&signals, predictor, sentiment);
            assert!((0.0..=100.0).contains(&score), "score {} escaped", score);
        }
    }
}
