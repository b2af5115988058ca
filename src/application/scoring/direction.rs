use crate::application::ml::PredictorOutput;
use crate::config::DirectionThresholds;
use crate::domain::screening::{Direction, Variant};
use crate::domain::sentiment::SentimentScore;
use crate::domain::signals::SignalVector;

/// Thresholds the aggregate signal sum into a direction call.
///
/// The basic variant uses three classes with a dead zone of ±`basic`; the
/// advanced variants use five classes and fold predictor and sentiment
/// votes into the sum first.
pub struct DirectionClassifier {
    thresholds: DirectionThresholds,
}

impl DirectionClassifier {
    pub fn new(thresholds: DirectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Directional signal sum plus predictor and sentiment votes
    pub fn aggregate(
        &self,
        signals: &SignalVector,
        predictor: Option<PredictorOutput>,
        sentiment: Option<SentimentScore>,
    ) -> f64 {
        let mut sum = signals.directional_sum();
        if let Some(output) = predictor {
            sum += if output.probability > self.thresholds.predictor_threshold {
                self.thresholds.predictor_vote
            } else {
                -self.thresholds.predictor_vote
            };
        }
        if let Some(sentiment) = sentiment {
            sum += sentiment.value() * self.thresholds.sentiment_scale;
        }
        sum
    }

    pub fn five_class(&self, sum: f64) -> Direction {
        let strong = self.thresholds.strong;
        if sum > strong {
            Direction::StrongLong
        } else if sum > 0.0 {
            Direction::Long
        } else if sum < -strong {
            Direction::StrongShort
        } else if sum < 0.0 {
            Direction::Short
        } else {
            Direction::Neutral
        }
    }

    pub fn three_class(&self, sum: f64) -> Direction {
        if sum > self.thresholds.basic {
            Direction::Long
        } else if sum < -self.thresholds.basic {
            Direction::Short
        } else {
            Direction::Neutral
        }
    }

    pub fn classify(
        &self,
        variant: Variant,
        signals: &SignalVector,
        predictor: Option<PredictorOutput>,
        sentiment: Option<SentimentScore>,
    ) -> Direction {
        match variant {
            Variant::Basic => self.three_class(signals.directional_sum()),
            Variant::AdvancedMl | Variant::AdvancedSentiment => {
                self.five_class(self.aggregate(signals, predictor, sentiment))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signals::SignalChannel;

    fn classifier() -> DirectionClassifier {
        DirectionClassifier::new(DirectionThresholds::default())
    }

    #[test]
    fn test_five_class_boundaries() {
        let c = classifier();
        assert_eq!(c.five_class(2.0), Direction::Long);
        assert_eq!(c.five_class(2.01), Direction::StrongLong);
        assert_eq!(c.five_class(0.0), Direction::Neutral);
        assert_eq!(c.five_class(-2.0), Direction::Short);
        assert_eq!(c.five_class(-2.01), Direction::StrongShort);
        assert_eq!(c.five_class(0.5), Direction::Long);
    }

    #[test]
    fn test_three_class_dead_zone() {
        let c = classifier();
        assert_eq!(c.three_class(1.0), Direction::Neutral);
        assert_eq!(c.three_class(1.5), Direction::Long);
        assert_eq!(c.three_class(-1.0), Direction::Neutral);
        assert_eq!(c.three_class(-1.5), Direction::Short);
        assert_eq!(c.three_class(4.0), Direction::Long);
    }

    #[test]
    fn test_variants_are_not_unified() {
        let signals = SignalVector::new()
            .with_signal(SignalChannel::Rsi, 1.0, None)
            .with_signal(SignalChannel::Vwap, 1.0, None)
            .with_signal(SignalChannel::Momentum, 1.0, None);
        let c = classifier();

        assert_eq!(c.classify(Variant::Basic, &signals, None, None), Direction::Long);
        assert_eq!(
            c.classify(Variant::AdvancedMl, &signals, None, None),
            Direction::StrongLong
        );
    }

    #[test]
    fn test_predictor_vote_uses_sixty_percent_threshold() {
        let signals = SignalVector::new().with_signal(SignalChannel::Macd, 0.5, None);
        let c = classifier();

        let hesitant = PredictorOutput::from_probability(0.55);
        assert_eq!(c.aggregate(&signals, Some(hesitant), None), -0.5);

        let confident = PredictorOutput::from_probability(0.65);
        assert_eq!(c.aggregate(&signals, Some(confident), None), 1.5);
        assert_eq!(
            c.classify(
                Variant::AdvancedSentiment,
                &signals,
                Some(confident),
                Some(SentimentScore::new(0.5))
            ),
            Direction::StrongLong
        );
    }
}
