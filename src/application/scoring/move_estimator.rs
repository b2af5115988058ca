use crate::application::indicators::{IndicatorFrame, at};
use crate::application::ml::PredictorOutput;
use crate::config::MoveEstimatorConfig;
use crate::domain::screening::round_to;
use crate::domain::sentiment::SentimentScore;
use crate::domain::signals::{SignalChannel, SignalVector};
use statrs::statistics::{Data, Distribution};

/// Expected percent move: ATR-sized, signed by the directional signal sum
pub struct MoveEstimator {
    config: MoveEstimatorConfig,
}

impl MoveEstimator {
    pub fn new(config: MoveEstimatorConfig) -> Self {
        Self { config }
    }

    /// ATR as a percent of the latest close. Falls back to the coefficient
    /// of variation of the trailing closes while ATR is still warming up.
    pub fn volatility_pct(&self, frame: &IndicatorFrame) -> Option<f64> {
        let index = frame.last_index()?;
        let close = frame.close[index];

        if let Some(atr) = at(&frame.atr, index) {
            let pct = atr / close * 100.0;
            if pct.is_finite() {
                return Some(pct);
            }
        }

        let window = self.config.fallback_window.min(frame.len());
        if window < 2 {
            return None;
        }
        let tail = Data::new(frame.close[frame.len() - window..].to_vec());
        let pct = tail.std_dev()? / tail.mean()? * 100.0;
        pct.is_finite().then_some(pct)
    }

    pub fn estimate(
        &self,
        signals: &SignalVector,
        volatility_pct: Option<f64>,
        predictor: Option<PredictorOutput>,
        sentiment: Option<SentimentScore>,
    ) -> f64 {
        let sum = signals.directional_sum();
        let direction = if sum > 0.0 {
            1.0
        } else if sum < 0.0 {
            -1.0
        } else {
            0.0
        };
        let strength = 0.5 + (sum.abs() / self.config.directional_channels) * 0.5;

        let mut predicted = direction * volatility_pct.unwrap_or(0.0) * strength;
        if signals.value(SignalChannel::Volume) > 0.0 {
            predicted *= self.config.volume_amplifier;
        }

        if let Some(output) = predictor {
            let vote = if output.probability > 0.5 { 1.0 } else { -1.0 };
            predicted += vote * self.config.predictor_nudge;
        }
        if let Some(sentiment) = sentiment {
            predicted += sentiment.value() * self.config.sentiment_scale;
        }

        if !predicted.is_finite() {
            return 0.0;
        }
        round_to(predicted, 2)
    }
}
