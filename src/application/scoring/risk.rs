use crate::config::RiskThresholds;
use crate::domain::screening::{RiskLevel, Variant};

/// Tiers an instrument by volatility, beta and (basic variant) volume
/// activity. Undefined readings never qualify as LOW.
pub struct RiskClassifier {
    thresholds: RiskThresholds,
}

impl RiskClassifier {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(
        &self,
        variant: Variant,
        volatility_pct: Option<f64>,
        volume_ratio: Option<f64>,
        beta: f64,
    ) -> RiskLevel {
        let t = &self.thresholds;
        // Beta is only known to the advanced variants
        let beta = if variant.is_advanced() { beta } else { 1.0 };

        if volatility_pct.is_some_and(|v| v > t.high_volatility_pct) || beta > t.high_beta {
            return RiskLevel::High;
        }

        let calm = volatility_pct.is_some_and(|v| v < t.low_volatility_pct) && beta < t.low_beta;
        let quiet = match variant {
            Variant::Basic => volume_ratio.is_some_and(|r| r < t.low_volume_ratio),
            Variant::AdvancedMl | Variant::AdvancedSentiment => true,
        };

        if calm && quiet {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        }
    }
}
