use super::bar::BarSeries;
use serde::{Deserialize, Serialize};

/// Beta assumed when the data provider has no profile for an instrument
pub const DEFAULT_BETA: f64 = 1.0;

/// Reference data a provider may attach to an instrument
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstrumentProfile {
    pub beta: Option<f64>,
    pub avg_volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub sector: Option<String>,
}

impl InstrumentProfile {
    pub fn beta_or_default(&self) -> f64 {
        self.beta.filter(|b| b.is_finite()).unwrap_or(DEFAULT_BETA)
    }
}

/// Everything fetched for one instrument before analysis
#[derive(Debug, Clone)]
pub struct InstrumentData {
    pub series: BarSeries,
    pub profile: Option<InstrumentProfile>,
}

impl InstrumentData {
    pub fn new(series: BarSeries) -> Self {
        Self {
            series,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: InstrumentProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn beta(&self) -> f64 {
        self.profile
            .as_ref()
            .map(InstrumentProfile::beta_or_default)
            .unwrap_or(DEFAULT_BETA)
    }

    /// Provider-reported average volume, falling back to the mean bar volume
    pub fn average_volume(&self) -> Option<f64> {
        self.profile
            .as_ref()
            .and_then(|p| p.avg_volume)
            .or_else(|| self.series.mean_volume())
    }
}
