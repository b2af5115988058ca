/// Ordered list of feature names.
/// Trained artifacts record this list; any change here invalidates them.
pub const FEATURE_NAMES: &[&str] = &[
    "price_change_1",
    "price_change_5",
    "price_change_20",
    "volatility_5",
    "volatility_20",
    "volume_change",
    "volume_ratio",
    "rsi",
    "rsi_change",
    "macd",
    "macd_signal",
    "macd_hist",
    "bb_width",
    "bb_position",
    "vwap_distance",
    "adx",
    "stoch_k",
    "stoch_d",
    "mfi",
    "ema_cross",
];

pub const FEATURE_COUNT: usize = 20;

/// Feature values for one bar, in `FEATURE_NAMES` order. `None` marks an
/// undefined reading (warmup or division by zero).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [Option<f64>; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new(values: [Option<f64>; FEATURE_COUNT]) -> Self {
        // Non-finite readings (e.g. x/0 = inf) count as undefined
        let values = values.map(|v| v.filter(|x| x.is_finite()));
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let index = FEATURE_NAMES.iter().position(|n| *n == name)?;
        self.values[index]
    }

    pub fn values(&self) -> &[Option<f64>; FEATURE_COUNT] {
        &self.values
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Dense values, or `None` if any feature is undefined
    pub fn to_dense(&self) -> Option<Vec<f64>> {
        self.values.iter().copied().collect()
    }
}

/// A feature vector paired with its next-bar return label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledSample {
    pub features: [f64; FEATURE_COUNT],
    pub next_return: f64,
}

impl LabeledSample {
    /// Class label: 1 when the next bar closed higher, else 0
    pub fn label(&self) -> i32 {
        if self.next_return > 0.0 { 1 } else { 0 }
    }
}
