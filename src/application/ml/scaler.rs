use super::predictor::PredictorError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Per-feature z-score standardization fitted on training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl FeatureScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PredictorError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != width) {
            return Err(PredictorError::InconsistentFeatures {
                expected: width,
                got: rows.iter().map(Vec::len).find(|l| *l != width).unwrap_or(0),
            });
        }

        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for column in 0..width {
            let values: Vec<f64> = rows.iter().map(|r| r[column]).collect();
            let mean = values.iter().mean();
            let std = values.iter().population_std_dev();
            means.push(if mean.is_finite() { mean } else { 0.0 });
            // Constant columns pass through centred but unscaled
            scales.push(if std.is_finite() && std > 0.0 { std } else { 1.0 });
        }

        Ok(Self { means, scales })
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictorError> {
        if row.len() != self.width() {
            return Err(PredictorError::InconsistentFeatures {
                expected: self.width(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PredictorError> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
