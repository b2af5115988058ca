//! Per-bar feature vectors for the learned predictor.

use crate::application::indicators::rolling::{
    defined, diff, pct_change, rolling_mean, rolling_std, zip_with,
};
use crate::application::indicators::{IndicatorFrame, Series, at};
use crate::domain::ml::feature_registry::{FEATURE_COUNT, FeatureVector, LabeledSample};

/// Builds feature columns once per frame, then slices rows out of them
pub struct FeatureBuilder {
    columns: [Series; FEATURE_COUNT],
    next_return: Series,
}

impl FeatureBuilder {
    pub fn new(frame: &IndicatorFrame) -> Self {
        let close = defined(&frame.close);
        let volume = defined(&frame.volume);

        let volatility = |window: usize| {
            zip_with(
                &rolling_std(&close, window),
                &rolling_mean(&close, window),
                |std, mean| std / mean,
            )
        };
        let bb_position: Series = (0..frame.len())
            .map(|i| {
                let (c, upper, lower) = (close[i]?, at(&frame.bb_upper, i)?, at(&frame.bb_lower, i)?);
                let range = upper - lower;
                let position = (c - lower) / range;
                position.is_finite().then_some(position)
            })
            .collect();

        // Order must match FEATURE_NAMES
        let columns = [
            pct_change(&close, 1),
            pct_change(&close, 5),
            pct_change(&close, 20),
            volatility(5),
            volatility(20),
            pct_change(&volume, 1),
            frame.volume_ratio.clone(),
            frame.rsi.clone(),
            diff(&frame.rsi),
            frame.macd.clone(),
            frame.macd_signal.clone(),
            frame.macd_hist.clone(),
            frame.bb_width.clone(),
            bb_position,
            zip_with(&close, &frame.vwap, |c, v| (c - v) / v),
            frame.adx.clone(),
            frame.stoch_k.clone(),
            frame.stoch_d.clone(),
            frame.mfi.clone(),
            zip_with(&frame.ema_fast, &frame.ema_slow, |fast, slow| (fast - slow) / slow),
        ];

        // Return from this bar's close to the next one
        let next_return = (0..frame.len())
            .map(|i| {
                let (cur, next) = (close[i]?, close.get(i + 1).copied().flatten()?);
                let r = next / cur - 1.0;
                r.is_finite().then_some(r)
            })
            .collect();

        Self {
            columns,
            next_return,
        }
    }

    pub fn len(&self) -> usize {
        self.next_return.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_return.is_empty()
    }

    pub fn row(&self, index: usize) -> FeatureVector {
        let mut values = [None; FEATURE_COUNT];
        for (slot, column) in values.iter_mut().zip(self.columns.iter()) {
            *slot = at(column, index);
        }
        FeatureVector::new(values)
    }

    /// Features of the latest bar
    pub fn latest(&self) -> Option<FeatureVector> {
        let index = self.len().checked_sub(1)?;
        Some(self.row(index))
    }

    /// Rows with every feature and the label defined. The final bar never
    /// has a label.
    pub fn labeled_samples(&self) -> Vec<LabeledSample> {
        (0..self.len())
            .filter_map(|i| {
                let next_return = at(&self.next_return, i)?;
                let dense = self.row(i).to_dense()?;
                let mut features = [0.0; FEATURE_COUNT];
                features.copy_from_slice(&dense);
                Some(LabeledSample {
                    features,
                    next_return,
                })
            })
            .collect()
    }
}
