//! Volume-weighted indicators: VWAP, OBV and relative volume.

use super::Series;
use super::rolling::{defined, finite, rolling_mean};

/// Cumulative VWAP over the whole series. Undefined until volume trades.
pub fn vwap(typical: &[f64], volumes: &[f64]) -> Series {
    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;
    typical
        .iter()
        .zip(volumes.iter())
        .map(|(tp, volume)| {
            cum_pv += tp * volume;
            cum_volume += volume;
            if cum_volume == 0.0 {
                None
            } else {
                finite(cum_pv / cum_volume)
            }
        })
        .collect()
}

/// On-balance volume, seeded at zero
pub fn obv(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let mut running = 0.0;
    (0..closes.len())
        .map(|i| {
            if i > 0 {
                if closes[i] > closes[i - 1] {
                    running += volumes[i];
                } else if closes[i] < closes[i - 1] {
                    running -= volumes[i];
                }
            }
            running
        })
        .collect()
}

/// Volume divided by its rolling mean; the window includes the current bar
pub fn volume_ratio(volumes: &[f64], period: usize) -> (Series, Series) {
    let average = rolling_mean(&defined(volumes), period);
    let ratio = volumes
        .iter()
        .zip(average.iter())
        .map(|(v, avg)| finite(v / (*avg)?))
        .collect();
    (average, ratio)
}
