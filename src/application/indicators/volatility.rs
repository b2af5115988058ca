//! Volatility indicators: Bollinger Bands, true range and ATR.

use super::Series;
use super::rolling::{defined, finite, rolling_mean, rolling_std};

#[derive(Debug, Clone, PartialEq)]
pub struct Bollinger {
    pub middle: Series,
    pub upper: Series,
    pub lower: Series,
    /// (upper - lower) / middle
    pub width: Series,
}

pub fn bollinger(closes: &[f64], period: usize, std_dev: f64) -> Bollinger {
    let closes = defined(closes);
    let middle = rolling_mean(&closes, period);
    let deviation = rolling_std(&closes, period);

    let mut upper = Vec::with_capacity(closes.len());
    let mut lower = Vec::with_capacity(closes.len());
    let mut width = Vec::with_capacity(closes.len());
    for (m, d) in middle.iter().zip(deviation.iter()) {
        match (m, d) {
            (Some(m), Some(d)) => {
                let (u, l) = (m + std_dev * d, m - std_dev * d);
                upper.push(finite(u));
                lower.push(finite(l));
                width.push(finite((u - l) / m));
            }
            _ => {
                upper.push(None);
                lower.push(None);
                width.push(None);
            }
        }
    }

    Bollinger {
        middle,
        upper,
        lower,
        width,
    }
}

/// `max(H - L, |H - prevC|, |L - prevC|)`; the first bar uses `H - L`
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    (0..highs.len())
        .map(|i| {
            let range = highs[i] - lows[i];
            if i == 0 {
                return range;
            }
            let prev_close = closes[i - 1];
            range
                .max((highs[i] - prev_close).abs())
                .max((lows[i] - prev_close).abs())
        })
        .collect()
}

/// Simple rolling mean of the true range
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Series {
    rolling_mean(&defined(&true_range(highs, lows, closes)), period)
}
