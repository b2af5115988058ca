use crate::application::indicators::rolling::quantile;
use crate::application::indicators::{IndicatorFrame, at};
use crate::config::SignalThresholds;
use crate::domain::signals::{SignalChannel, SignalVector, TrendStrength};
use std::cmp::Ordering;

/// Bands narrower than this are treated as collapsed (flat price window)
const COLLAPSED_BAND_WIDTH: f64 = 1e-9;

/// Relative gap below which two readings count as equal. Recursive averages
/// of a constant series drift by a few ulps.
const TIE_TOLERANCE: f64 = 1e-9;

fn ordering(a: f64, b: f64) -> Ordering {
    let scale = a.abs().max(b.abs()).max(1.0);
    if (a - b).abs() <= TIE_TOLERANCE * scale {
        Ordering::Equal
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

/// Maps indicator readings at one bar to discrete signals.
///
/// Undefined readings always produce a neutral signal.
pub struct SignalGenerator {
    thresholds: SignalThresholds,
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(SignalThresholds::default())
    }
}

impl SignalGenerator {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }

    /// Signals for the latest bar of the frame
    pub fn generate(&self, frame: &IndicatorFrame) -> SignalVector {
        match frame.last_index() {
            Some(index) => self.generate_at(frame, index),
            None => SignalVector::new(),
        }
    }

    pub fn generate_at(&self, frame: &IndicatorFrame, index: usize) -> SignalVector {
        let t = &self.thresholds;
        let close = frame.close.get(index).copied();

        let rsi = at(&frame.rsi, index);
        let vwap = at(&frame.vwap, index);
        let vwap_distance = match (close, vwap) {
            (Some(c), Some(v)) if v != 0.0 => Some((c - v) / v * 100.0),
            _ => None,
        };
        let volume_ratio = at(&frame.volume_ratio, index);
        let momentum = self.momentum_pct(frame, index);
        let stoch = at(&frame.stoch_k, index);
        let mfi = at(&frame.mfi, index);
        let adx = at(&frame.adx, index);
        let (squeeze, width) = self.squeeze(frame, index);

        let trend_strength = adx.map(|v| {
            if v > t.adx_strong_trend {
                TrendStrength::Strong
            } else {
                TrendStrength::Weak
            }
        });

        SignalVector::new()
            .with_signal(
                SignalChannel::Rsi,
                band_signal(rsi, t.rsi_oversold, t.rsi_overbought),
                rsi,
            )
            .with_signal(
                SignalChannel::Macd,
                self.macd_signal(frame, index),
                at(&frame.macd_hist, index),
            )
            .with_signal(
                SignalChannel::Bollinger,
                self.bollinger_signal(frame, index),
                width,
            )
            .with_signal(
                SignalChannel::Vwap,
                compare(close, vwap),
                vwap_distance,
            )
            .with_signal(
                SignalChannel::MovingAverage,
                compare(at(&frame.ema_fast, index), at(&frame.ema_slow, index)),
                at(&frame.ema_fast, index),
            )
            .with_signal(
                SignalChannel::Volume,
                self.volume_signal(volume_ratio),
                volume_ratio,
            )
            .with_signal(
                SignalChannel::Momentum,
                self.momentum_signal(momentum),
                momentum,
            )
            .with_signal(
                SignalChannel::Stochastic,
                band_signal(stoch, t.stoch_oversold, t.stoch_overbought),
                stoch,
            )
            .with_signal(
                SignalChannel::Mfi,
                band_signal(mfi, t.mfi_oversold, t.mfi_overbought),
                mfi,
            )
            .with_squeeze(squeeze, width)
            .with_trend_strength(adx, trend_strength)
    }

    /// Fresh cross = ±1, standing above/below = ±0.5
    fn macd_signal(&self, frame: &IndicatorFrame, index: usize) -> f64 {
        let (Some(macd), Some(signal)) = (at(&frame.macd, index), at(&frame.macd_signal, index))
        else {
            return 0.0;
        };

        let previous = index
            .checked_sub(1)
            .and_then(|p| Some((at(&frame.macd, p)?, at(&frame.macd_signal, p)?)));

        let now = ordering(macd, signal);
        if let Some((prev_macd, prev_signal)) = previous {
            let before = ordering(prev_macd, prev_signal);
            if now.is_gt() && before.is_le() {
                return 1.0;
            }
            if now.is_lt() && before.is_ge() {
                return -1.0;
            }
        }

        match now {
            Ordering::Greater => 0.5,
            Ordering::Less => -0.5,
            Ordering::Equal => 0.0,
        }
    }

    fn bollinger_signal(&self, frame: &IndicatorFrame, index: usize) -> f64 {
        let (Some(close), Some(upper), Some(lower)) = (
            frame.close.get(index).copied(),
            at(&frame.bb_upper, index),
            at(&frame.bb_lower, index),
        ) else {
            return 0.0;
        };

        // A collapsed band carries no mean-reversion information
        if upper - lower <= COLLAPSED_BAND_WIDTH * upper.abs().max(1.0) {
            return 0.0;
        }
        if close <= lower {
            1.0
        } else if close >= upper {
            -1.0
        } else {
            0.0
        }
    }

    /// Squeeze when the width sits below the configured quantile of every
    /// defined width up to `index`, or the band has collapsed
    fn squeeze(&self, frame: &IndicatorFrame, index: usize) -> (bool, Option<f64>) {
        let Some(width) = at(&frame.bb_width, index) else {
            return (false, None);
        };
        if width <= COLLAPSED_BAND_WIDTH {
            return (true, Some(width));
        }

        let history: Vec<f64> = frame.bb_width[..=index].iter().flatten().copied().collect();
        let squeeze = quantile(&history, self.thresholds.squeeze_percentile)
            .map(|cutoff| width < cutoff)
            .unwrap_or(false);
        (squeeze, Some(width))
    }

    fn volume_signal(&self, ratio: Option<f64>) -> f64 {
        match ratio {
            Some(r) if r > self.thresholds.volume_high_ratio => 1.0,
            Some(r) if r > self.thresholds.volume_elevated_ratio => 0.5,
            _ => 0.0,
        }
    }

    /// Percent change from the first to the last close of the trailing window
    fn momentum_pct(&self, frame: &IndicatorFrame, index: usize) -> Option<f64> {
        let window = self.thresholds.momentum_window;
        if window == 0 || index + 1 < window {
            return None;
        }
        let first = frame.close[index + 1 - window];
        let last = frame.close[index];
        let pct = (last - first) / first * 100.0;
        pct.is_finite().then_some(pct)
    }

    fn momentum_signal(&self, momentum: Option<f64>) -> f64 {
        match momentum {
            Some(m) if m > self.thresholds.momentum_pct => 1.0,
            Some(m) if m < -self.thresholds.momentum_pct => -1.0,
            _ => 0.0,
        }
    }
}

/// Oscillator bands: oversold is bullish, overbought bearish
fn band_signal(value: Option<f64>, oversold: f64, overbought: f64) -> f64 {
    match value {
        Some(v) if v < oversold => 1.0,
        Some(v) if v > overbought => -1.0,
        _ => 0.0,
    }
}

/// +1 when `a` is above `b`, -1 below, 0 on a tie or undefined input
fn compare(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => match ordering(a, b) {
            Ordering::Greater => 1.0,
            Ordering::Less => -1.0,
            Ordering::Equal => 0.0,
        },
        _ => 0.0,
    }
}
