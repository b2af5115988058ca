//! Bounded oscillators: RSI, Stochastic, MFI, plus windowed rate of change.

use super::Series;
use super::rolling::{finite, rolling_max, rolling_mean, rolling_min, rolling_sum};

/// `100 - 100 / (1 + up / down)`.
/// No movement at all is undefined; a window with no down side saturates at 100.
fn strength_index(up: Option<f64>, down: Option<f64>) -> Option<f64> {
    let (up, down) = (up?, down?);
    if down == 0.0 {
        return if up > 0.0 { Some(100.0) } else { None };
    }
    finite(100.0 - 100.0 / (1.0 + up / down))
}

/// Relative Strength Index with simple rolling means of gains and losses.
/// The first bar contributes a zero gain and loss, so the first value lands
/// at index `period - 1`.
pub fn rsi(closes: &[f64], period: usize) -> Series {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let delta = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);
    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| strength_index(*g, *l))
        .collect()
}

/// Stochastic oscillator: (%K, %D)
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    smooth: usize,
) -> (Series, Series) {
    let lowest = rolling_min(&super::rolling::defined(lows), period);
    let highest = rolling_max(&super::rolling::defined(highs), period);

    let k: Series = (0..closes.len())
        .map(|i| {
            let (low, high) = (lowest[i]?, highest[i]?);
            let range = high - low;
            if range == 0.0 {
                return None;
            }
            finite(100.0 * (closes[i] - low) / range)
        })
        .collect();
    let d = rolling_mean(&k, smooth);
    (k, d)
}

/// Money Flow Index: volume-weighted RSI over typical price
pub fn mfi(typical: &[f64], volumes: &[f64], period: usize) -> Series {
    let mut positive = Vec::with_capacity(typical.len());
    let mut negative = Vec::with_capacity(typical.len());
    for i in 0..typical.len() {
        let flow = typical[i] * volumes[i];
        let (pos, neg) = if i == 0 {
            (0.0, 0.0)
        } else if typical[i] > typical[i - 1] {
            (flow, 0.0)
        } else if typical[i] < typical[i - 1] {
            (0.0, flow)
        } else {
            (0.0, 0.0)
        };
        positive.push(Some(pos));
        negative.push(Some(neg));
    }

    let pos_sum = rolling_sum(&positive, period);
    let neg_sum = rolling_sum(&negative, period);
    pos_sum
        .iter()
        .zip(neg_sum.iter())
        .map(|(p, n)| strength_index(*p, *n))
        .collect()
}

/// Percent change from the first to the last close of each trailing window
pub fn rate_of_change(closes: &[f64], window: usize) -> Series {
    (0..closes.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let first = closes[i + 1 - window];
            finite((closes[i] / first - 1.0) * 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_rsi_warmup_is_undefined() {
        let closes: Vec<f64> = (0..13).map(|i| 100.0 + (i % 3) as f64).collect();
        let values = rsi(&closes, 14);
        assert_eq!(values.len(), 13);
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_first_value_at_period_minus_one() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + ((i * 7) % 5) as f64).collect();
        let values = rsi(&closes, 14);
        assert!(values[12].is_none());
        assert!(values[13].is_some());
    }

    #[test]
    fn test_rsi_flat_series_is_undefined() {
        let closes = vec![50.0; 30];
        assert!(rsi(&closes, 14).iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_only_gains_saturates() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&closes, 14)[29], Some(100.0));
    }

    #[test]
    fn test_rsi_known_value() {
        // Alternating +2 / -1 moves over the window: 7 gains of 2, 7 losses of 1
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = closes[closes.len() - 1];
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let values = rsi(&closes, 14);
        // avg gain = 14/14, avg loss = 7/14 => RS = 2 => RSI = 66.67
        let last = values[14].unwrap();
        assert!((last - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_bounded_for_random_walks() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut price = 100.0;
            let closes: Vec<f64> = (0..120)
                .map(|_| {
                    price *= 1.0 + rng.random_range(-0.03..0.03);
                    price
                })
                .collect();
            for value in rsi(&closes, 14).into_iter().flatten() {
                assert!((0.0..=100.0).contains(&value), "RSI out of range: {}", value);
            }
        }
    }

    #[test]
    fn test_stochastic_zero_range_is_undefined() {
        let flat = vec![10.0; 20];
        let (k, d) = stochastic(&flat, &flat, &flat, 14, 3);
        assert!(k.iter().all(Option::is_none));
        assert!(d.iter().all(Option::is_none));
    }

    #[test]
    fn test_stochastic_close_at_high() {
        let highs: Vec<f64> = (0..20).map(|i| 11.0 + i as f64).collect();
        let lows: Vec<f64> = (0..20).map(|i| 9.0 + i as f64).collect();
        let closes: Vec<f64> = highs.clone();
        let (k, d) = stochastic(&highs, &lows, &closes, 14, 3);
        assert!(k[12].is_none());
        assert_eq!(k[13], Some(100.0));
        assert!(d[14].is_none());
        assert_eq!(d[15], Some(100.0));
    }

    #[test]
    fn test_mfi_bounds_and_saturation() {
        let typical: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let volumes = vec![1000.0; 20];
        let values = mfi(&typical, &volumes, 14);
        assert!(values[12].is_none());
        assert_eq!(values[19], Some(100.0));
    }

    #[test]
    fn test_rate_of_change_window() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let roc = rate_of_change(&closes, 20);
        assert!(roc[18].is_none());
        // 119 vs 100
        assert!((roc[19].unwrap() - 19.0).abs() < 1e-9);
    }
}
