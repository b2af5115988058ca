//! Trend indicators: moving averages, MACD, ADX and Ichimoku lines.

use super::Series;
use super::rolling::{defined, finite, rolling_max, rolling_mean, rolling_min, shift_forward};
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, MovingAverageConvergenceDivergence};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directional {
    pub plus_di: Series,
    pub minus_di: Series,
    pub adx: Series,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ichimoku {
    pub tenkan: Series,
    pub kijun: Series,
    pub span_a: Series,
    pub span_b: Series,
}

pub fn sma(closes: &[f64], period: usize) -> Series {
    rolling_mean(&defined(closes), period)
}

/// Recursive EMA with `k = 2 / (period + 1)`, seeded from the first value.
/// Defined from the first bar.
pub fn ema(values: &[f64], period: usize) -> Series {
    match ExponentialMovingAverage::new(period) {
        Ok(mut ema) => values.iter().map(|v| finite(ema.next(*v))).collect(),
        Err(e) => {
            warn!("EMA period {} rejected: {:?}", period, e);
            vec![None; values.len()]
        }
    }
}

/// MACD line, signal line and histogram; histogram = line - signal
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let n = closes.len();
    let mut out = Macd {
        line: Vec::with_capacity(n),
        signal: Vec::with_capacity(n),
        histogram: Vec::with_capacity(n),
    };

    let mut indicator = match MovingAverageConvergenceDivergence::new(fast, slow, signal) {
        Ok(indicator) => indicator,
        Err(e) => {
            warn!("MACD periods {}/{}/{} rejected: {:?}", fast, slow, signal, e);
            return Macd {
                line: vec![None; n],
                signal: vec![None; n],
                histogram: vec![None; n],
            };
        }
    };

    for close in closes {
        let value = indicator.next(*close);
        out.line.push(finite(value.macd));
        out.signal.push(finite(value.signal));
        out.histogram.push(finite(value.histogram));
    }
    out
}

/// Directional movement index. `atr` must be index-aligned with the bars.
pub fn adx(highs: &[f64], lows: &[f64], atr: &[Option<f64>], period: usize) -> Directional {
    let n = highs.len();
    let mut plus_dm = Vec::with_capacity(n);
    let mut minus_dm = Vec::with_capacity(n);
    for i in 0..n {
        if i == 0 {
            plus_dm.push(Some(0.0));
            minus_dm.push(Some(0.0));
            continue;
        }
        let up = highs[i] - highs[i - 1];
        let down = lows[i - 1] - lows[i];
        plus_dm.push(Some(if up > down && up > 0.0 { up } else { 0.0 }));
        minus_dm.push(Some(if down > up && down > 0.0 { down } else { 0.0 }));
    }

    let plus_avg = rolling_mean(&plus_dm, period);
    let minus_avg = rolling_mean(&minus_dm, period);

    let di = |avg: &Series| -> Series {
        avg.iter()
            .zip(atr.iter())
            .map(|(dm, atr)| finite(100.0 * (*dm)? / (*atr)?))
            .collect()
    };
    let plus_di = di(&plus_avg);
    let minus_di = di(&minus_avg);

    let dx: Series = plus_di
        .iter()
        .zip(minus_di.iter())
        .map(|(p, m)| {
            let (p, m) = ((*p)?, (*m)?);
            finite(100.0 * (p - m).abs() / (p + m))
        })
        .collect();

    Directional {
        adx: rolling_mean(&dx, period),
        plus_di,
        minus_di,
    }
}

fn midpoint(highs: &[f64], lows: &[f64], period: usize) -> Series {
    let high = rolling_max(&defined(highs), period);
    let low = rolling_min(&defined(lows), period);
    high.iter()
        .zip(low.iter())
        .map(|(h, l)| finite(((*h)? + (*l)?) / 2.0))
        .collect()
}

pub fn ichimoku(
    highs: &[f64],
    lows: &[f64],
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
    shift: usize,
) -> Ichimoku {
    let tenkan = midpoint(highs, lows, tenkan_period);
    let kijun = midpoint(highs, lows, kijun_period);
    let base_a: Series = tenkan
        .iter()
        .zip(kijun.iter())
        .map(|(t, k)| finite(((*t)? + (*k)?) / 2.0))
        .collect();
    let base_b = midpoint(highs, lows, senkou_b_period);

    Ichimoku {
        span_a: shift_forward(&base_a, shift),
        span_b: shift_forward(&base_b, shift),
        tenkan,
        kijun,
    }
}
