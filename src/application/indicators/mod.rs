//! Technical indicator library.
//!
//! Pure transforms from a bar series to index-aligned value series. `None`
//! marks an undefined value (warmup or division by zero) and is never
//! coerced to zero.

pub mod momentum;
pub mod rolling;
pub mod trend;
pub mod volatility;
pub mod volume;

use crate::config::IndicatorSettings;
use crate::domain::market::bar::BarSeries;

/// One indicator reading per bar
pub type Series = Vec<Option<f64>>;

/// Every indicator the screener uses, computed once per series
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub close: Vec<f64>,
    pub volume: Vec<f64>,

    pub rsi: Series,
    pub macd: Series,
    pub macd_signal: Series,
    pub macd_hist: Series,

    pub bb_middle: Series,
    pub bb_upper: Series,
    pub bb_lower: Series,
    pub bb_width: Series,

    pub vwap: Series,

    pub sma_fast: Series,
    pub sma_slow: Series,
    pub sma_long: Series,
    pub ema_fast: Series,
    pub ema_slow: Series,
    pub ema_long: Series,

    pub atr: Series,
    pub stoch_k: Series,
    pub stoch_d: Series,
    pub plus_di: Series,
    pub minus_di: Series,
    pub adx: Series,
    pub obv: Vec<f64>,
    pub mfi: Series,

    pub tenkan: Series,
    pub kijun: Series,
    pub senkou_span_a: Series,
    pub senkou_span_b: Series,

    pub volume_sma: Series,
    pub volume_ratio: Series,
}

impl IndicatorFrame {
    pub fn compute(series: &BarSeries, settings: &IndicatorSettings) -> Self {
        let close = series.closes();
        let high = series.highs();
        let low = series.lows();
        let volume = series.volumes();
        let typical = series.typical_prices();

        let macd = trend::macd(
            &close,
            settings.macd_fast_period,
            settings.macd_slow_period,
            settings.macd_signal_period,
        );
        let bands = volatility::bollinger(&close, settings.bb_period, settings.bb_std_dev);
        let atr = volatility::atr(&high, &low, &close, settings.atr_period);
        let (stoch_k, stoch_d) = momentum::stochastic(
            &high,
            &low,
            &close,
            settings.stoch_period,
            settings.stoch_smooth,
        );
        let directional = trend::adx(&high, &low, &atr, settings.adx_period);
        let ichimoku = trend::ichimoku(
            &high,
            &low,
            settings.ichimoku_tenkan,
            settings.ichimoku_kijun,
            settings.ichimoku_senkou_b,
            settings.ichimoku_shift,
        );
        let (volume_sma, volume_ratio) = volume::volume_ratio(&volume, settings.volume_period);

        Self {
            rsi: momentum::rsi(&close, settings.rsi_period),
            macd: macd.line,
            macd_signal: macd.signal,
            macd_hist: macd.histogram,

            bb_middle: bands.middle,
            bb_upper: bands.upper,
            bb_lower: bands.lower,
            bb_width: bands.width,

            vwap: volume::vwap(&typical, &volume),

            sma_fast: trend::sma(&close, settings.ema_fast_period),
            sma_slow: trend::sma(&close, settings.ema_slow_period),
            sma_long: trend::sma(&close, settings.ema_long_period),
            ema_fast: trend::ema(&close, settings.ema_fast_period),
            ema_slow: trend::ema(&close, settings.ema_slow_period),
            ema_long: trend::ema(&close, settings.ema_long_period),

            atr,
            stoch_k,
            stoch_d,
            plus_di: directional.plus_di,
            minus_di: directional.minus_di,
            adx: directional.adx,
            obv: volume::obv(&close, &volume),
            mfi: momentum::mfi(&typical, &volume, settings.mfi_period),

            tenkan: ichimoku.tenkan,
            kijun: ichimoku.kijun,
            senkou_span_a: ichimoku.span_a,
            senkou_span_b: ichimoku.span_b,

            volume_sma,
            volume_ratio,
            close,
            volume,
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Index of the latest bar
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }
}

/// Value at `index`, treating out-of-range as undefined
pub fn at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::bar::Bar;

    fn rising_series(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    timestamp: 1_700_000_000 + i as i64 * 300,
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000_000.0,
                }
            })
            .collect();
        BarSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn test_frame_columns_align_with_bars() {
        let series = rising_series(60);
        let frame = IndicatorFrame::compute(&series, &IndicatorSettings::default());

        assert_eq!(frame.len(), 60);
        for column in [
            &frame.rsi,
            &frame.macd_hist,
            &frame.bb_width,
            &frame.vwap,
            &frame.atr,
            &frame.stoch_k,
            &frame.adx,
            &frame.mfi,
            &frame.senkou_span_b,
            &frame.volume_ratio,
        ] {
            assert_eq!(column.len(), 60);
        }
        assert_eq!(frame.obv.len(), 60);
    }

    #[test]
    fn test_short_series_is_undefined_not_zero() {
        let series = rising_series(10);
        let frame = IndicatorFrame::compute(&series, &IndicatorSettings::default());

        assert!(frame.rsi.iter().all(Option::is_none));
        assert!(frame.bb_width.iter().all(Option::is_none));
        assert!(frame.atr.iter().all(Option::is_none));
        assert!(frame.adx.iter().all(Option::is_none));
        assert!(frame.volume_ratio.iter().all(Option::is_none));
        assert!(frame.senkou_span_a.iter().all(Option::is_none));
        // Recursive averages have no warmup
        assert!(frame.ema_fast[0].is_some());
    }

    #[test]
    fn test_at_out_of_range() {
        assert_eq!(at(&[Some(1.0)], 3), None);
        assert_eq!(at(&[Some(1.0)], 0), Some(1.0));
    }
}
