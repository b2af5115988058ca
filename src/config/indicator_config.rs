//! Indicator periods and signal thresholds.
//!
//! Both structs load from `SCREENER_*` environment variables and may be
//! replaced wholesale by a `[indicators]` / `[thresholds]` table in the
//! optional TOML overrides file.

use super::{parse_f64, parse_usize};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Rolling-window periods for every indicator in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub ema_long_period: usize,
    pub atr_period: usize,
    pub stoch_period: usize,
    pub stoch_smooth: usize,
    pub adx_period: usize,
    pub mfi_period: usize,
    pub volume_period: usize,
    pub ichimoku_tenkan: usize,
    pub ichimoku_kijun: usize,
    pub ichimoku_senkou_b: usize,
    pub ichimoku_shift: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
            ema_fast_period: 9,
            ema_slow_period: 20,
            ema_long_period: 50,
            atr_period: 14,
            stoch_period: 14,
            stoch_smooth: 3,
            adx_period: 14,
            mfi_period: 14,
            volume_period: 20,
            ichimoku_tenkan: 9,
            ichimoku_kijun: 26,
            ichimoku_senkou_b: 52,
            ichimoku_shift: 26,
        }
    }
}

impl IndicatorSettings {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            rsi_period: parse_usize("SCREENER_RSI_PERIOD", d.rsi_period)?,
            macd_fast_period: parse_usize("SCREENER_MACD_FAST_PERIOD", d.macd_fast_period)?,
            macd_slow_period: parse_usize("SCREENER_MACD_SLOW_PERIOD", d.macd_slow_period)?,
            macd_signal_period: parse_usize("SCREENER_MACD_SIGNAL_PERIOD", d.macd_signal_period)?,
            bb_period: parse_usize("SCREENER_BB_PERIOD", d.bb_period)?,
            bb_std_dev: parse_f64("SCREENER_BB_STD_DEV", d.bb_std_dev)?,
            ema_fast_period: parse_usize("SCREENER_EMA_FAST_PERIOD", d.ema_fast_period)?,
            ema_slow_period: parse_usize("SCREENER_EMA_SLOW_PERIOD", d.ema_slow_period)?,
            ema_long_period: parse_usize("SCREENER_EMA_LONG_PERIOD", d.ema_long_period)?,
            atr_period: parse_usize("SCREENER_ATR_PERIOD", d.atr_period)?,
            stoch_period: parse_usize("SCREENER_STOCH_PERIOD", d.stoch_period)?,
            stoch_smooth: d.stoch_smooth,
            adx_period: parse_usize("SCREENER_ADX_PERIOD", d.adx_period)?,
            mfi_period: parse_usize("SCREENER_MFI_PERIOD", d.mfi_period)?,
            volume_period: parse_usize("SCREENER_VOLUME_PERIOD", d.volume_period)?,
            ichimoku_tenkan: d.ichimoku_tenkan,
            ichimoku_kijun: d.ichimoku_kijun,
            ichimoku_senkou_b: d.ichimoku_senkou_b,
            ichimoku_shift: d.ichimoku_shift,
        })
    }

    /// (name, value) pairs for period validation
    pub(super) fn periods(&self) -> [(&'static str, usize); 18] {
        [
            ("rsi_period", self.rsi_period),
            ("macd_fast_period", self.macd_fast_period),
            ("macd_slow_period", self.macd_slow_period),
            ("macd_signal_period", self.macd_signal_period),
            ("bb_period", self.bb_period),
            ("ema_fast_period", self.ema_fast_period),
            ("ema_slow_period", self.ema_slow_period),
            ("ema_long_period", self.ema_long_period),
            ("atr_period", self.atr_period),
            ("stoch_period", self.stoch_period),
            ("stoch_smooth", self.stoch_smooth),
            ("adx_period", self.adx_period),
            ("mfi_period", self.mfi_period),
            ("volume_period", self.volume_period),
            ("ichimoku_tenkan", self.ichimoku_tenkan),
            ("ichimoku_kijun", self.ichimoku_kijun),
            ("ichimoku_senkou_b", self.ichimoku_senkou_b),
            ("ichimoku_shift", self.ichimoku_shift),
        ]
    }
}

/// Cut-offs used to discretize indicator readings into signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub mfi_oversold: f64,
    pub mfi_overbought: f64,
    pub adx_strong_trend: f64,
    pub volume_high_ratio: f64,
    pub volume_elevated_ratio: f64,
    /// Percent move over the momentum window
    pub momentum_pct: f64,
    pub momentum_window: usize,
    /// Quantile of the band-width history below which a squeeze is flagged
    pub squeeze_percentile: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            mfi_oversold: 20.0,
            mfi_overbought: 80.0,
            adx_strong_trend: 25.0,
            volume_high_ratio: 1.5,
            volume_elevated_ratio: 1.2,
            momentum_pct: 2.0,
            momentum_window: 20,
            squeeze_percentile: 0.2,
        }
    }
}

impl SignalThresholds {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            rsi_oversold: parse_f64("SCREENER_RSI_OVERSOLD", d.rsi_oversold)?,
            rsi_overbought: parse_f64("SCREENER_RSI_OVERBOUGHT", d.rsi_overbought)?,
            stoch_oversold: parse_f64("SCREENER_STOCH_OVERSOLD", d.stoch_oversold)?,
            stoch_overbought: parse_f64("SCREENER_STOCH_OVERBOUGHT", d.stoch_overbought)?,
            mfi_oversold: parse_f64("SCREENER_MFI_OVERSOLD", d.mfi_oversold)?,
            mfi_overbought: parse_f64("SCREENER_MFI_OVERBOUGHT", d.mfi_overbought)?,
            adx_strong_trend: parse_f64("SCREENER_ADX_STRONG_TREND", d.adx_strong_trend)?,
            volume_high_ratio: parse_f64("SCREENER_VOLUME_HIGH_RATIO", d.volume_high_ratio)?,
            volume_elevated_ratio: parse_f64(
                "SCREENER_VOLUME_ELEVATED_RATIO",
                d.volume_elevated_ratio,
            )?,
            momentum_pct: parse_f64("SCREENER_MOMENTUM_PCT", d.momentum_pct)?,
            momentum_window: parse_usize("SCREENER_MOMENTUM_WINDOW", d.momentum_window)?,
            squeeze_percentile: parse_f64("SCREENER_SQUEEZE_PERCENTILE", d.squeeze_percentile)?,
        })
    }
}
