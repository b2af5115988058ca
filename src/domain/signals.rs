//! Discrete indicator signals for one evaluated bar.
//!
//! A signal is one of `{-1, -0.5, 0, 0.5, 1}`: the sign encodes bearish or
//! bullish, the magnitude encodes strength. Undefined indicator readings map
//! to 0.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalChannel {
    Rsi,
    Macd,
    Bollinger,
    Vwap,
    MovingAverage,
    Volume,
    Momentum,
    Stochastic,
    Mfi,
}

impl SignalChannel {
    pub const ALL: [SignalChannel; 9] = [
        SignalChannel::Rsi,
        SignalChannel::Macd,
        SignalChannel::Bollinger,
        SignalChannel::Vwap,
        SignalChannel::MovingAverage,
        SignalChannel::Volume,
        SignalChannel::Momentum,
        SignalChannel::Stochastic,
        SignalChannel::Mfi,
    ];

    /// Channels whose sum drives the move estimate and the direction call.
    /// Volume, squeeze and trend strength carry no direction.
    pub const DIRECTIONAL: [SignalChannel; 6] = [
        SignalChannel::Rsi,
        SignalChannel::Macd,
        SignalChannel::Bollinger,
        SignalChannel::Vwap,
        SignalChannel::MovingAverage,
        SignalChannel::Momentum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalChannel::Rsi => "rsi",
            SignalChannel::Macd => "macd",
            SignalChannel::Bollinger => "bollinger",
            SignalChannel::Vwap => "vwap",
            SignalChannel::MovingAverage => "moving_average",
            SignalChannel::Volume => "volume",
            SignalChannel::Momentum => "momentum",
            SignalChannel::Stochastic => "stochastic",
            SignalChannel::Mfi => "mfi",
        }
    }
}

impl fmt::Display for SignalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignalChannel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let key = key.strip_suffix("_signal").unwrap_or(&key);
        match key {
            "rsi" => Ok(SignalChannel::Rsi),
            "macd" => Ok(SignalChannel::Macd),
            "bollinger" | "bb" => Ok(SignalChannel::Bollinger),
            "vwap" => Ok(SignalChannel::Vwap),
            "moving_average" | "ma" => Ok(SignalChannel::MovingAverage),
            "volume" => Ok(SignalChannel::Volume),
            "momentum" => Ok(SignalChannel::Momentum),
            "stochastic" | "stoch" => Ok(SignalChannel::Stochastic),
            "mfi" => Ok(SignalChannel::Mfi),
            _ => Err(anyhow!("Unknown signal channel: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrength {
    Strong,
    Weak,
}

/// One channel's discrete signal plus the indicator reading it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalEntry {
    pub value: f64,
    pub raw: Option<f64>,
}

/// Snap to the nearest member of {-1, -0.5, 0, 0.5, 1}
fn discretize(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    ((value * 2.0).round() / 2.0).clamp(-1.0, 1.0)
}

/// Signals for a single evaluated bar. Built by chaining `with_*` calls;
/// there is no way to mutate a vector once it has been handed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalVector {
    entries: BTreeMap<SignalChannel, SignalEntry>,
    bb_squeeze: bool,
    bb_width: Option<f64>,
    adx: Option<f64>,
    trend_strength: Option<TrendStrength>,
}

impl SignalVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signal(mut self, channel: SignalChannel, value: f64, raw: Option<f64>) -> Self {
        self.entries.insert(
            channel,
            SignalEntry {
                value: discretize(value),
                raw,
            },
        );
        self
    }

    pub fn with_squeeze(mut self, squeeze: bool, width: Option<f64>) -> Self {
        self.bb_squeeze = squeeze;
        self.bb_width = width;
        self
    }

    pub fn with_trend_strength(mut self, adx: Option<f64>, strength: Option<TrendStrength>) -> Self {
        self.adx = adx;
        self.trend_strength = strength;
        self
    }

    /// Signal value for a channel; absent channels read as neutral
    pub fn value(&self, channel: SignalChannel) -> f64 {
        self.entries.get(&channel).map(|e| e.value).unwrap_or(0.0)
    }

    pub fn raw(&self, channel: SignalChannel) -> Option<f64> {
        self.entries.get(&channel).and_then(|e| e.raw)
    }

    pub fn contains(&self, channel: SignalChannel) -> bool {
        self.entries.contains_key(&channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalChannel, &SignalEntry)> {
        self.entries.iter().map(|(c, e)| (*c, e))
    }

    /// Sum over the directional channels
    pub fn directional_sum(&self) -> f64 {
        SignalChannel::DIRECTIONAL
            .iter()
            .map(|c| self.value(*c))
            .sum()
    }

    pub fn bb_squeeze(&self) -> bool {
        self.bb_squeeze
    }

    pub fn bb_width(&self) -> Option<f64> {
        self.bb_width
    }

    pub fn adx(&self) -> Option<f64> {
        self.adx
    }

    pub fn trend_strength(&self) -> Option<TrendStrength> {
        self.trend_strength
    }
}
