//! Per-instrument screening: filters, indicators, signals, prediction and
//! fusion, as one pure function of the fetched data.

use crate::application::indicators::IndicatorFrame;
use crate::application::market_data::feature_builder::FeatureBuilder;
use crate::application::market_data::signal_generator::SignalGenerator;
use crate::application::ml::{Prediction, Predictor, PredictorOutput};
use crate::application::scoring::{FusionEngine, FusionInputs};
use crate::config::{FilterConfig, IndicatorSettings, ScreenerConfig};
use crate::domain::errors::ScreenError;
use crate::domain::market::instrument::InstrumentData;
use crate::domain::screening::{ScreenOutcome, ScreenResult, SkipReason, Variant, round_to};
use crate::domain::sentiment::SentimentScore;
use crate::domain::signals::{SignalChannel, SignalVector};
use std::sync::Arc;
use tracing::debug;

pub struct ScreeningPipeline {
    filters: FilterConfig,
    indicators: IndicatorSettings,
    signals: SignalGenerator,
    fusion: FusionEngine,
    predictor: Option<Arc<dyn Predictor>>,
    sentiment_enabled: bool,
}

impl ScreeningPipeline {
    pub fn new(config: &ScreenerConfig) -> Result<Self, ScreenError> {
        config
            .validate()
            .map_err(|e| ScreenError::Configuration(e.to_string()))?;

        Ok(Self {
            filters: config.filters.clone(),
            indicators: config.indicators.clone(),
            signals: SignalGenerator::new(config.thresholds.clone()),
            fusion: FusionEngine::new(config),
            predictor: None,
            sentiment_enabled: config.sentiment.enabled,
        })
    }

    /// Attach a trained predictor. Ignored by the basic variant.
    pub fn with_predictor(mut self, predictor: Arc<dyn Predictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn variant(&self) -> Variant {
        self.fusion.variant()
    }

    pub fn filters(&self) -> &FilterConfig {
        &self.filters
    }

    pub fn analyze(
        &self,
        data: &InstrumentData,
        sentiment: Option<SentimentScore>,
    ) -> Result<ScreenOutcome, ScreenError> {
        let series = &data.series;
        let Some(latest) = series.latest() else {
            return Err(ScreenError::NoData);
        };
        if series.len() < self.filters.min_bars {
            return Err(ScreenError::InsufficientHistory {
                bars: series.len(),
                required: self.filters.min_bars,
            });
        }

        let price = latest.close;
        if price < self.filters.min_price || price > self.filters.max_price {
            return Ok(ScreenOutcome::Skipped(SkipReason::PriceOutOfRange { price }));
        }
        let avg_volume = data.average_volume().unwrap_or(0.0);
        if avg_volume < self.filters.min_volume {
            return Ok(ScreenOutcome::Skipped(SkipReason::VolumeBelowFloor {
                avg_volume,
            }));
        }

        let frame = IndicatorFrame::compute(series, &self.indicators);
        let signals = self.signals.generate(&frame);
        let prediction = self.predict(series.ticker(), &frame);
        let sentiment = sentiment.filter(|_| self.sentiment_enabled && self.variant().uses_sentiment());
        let volatility_pct = self.fusion.move_estimator().volatility_pct(&frame);
        let volume_ratio = signals.raw(SignalChannel::Volume);

        let fused = self.fusion.fuse(&FusionInputs {
            signals: &signals,
            predictor: prediction,
            sentiment,
            volatility_pct,
            volume_ratio,
            beta: data.beta(),
        });

        if fused.confidence < self.filters.min_confidence {
            return Ok(ScreenOutcome::Skipped(SkipReason::BelowMinConfidence {
                confidence: fused.confidence,
            }));
        }

        let result = ScreenResult {
            ticker: series.ticker().to_string(),
            current_price: round_to(price, 2),
            price_change_pct: series.price_change_pct().map(|p| round_to(p, 2)),
            confidence_score: fused.confidence,
            predicted_move_pct: fused.predicted_move_pct,
            direction: fused.direction,
            risk_level: fused.risk_level,
            variant: self.variant(),
            ml_probability: prediction.map(|p| round_to(p.probability * 100.0, 2)),
            ml_confidence: prediction.map(|p| round_to(p.confidence * 100.0, 2)),
            sentiment_score: sentiment.map(|s| round_to(s.value(), 2)),
            sentiment_impact: sentiment.map(|s| s.impact()),
            beta: round_to(data.beta(), 2),
            ..raw_fields(&signals)
        };
        Ok(ScreenOutcome::Qualified(Box::new(result)))
    }

    fn predict(&self, ticker: &str, frame: &IndicatorFrame) -> Option<PredictorOutput> {
        if !self.variant().uses_predictor() {
            return None;
        }
        let predictor = self.predictor.as_ref()?;
        let features = FeatureBuilder::new(frame).latest()?;

        match predictor.predict(&features) {
            Prediction::Available(output) => Some(output),
            Prediction::Unavailable(reason) => {
                debug!("{}: predictor unavailable ({:?})", ticker, reason);
                None
            }
        }
    }
}

/// Signal values and display readings, with the fused fields left empty
fn raw_fields(signals: &SignalVector) -> ScreenResult {
    let raw = |channel| signals.raw(channel).map(|v| round_to(v, 2));

    ScreenResult {
        ticker: String::new(),
        current_price: 0.0,
        price_change_pct: None,
        confidence_score: 0.0,
        predicted_move_pct: 0.0,
        direction: crate::domain::screening::Direction::Neutral,
        risk_level: crate::domain::screening::RiskLevel::Medium,
        variant: Variant::Basic,

        rsi_signal: signals.value(SignalChannel::Rsi),
        rsi_value: raw(SignalChannel::Rsi),
        macd_signal: signals.value(SignalChannel::Macd),
        bb_signal: signals.value(SignalChannel::Bollinger),
        bb_width: signals.bb_width().map(|w| round_to(w, 4)),
        bb_squeeze: signals.bb_squeeze(),
        vwap_signal: signals.value(SignalChannel::Vwap),
        vwap_distance: raw(SignalChannel::Vwap),
        ma_signal: signals.value(SignalChannel::MovingAverage),
        volume_signal: signals.value(SignalChannel::Volume),
        volume_ratio: raw(SignalChannel::Volume),
        momentum_signal: signals.value(SignalChannel::Momentum),
        momentum_pct: raw(SignalChannel::Momentum),
        stoch_signal: signals.value(SignalChannel::Stochastic),
        stoch_value: raw(SignalChannel::Stochastic),
        mfi_signal: signals.value(SignalChannel::Mfi),
        mfi_value: raw(SignalChannel::Mfi),
        adx_value: signals.adx().map(|v| round_to(v, 2)),
        trend_strength: signals.trend_strength(),

        ml_probability: None,
        ml_confidence: None,
        sentiment_score: None,
        sentiment_impact: None,
        beta: 1.0,
    }
}
