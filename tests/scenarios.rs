use screener::application::indicators::IndicatorFrame;
use screener::application::market_data::signal_generator::SignalGenerator;
use screener::application::pipeline::ScreeningPipeline;
use screener::application::scoring::confidence::ConfidenceFusion;
use screener::application::scoring::direction::DirectionClassifier;
use screener::config::{DirectionThresholds, FusionConfig, IndicatorSettings, ScreenerConfig};
use screener::domain::market::bar::{Bar, BarSeries};
use screener::domain::market::instrument::InstrumentData;
use screener::domain::market::timeframe::Timeframe;
use screener::domain::screening::{Direction, ScreenOutcome, ScreenResult, SkipReason, Variant};
use screener::domain::signals::SignalChannel;
use screener::infrastructure::MockMarketDataProvider;

fn bars(closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .zip(volumes.iter())
        .enumerate()
        .map(|(i, (close, volume))| {
            let open = if i == 0 { *close } else { closes[i - 1] };
            Bar {
                timestamp: 1_700_000_000 + i as i64 * 300,
                open,
                high: open.max(*close) * 1.001,
                low: open.min(*close) * 0.999,
                close: *close,
                volume: *volume,
            }
        })
        .collect()
}

fn instrument(closes: &[f64], volumes: &[f64]) -> InstrumentData {
    InstrumentData::new(BarSeries::new("TEST", bars(closes, volumes)).unwrap())
}

fn qualified(outcome: ScreenOutcome) -> ScreenResult {
    match outcome {
        ScreenOutcome::Qualified(result) => *result,
        ScreenOutcome::Skipped(reason) => panic!("instrument was filtered: {}", reason),
    }
}

fn rising_instrument() -> InstrumentData {
    let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
    let mut volumes = vec![1_000_000.0; 60];
    volumes[59] = 2_000_000.0;
    instrument(&closes, &volumes)
}

#[test]
fn test_flat_series_is_neutral_with_squeeze() {
    let data = instrument(&[20.0; 60], &[2_000_000.0; 60]);
    let pipeline = ScreeningPipeline::new(&ScreenerConfig::default()).unwrap();
    let result = qualified(pipeline.analyze(&data, None).unwrap());

    assert_eq!(result.rsi_value, None);
    assert_eq!(result.rsi_signal, 0.0);
    assert_eq!(result.macd_signal, 0.0);
    assert!(result.bb_width.unwrap().abs() < 1e-9);
    assert!(result.bb_squeeze);
    assert_eq!(result.direction, Direction::Neutral);
    assert_eq!(result.confidence_score, 0.0);
}

#[test]
fn test_rising_series_has_mixed_signals() {
    let data = rising_instrument();
    let frame = IndicatorFrame::compute(&data.series, &IndicatorSettings::default());
    let signals = SignalGenerator::default().generate(&frame);

    assert!(signals.raw(SignalChannel::Rsi).unwrap() > 70.0);
    assert_eq!(signals.value(SignalChannel::Rsi), -1.0);
    assert_eq!(signals.value(SignalChannel::MovingAverage), 1.0);
    assert_eq!(signals.value(SignalChannel::Vwap), 1.0);
    assert_eq!(signals.value(SignalChannel::Volume), 1.0);

    let fusion = ConfidenceFusion::new(FusionConfig::default());
    assert!(!fusion.is_aligned(&signals));

    let pipeline = ScreeningPipeline::new(&ScreenerConfig::default()).unwrap();
    let result = qualified(pipeline.analyze(&data, None).unwrap());
    assert!(result.confidence_score > 0.0);
    assert!(result.confidence_score < 100.0);
}

#[test]
fn test_cheap_instrument_is_excluded_whatever_its_signals() {
    let closes: Vec<f64> = (0..60).map(|i| 3.0 * 0.99f64.powi(59 - i)).collect();
    let data = instrument(&closes, &[5_000_000.0; 60]);

    for variant in [Variant::Basic, Variant::AdvancedMl, Variant::AdvancedSentiment] {
        let config = ScreenerConfig {
            variant,
            ..ScreenerConfig::default()
        };
        let outcome = ScreeningPipeline::new(&config)
            .unwrap()
            .analyze(&data, None)
            .unwrap();
        assert!(matches!(
            outcome,
            ScreenOutcome::Skipped(SkipReason::PriceOutOfRange { .. })
        ));
    }
}

#[test]
fn test_five_class_direction_boundaries() {
    let classifier = DirectionClassifier::new(DirectionThresholds::default());
    assert_eq!(classifier.five_class(2.0), Direction::Long);
    assert_eq!(classifier.five_class(2.01), Direction::StrongLong);
    assert_eq!(classifier.five_class(0.0), Direction::Neutral);
    assert_eq!(classifier.five_class(-2.0), Direction::Short);
    assert_eq!(classifier.five_class(-2.01), Direction::StrongShort);
}

#[test]
fn test_analysis_is_deterministic() {
    let data = rising_instrument();
    let config = ScreenerConfig {
        variant: Variant::AdvancedMl,
        ..ScreenerConfig::default()
    };
    let first = ScreeningPipeline::new(&config).unwrap().analyze(&data, None).unwrap();
    let second = ScreeningPipeline::new(&config).unwrap().analyze(&data, None).unwrap();

    let first = serde_json::to_string(&qualified(first)).unwrap();
    let second = serde_json::to_string(&qualified(second)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_indicator_invariants_on_synthetic_walks() {
    let settings = IndicatorSettings::default();
    let provider = MockMarketDataProvider::new(7).with_bar_count(300);

    for ticker in ["AAPL", "TSLA", "SPY", "SOFI"] {
        let series =
            BarSeries::new(ticker, provider.synthetic_bars(ticker, Timeframe::FiveMin)).unwrap();
        let frame = IndicatorFrame::compute(&series, &settings);
        assert_eq!(frame.len(), series.len());

        for oscillator in [&frame.rsi, &frame.stoch_k, &frame.mfi] {
            assert!(
                oscillator
                    .iter()
                    .flatten()
                    .all(|v| (0.0..=100.0).contains(v))
            );
        }

        for i in 0..frame.len() {
            if let (Some(macd), Some(signal), Some(hist)) =
                (frame.macd[i], frame.macd_signal[i], frame.macd_hist[i])
            {
                assert!((hist - (macd - signal)).abs() < 1e-9);
            }
        }

        // Warmup windows are undefined, never zero
        assert!(frame.rsi[..settings.rsi_period - 1].iter().all(Option::is_none));
        assert!(frame.bb_width[..settings.bb_period - 1].iter().all(Option::is_none));
        assert!(frame.atr[..settings.atr_period - 1].iter().all(Option::is_none));
    }
}
