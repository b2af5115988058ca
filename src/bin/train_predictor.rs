use anyhow::{Context, Result, bail};
use clap::Parser;
use screener::application::indicators::IndicatorFrame;
use screener::application::market_data::feature_builder::FeatureBuilder;
use screener::application::ml::SmartcorePredictor;
use screener::config::ScreenerConfig;
use screener::domain::ml::feature_registry::LabeledSample;
use screener::infrastructure::CsvBarProvider;
use screener::infrastructure::csv_bars::load_series;
use screener::infrastructure::universe::normalize_tickers;
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train the up-move predictor from CSV bar history", long_about = None)]
struct Args {
    /// Directory of <TICKER>.csv bar files
    #[arg(long)]
    data_dir: PathBuf,

    /// Comma separated tickers (default: every CSV in the directory)
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,

    /// Where to write the trained artifact
    #[arg(long, default_value = "models/predictor.json")]
    output: PathBuf,

    /// Existing artifact to retrain. The new version number follows it.
    #[arg(long)]
    previous: Option<PathBuf>,

    /// TOML overrides (the [predictor] and [indicators] sections apply)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    n_trees: Option<usize>,

    #[arg(long)]
    max_depth: Option<u16>,

    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    let mut config = ScreenerConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = &args.config {
        config.apply_toml_file(path)?;
    }
    if let Some(n_trees) = args.n_trees {
        config.predictor.n_trees = n_trees;
    }
    if let Some(max_depth) = args.max_depth {
        config.predictor.max_depth = max_depth;
    }
    if let Some(seed) = args.seed {
        config.predictor.seed = seed;
    }
    config
        .validate()
        .context("Invalid screener configuration")?;

    let provider = CsvBarProvider::new(&args.data_dir);
    let tickers = if args.tickers.is_empty() {
        provider.available_tickers()
    } else {
        normalize_tickers(&args.tickers)
    };
    if tickers.is_empty() {
        bail!("No bar files found in {:?}", args.data_dir);
    }

    let mut samples: Vec<LabeledSample> = Vec::new();
    for ticker in &tickers {
        let path = provider.path_for(ticker);
        let series = match load_series(&path, ticker) {
            Ok(series) => series,
            Err(e) => {
                warn!("Skipping {}: {:#}", ticker, e);
                continue;
            }
        };
        let frame = IndicatorFrame::compute(&series, &config.indicators);
        let rows = FeatureBuilder::new(&frame).labeled_samples();
        info!(
            "{}: {} bars, {} labeled samples",
            ticker,
            series.len(),
            rows.len()
        );
        samples.extend(rows);
    }

    let mut predictor = match &args.previous {
        Some(path) => SmartcorePredictor::load(path, config.predictor.clone())
            .with_context(|| format!("Failed to load previous artifact {:?}", path))?,
        None => SmartcorePredictor::new(config.predictor.clone()),
    };

    let up = samples.iter().filter(|s| s.label() == 1).count();
    println!("\n══════════════════════════════════════════════════════");
    println!("  PREDICTOR TRAINING");
    println!("══════════════════════════════════════════════════════");
    println!("  Tickers:  {}", tickers.len());
    println!(
        "  Samples:  {} ({} up, {} down)",
        samples.len(),
        up,
        samples.len() - up
    );
    println!(
        "  Trees:    {} (max depth {}, seed {})",
        config.predictor.n_trees, config.predictor.max_depth, config.predictor.seed
    );

    let report = predictor
        .train(&samples)
        .context("Predictor training failed")?;

    println!("\n  Version:         v{}", report.version);
    println!("  Train samples:   {}", report.train_samples);
    println!("  Test samples:    {}", report.test_samples);
    println!("  Train accuracy:  {:.2}%", report.train_accuracy * 100.0);
    println!("  Test accuracy:   {:.2}%", report.test_accuracy * 100.0);

    predictor
        .save(&args.output)
        .with_context(|| format!("Failed to save artifact to {:?}", args.output))?;
    println!("\n  Saved to {:?}", args.output);
    Ok(())
}
