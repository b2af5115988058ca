use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use screener::application::ml::{Predictor, SmartcorePredictor};
use screener::application::pipeline::ScreeningPipeline;
use screener::application::scanner::{MarketScanner, ScanReport};
use screener::config::ScreenerConfig;
use screener::domain::ports::MarketDataProvider;
use screener::domain::screening::Variant;
use screener::infrastructure::observability::ScanMetrics;
use screener::infrastructure::sentiment::HeadlineSentimentSource;
use screener::infrastructure::universe::{
    FileUniverseSource, ResolvedUniverse, UniverseOrigin, normalize_tickers,
};
use screener::infrastructure::{
    CsvBarProvider, MockMarketDataProvider, UniverseCache, UniverseResolver,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Rank instruments by fused technical confidence", long_about = None)]
struct Args {
    /// Directory of <TICKER>.csv bar files (plus optional profiles.json)
    #[arg(long, conflicts_with = "mock")]
    data_dir: Option<PathBuf>,

    /// Use seeded synthetic market data instead of files
    #[arg(long, num_args = 0..=1, default_missing_value = "42")]
    mock: Option<u64>,

    /// Comma separated tickers. Skips universe resolution.
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,

    /// Universe list file, one ticker per line or comma separated
    #[arg(long)]
    universe_file: Option<PathBuf>,

    /// basic, advanced-ml or advanced-sentiment
    #[arg(long)]
    variant: Option<String>,

    #[arg(long)]
    top_n: Option<usize>,

    /// Trained predictor artifact (see train_predictor)
    #[arg(long)]
    model: Option<PathBuf>,

    /// TOML overrides applied on top of the environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON map of ticker to recent headlines
    #[arg(long)]
    headlines: Option<PathBuf>,

    /// Delay between fetches. Local sources default to none.
    #[arg(long)]
    request_delay_ms: Option<u64>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics after the scan
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = ScreenerConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = &args.config {
        config.apply_toml_file(path)?;
    }
    if let Some(variant) = &args.variant {
        config.variant = Variant::from_str(variant)?;
    }
    if let Some(top_n) = args.top_n {
        config.filters.top_n = top_n;
    }
    // Local sources have no rate limit to respect
    config.scan.request_delay_ms = args.request_delay_ms.unwrap_or(0);
    config
        .validate()
        .context("Invalid screener configuration")?;

    info!("Screener starting ({} variant)", config.variant);

    let (provider, csv_tickers): (Arc<dyn MarketDataProvider>, Vec<String>) =
        match (&args.data_dir, args.mock) {
            (Some(dir), _) => {
                let csv = CsvBarProvider::new(dir);
                let tickers = csv.available_tickers();
                info!("Reading bars from {:?} ({} files)", dir, tickers.len());
                let provider: Arc<dyn MarketDataProvider> = Arc::new(csv);
                (provider, tickers)
            }
            (None, Some(seed)) => {
                info!("Using synthetic market data (seed {})", seed);
                let provider: Arc<dyn MarketDataProvider> =
                    Arc::new(MockMarketDataProvider::new(seed));
                (provider, Vec::new())
            }
            (None, None) => bail!("Specify a data source: --data-dir <DIR> or --mock [SEED]"),
        };

    let universe = resolve_universe(&args, &config, csv_tickers).await;
    info!(
        "Universe: {} tickers ({})",
        universe.tickers.len(),
        universe.origin
    );

    let mut pipeline = ScreeningPipeline::new(&config)?;
    if config.variant.uses_predictor() && config.predictor.enabled {
        pipeline = pipeline.with_predictor(load_predictor(&args, &config));
    }

    let metrics = ScanMetrics::new()?;
    let mut scanner = MarketScanner::new(provider, Arc::new(pipeline), config.scan.clone())
        .with_metrics(metrics.clone());

    if config.variant.uses_sentiment() && config.sentiment.enabled {
        match &args.headlines {
            Some(path) => {
                let source =
                    HeadlineSentimentSource::from_json_file(path, config.sentiment.keyword_boost_weight)?;
                scanner = scanner.with_sentiment(Arc::new(source));
            }
            None => warn!("Sentiment variant without --headlines: sentiment is unavailable"),
        }
    }

    let report = scanner.scan(&universe.tickers).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    if args.metrics {
        println!("{}", metrics.render());
    }
    Ok(())
}

async fn resolve_universe(
    args: &Args,
    config: &ScreenerConfig,
    csv_tickers: Vec<String>,
) -> ResolvedUniverse {
    if !args.tickers.is_empty() {
        return ResolvedUniverse {
            tickers: normalize_tickers(&args.tickers),
            origin: UniverseOrigin::Explicit,
        };
    }
    if args.universe_file.is_none() && !csv_tickers.is_empty() {
        return ResolvedUniverse {
            tickers: csv_tickers,
            origin: UniverseOrigin::Explicit,
        };
    }

    let cache = UniverseCache::new(&config.scan.universe_cache_path);
    let mut resolver = UniverseResolver::new(cache, config.scan.universe_cache_ttl_secs);
    if let Some(path) = &args.universe_file {
        resolver = resolver.with_remote(Arc::new(FileUniverseSource::new(path)));
    }
    resolver.resolve(Utc::now()).await
}

/// A missing or unreadable artifact leaves the predictor untrained
fn load_predictor(args: &Args, config: &ScreenerConfig) -> Arc<dyn Predictor> {
    let predictor = match &args.model {
        Some(path) => SmartcorePredictor::load(path, config.predictor.clone()).unwrap_or_else(|e| {
            warn!("Failed to load predictor from {:?}: {}", path, e);
            SmartcorePredictor::new(config.predictor.clone())
        }),
        None => {
            info!("No predictor artifact given, predictions unavailable");
            SmartcorePredictor::new(config.predictor.clone())
        }
    };
    info!("Predictor: {} {}", predictor.name(), predictor.version());
    Arc::new(predictor)
}

fn print_report(report: &ScanReport) {
    println!("\n{}", report.summary());
    if let Some(message) = report.empty_state_message() {
        println!("\n{}", message);
        return;
    }

    println!(
        "\n{:<4} {:<7} {:>10} {:>8} {:>7} {:>8} {:<13} {:<6}",
        "#", "TICKER", "PRICE", "CHG%", "CONF", "MOVE%", "DIRECTION", "RISK"
    );
    for (rank, r) in report.results.iter().enumerate() {
        let change = r
            .price_change_pct
            .map(|c| format!("{:+.2}", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<7} {:>10.2} {:>8} {:>7.2} {:>+8.2} {:<13} {:<6}",
            rank + 1,
            r.ticker,
            r.current_price,
            change,
            r.confidence_score,
            r.predicted_move_pct,
            r.direction.to_string(),
            r.risk_level.to_string()
        );
    }

    if !report.failures.is_empty() {
        println!("\nFailed:");
        for issue in &report.failures {
            println!("  {}: {}", issue.ticker, issue.reason);
        }
    }
}
