use anyhow::{Context, Result};
use clap::Parser;
use srbot::api::provider_for;
use srbot::backtest::BacktestEngine;
use srbot::models::{parse_utc, Pair, Timeframe};
use srbot::BotConfig;
use std::path::PathBuf;

/// Backtest the S/R counter-trend rule over historical candles
#[derive(Parser)]
#[command(name = "srbot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Currency pair in OANDA notation (e.g. AUD_USD)
    #[arg(short, long)]
    pair: String,

    /// Candle granularity: D or H<n>
    #[arg(short, long, default_value = "H4")]
    timeframe: String,

    /// First simulated time (YYYY-MM-DDTHH:MM, UTC)
    #[arg(short, long)]
    start: String,

    /// Last simulated time (YYYY-MM-DDTHH:MM, UTC)
    #[arg(short, long)]
    end: String,

    /// INI settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// OANDA-format JSON dump used instead of the live API
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Also trade signals whose candle falls on a Saturday
    #[arg(long, default_value = "false")]
    keep_saturday: bool,

    /// Write the accepted trades as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();

    let config = BotConfig::load(cli.settings.as_deref()).context("Failed to load settings")?;
    let pair = Pair::new(&cli.pair);
    let timeframe: Timeframe = cli.timeframe.parse()?;
    let start = parse_utc(&cli.start)?;
    let end = parse_utc(&cli.end)?;

    tracing::info!("🚀 srbot backtest {} {} from {} to {}", pair, timeframe, start, end);

    let provider = provider_for(&pair, timeframe, &config, cli.data_file.as_deref())
        .context("Failed to set up candle provider")?;

    let engine = BacktestEngine::new(provider, pair, timeframe, start, end, config)?
        .with_discard_saturday(!cli.keep_saturday);

    let outcome = engine.run().await.context("Backtest failed")?;
    outcome.print_report();

    if let Some(path) = cli.json {
        let json = serde_json::to_string_pretty(&outcome.trades)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write trades to {}", path.display()))?;
        tracing::info!("Trades written to {}", path.display());
    }

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("srbot=info")),
        )
        .init();
}
