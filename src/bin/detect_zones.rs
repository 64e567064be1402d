use anyhow::{Context, Result};
use clap::Parser;
use srbot::api::provider_for;
use srbot::models::{parse_utc, Pair, Timeframe};
use srbot::sr::zones_at;
use srbot::BotConfig;
use std::path::PathBuf;

/// Print the S/R zones visible at one date
#[derive(Parser)]
#[command(name = "detect_zones")]
struct Args {
    #[arg(short, long)]
    pair: String,

    #[arg(short, long, default_value = "H4")]
    timeframe: String,

    /// Evaluation time (YYYY-MM-DDTHH:MM, UTC)
    #[arg(short, long)]
    at: String,

    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long)]
    data_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("srbot=info")),
        )
        .init();

    let args = Args::parse();
    let config = BotConfig::load(args.settings.as_deref()).context("Failed to load settings")?;
    let pair = Pair::new(&args.pair);
    let timeframe: Timeframe = args.timeframe.parse()?;
    let at = parse_utc(&args.at)?;

    let provider = provider_for(&pair, timeframe, &config, args.data_file.as_deref())?;
    let zones = zones_at(provider.as_ref(), &pair, timeframe, at, &config)
        .await
        .context("Zone detection failed")?;

    println!("\n{} {} zones at {} ({} found)\n", pair, timeframe, at, zones.len());
    print!("{}", zones.report());

    Ok(())
}
