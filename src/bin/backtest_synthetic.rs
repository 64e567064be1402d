use srbot::api::MemoryProvider;
use srbot::backtest::{BacktestEngine, BacktestOutcome, MarketScenario, MemoryReportSink, SyntheticDataGenerator};
use srbot::models::{Direction, Pair, Timeframe};
use srbot::BotConfig;
use std::sync::Arc;

const NUM_CANDLES: usize = 1500;
const LOOKBACK: usize = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("srbot=info").init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║          S/R COUNTER BACKTESTING SUITE                ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let pair = Pair::new("EUR_USD");
    let timeframe = Timeframe::Hours(4);

    let mut config = BotConfig::default();
    config.trade_bot.period_range = LOOKBACK;
    config.pivots.th_bounces = 0.005;
    config.pivots.hr_pips = 15;

    let scenarios = [
        (MarketScenario::Ranging, "↔️  Ranging (±1.5% swings)"),
        (MarketScenario::Uptrend, "📈 Uptrend with pullbacks"),
        (MarketScenario::Downtrend, "📉 Downtrend with pullbacks"),
        (MarketScenario::Volatile, "⚡ Volatile (±0.6% per candle)"),
        (MarketScenario::WeekendGaps, "🕳️  Weekend gaps"),
    ];

    let mut results = Vec::new();

    for (scenario, name) in scenarios {
        let mut generator = SyntheticDataGenerator::new(42);
        let series = generator.generate(scenario, NUM_CANDLES, timeframe)?;
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            eprintln!("❌ No candles generated for {}", name);
            continue;
        };
        let start = first.time + timeframe.periods(LOOKBACK)?;
        let end = last.time;

        println!("\n🔬 Running backtest: {}", name);
        println!("   Candles: {}", series.len());

        let provider = Arc::new(MemoryProvider::new(pair.clone(), timeframe, series));
        let engine = BacktestEngine::new(provider, pair.clone(), timeframe, start, end, config.clone())?
            .with_report_sink(Box::new(MemoryReportSink::new()));

        match engine.run().await {
            Ok(outcome) => {
                outcome.print_report();
                results.push((name, outcome));
            }
            Err(e) => eprintln!("❌ Backtest failed for {}: {}", name, e),
        }
    }

    print_summary_comparison(&results);

    Ok(())
}

fn print_summary_comparison(results: &[(&str, BacktestOutcome)]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!(
        "{:<32} {:>7} {:>6} {:>6} {:>8} {:>10}",
        "Scenario", "Trades", "Long", "Short", "Touches", "Avg risk"
    );
    println!("{}", "─".repeat(74));

    for (name, outcome) in results {
        println!(
            "{:<32} {:>7} {:>6} {:>6} {:>8} {:>10.1}",
            name,
            outcome.trades.len(),
            outcome.count_direction(Direction::Long),
            outcome.count_direction(Direction::Short),
            outcome.touches,
            outcome.avg_risk_pips()
        );
    }

    let total_trades: usize = results.iter().map(|(_, o)| o.trades.len()).sum();
    println!("\n📊 Total trades across all scenarios: {}", total_trades);
    println!("\n═══════════════════════════════════════════════════════\n");
}
