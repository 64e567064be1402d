use chrono::{Datelike, Weekday};
use srbot::api::MemoryProvider;
use srbot::backtest::{
    BacktestEngine, BacktestOutcome, MarketScenario, MemoryReportSink, SyntheticDataGenerator,
};
use srbot::models::{CandleSeries, Pair, Timeframe};
use srbot::sr::{SrZoneDetector, ZoneDetector};
use srbot::BotConfig;
use std::sync::Arc;

const SETTINGS: &str = "\
[general]
precision = 4
ic_perc = 20

[pivots]
th_bounces = 0.005
hr_pips = 15

[trade_bot]
period_range = 300
period = 10
i_pips = 3
th = 0.5
add_pips = 10
sl_width_pips = 120
rr = 1.5

[trade]
add_pips = 3
";

fn config() -> BotConfig {
    BotConfig::from_ini_str(SETTINGS).unwrap()
}

fn ranging_series(num_candles: usize) -> CandleSeries {
    SyntheticDataGenerator::new(42)
        .generate(MarketScenario::Ranging, num_candles, Timeframe::Hours(4))
        .unwrap()
}

async fn run(series: CandleSeries, config: BotConfig, sink: Arc<MemoryReportSink>) -> BacktestOutcome {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("srbot=info")
        .try_init();

    let pair = Pair::new("EUR_USD");
    let timeframe = Timeframe::Hours(4);
    let start = series.first().unwrap().time + timeframe.periods(config.trade_bot.period_range).unwrap();
    let end = series.last().unwrap().time;

    let provider = Arc::new(MemoryProvider::new(pair.clone(), timeframe, series));
    BacktestEngine::new(provider, pair, timeframe, start, end, config)
        .unwrap()
        .with_report_sink(Box::new(sink))
        .run()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_ranging_market_produces_valid_trades() {
    let config = config();
    let sink = Arc::new(MemoryReportSink::new());
    let outcome = run(ranging_series(900), config.clone(), sink.clone()).await;

    assert!(outcome.recalibrations > 0);
    assert_eq!(sink.reports().len(), outcome.recalibrations);

    let interval = Timeframe::Hours(4).interval();
    for trade in &outcome.trades {
        // Risk filter
        assert!(trade.risk_pips() <= config.trade_bot.sl_width_pips + 1e-9);
        // Signal candle is never a Saturday
        assert_ne!((trade.start - interval).weekday(), Weekday::Sat);
        assert!(trade.zone_rank >= 1 && trade.zone_rank <= trade.total_zones);
        assert_eq!(trade.strategy, "counter");
    }

    // Active-trade suppression: consecutive signals are at least two candles apart
    for pair in outcome.trades.windows(2) {
        assert!(pair[1].start - pair[0].start >= interval * 2);
    }
}

#[tokio::test]
async fn test_recalibrated_zones_respect_merge_gap() {
    let config = config();
    let sink = Arc::new(MemoryReportSink::new());
    run(ranging_series(700), config.clone(), sink.clone()).await;

    let min_gap = 3.0 * 2.0 * f64::from(config.trade_bot.i_pips) * 0.0001;
    let reports = sink.reports();
    assert!(!reports.is_empty());
    for report in &reports {
        for pair in report.zones.zones().windows(2) {
            assert!(pair[1].price - pair[0].price >= min_gap - 1e-9);
        }
    }
}

#[tokio::test]
async fn test_backtest_is_deterministic() {
    let first = run(ranging_series(700), config(), Arc::new(MemoryReportSink::new())).await;
    let second = run(ranging_series(700), config(), Arc::new(MemoryReportSink::new())).await;

    let summary = |o: &BacktestOutcome| {
        o.trades
            .iter()
            .map(|t| (t.start, t.direction, t.entry, t.stop_loss, t.zone_price))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&first), summary(&second));
    assert_eq!(first.touches, second.touches);
}

#[tokio::test]
async fn test_weekend_gaps_are_skipped() {
    let config = config();
    let series = SyntheticDataGenerator::new(42)
        .generate(MarketScenario::WeekendGaps, 900, Timeframe::Hours(4))
        .unwrap();
    let outcome = run(series, config, Arc::new(MemoryReportSink::new())).await;

    // Saturday and Sunday steps have no candle within an hour
    assert!(outcome.skipped_steps > 0);
    assert!(outcome.trades.iter().all(|t| {
        let signal = t.start - Timeframe::Hours(4).interval();
        !matches!(signal.weekday(), Weekday::Sat | Weekday::Sun)
    }));
}

#[test]
fn test_detector_on_ranging_market_finds_band_edges() {
    let config = config();
    let series = ranging_series(600);
    let detector = SrZoneDetector::from_config(Pair::new("EUR_USD"), &config);
    let zones = detector.detect(&series);

    assert!(!zones.is_empty());
    // Swings run between roughly 1.0835 and 1.1165
    assert!(zones.iter().all(|z| z.price > 1.07 && z.price < 1.13));
}
