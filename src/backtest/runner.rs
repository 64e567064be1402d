use crate::api::CandleProvider;
use crate::backtest::outcome::{BacktestOutcome, Rejection};
use crate::backtest::report::{FileReportSink, ZoneReportSink};
use crate::config::BotConfig;
use crate::indicators::classify_candle;
use crate::models::{round_price, Candle, CandleSeries, Direction, Pair, Timeframe, Trade};
use crate::sr::{lookback_window, SrZoneDetector, ZoneDetector, ZoneHit, ZoneList};
use crate::strategy::{stop_loss_extreme, DirectionRule, PivotDirectionRule};
use crate::{BotError, Result};
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use std::sync::Arc;
use uuid::Uuid;

pub const STRATEGY_TAG: &str = "counter";

/// Largest accepted distance between the simulated time and the candle
/// served for it
fn max_candle_drift() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Scanning,
    /// A trade was opened; steps up to `until` are not evaluated
    InTrade { until: DateTime<Utc> },
}

/// Steps through `[start, end]` one candle at a time looking for zone
/// touches to trade against
pub struct BacktestEngine {
    provider: Arc<dyn CandleProvider>,
    detector: Box<dyn ZoneDetector>,
    direction_rule: Box<dyn DirectionRule>,
    report_sink: Box<dyn ZoneReportSink>,
    config: BotConfig,
    pair: Pair,
    timeframe: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    discard_saturday: bool,
}

impl BacktestEngine {
    /// Engine with the default collaborators: ladder zone detector, pivot
    /// direction rule and file reports under `report.outdir`
    pub fn new(
        provider: Arc<dyn CandleProvider>,
        pair: Pair,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        config: BotConfig,
    ) -> Result<Self> {
        config.validate()?;
        if start > end {
            return Err(BotError::Config(format!(
                "Backtest start {} is after end {}",
                start, end
            )));
        }

        Ok(Self {
            provider,
            detector: Box::new(SrZoneDetector::from_config(pair.clone(), &config)),
            direction_rule: Box::new(PivotDirectionRule::new(config.pivots.th_bounces)),
            report_sink: Box::new(FileReportSink::new(config.report.outdir.clone())),
            config,
            pair,
            timeframe,
            start,
            end,
            discard_saturday: true,
        })
    }

    pub fn with_detector(mut self, detector: Box<dyn ZoneDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_direction_rule(mut self, rule: Box<dyn DirectionRule>) -> Self {
        self.direction_rule = rule;
        self
    }

    pub fn with_report_sink(mut self, sink: Box<dyn ZoneReportSink>) -> Self {
        self.report_sink = sink;
        self
    }

    pub fn with_discard_saturday(mut self, discard: bool) -> Self {
        self.discard_saturday = discard;
        self
    }

    /// Run the simulation
    ///
    /// Provider and report errors abort the run; an empty trade list is a
    /// normal outcome.
    pub async fn run(&self) -> Result<BacktestOutcome> {
        let interval = self.timeframe.interval();
        let lookback = self.timeframe.periods(self.config.trade_bot.period_range)?;
        let period = self.config.trade_bot.period;

        tracing::info!(
            "Starting backtest {} {}: {} -> {} (look-back {} candles, recalibration every {} steps, {} direction)",
            self.pair,
            self.timeframe,
            self.start,
            self.end,
            self.config.trade_bot.period_range,
            period,
            self.direction_rule.name()
        );

        let series = self
            .provider
            .fetch_candles(&self.pair, self.timeframe, self.start - lookback, self.end)
            .await?;
        tracing::info!("Loaded {} candles", series.len());

        let mut outcome = BacktestOutcome::default();
        let mut state = EngineState::Scanning;
        let mut zones: Option<ZoneList> = None;
        let mut since_calibration = 0usize;
        let mut t = self.start;

        while t <= self.end {
            outcome.steps += 1;

            if let EngineState::InTrade { until } = state {
                if t <= until {
                    outcome.in_trade_steps += 1;
                    since_calibration += 1;
                    t += interval;
                    continue;
                }
                state = EngineState::Scanning;
            }

            if zones.is_none() || since_calibration >= period {
                let window = lookback_window(&series, t, lookback);
                let list = self.detector.detect(&window);
                tracing::info!("Identified {} zones for {}", list.len(), t);
                tracing::debug!("Zone report at {}:\n{}", t, list.report());
                self.report_sink.write(&self.pair, self.timeframe, t, &list)?;
                outcome.recalibrations += 1;
                since_calibration = 0;
                zones = Some(list);
            }

            if let Some(list) = zones.as_ref() {
                if let Some(trade) = self.evaluate_step(t, &series, lookback, list, &mut outcome).await? {
                    tracing::info!(
                        "Trade {} {} at {:.5} (SL {:.5}, zone {:.5}, rank {}/{})",
                        trade.direction,
                        trade.start,
                        trade.entry,
                        trade.stop_loss,
                        trade.zone_price,
                        trade.zone_rank,
                        trade.total_zones
                    );
                    state = EngineState::InTrade { until: t + interval };
                    outcome.trades.push(trade);
                }
            }

            since_calibration += 1;
            t += interval;
        }

        tracing::info!(
            "Backtest complete: {} trades over {} steps ({} recalibrations)",
            outcome.trades.len(),
            outcome.steps,
            outcome.recalibrations
        );

        Ok(outcome)
    }

    /// Touch test and trade construction for the candle at `t`
    async fn evaluate_step(
        &self,
        t: DateTime<Utc>,
        series: &CandleSeries,
        lookback: Duration,
        zones: &ZoneList,
        outcome: &mut BacktestOutcome,
    ) -> Result<Option<Trade>> {
        let candle = match self.provider.fetch_candle(&self.pair, self.timeframe, t).await? {
            Some(c) if (c.time - t).abs() <= max_candle_drift() => c,
            Some(c) => {
                tracing::info!("Analysed time {} does not match candle time {}, skipping", t, c.time);
                outcome.skipped_steps += 1;
                return Ok(None);
            }
            None => {
                tracing::info!("No candle at or after {}, skipping", t);
                outcome.skipped_steps += 1;
                return Ok(None);
            }
        };

        let Some(hit) = zones.on_area(&candle) else {
            return Ok(None);
        };
        outcome.touches += 1;

        let history = series.between(t - lookback, candle.time);
        let direction = self.direction_rule.infer(candle.time, &history);

        if let Some(reason) = self.check_candle(&candle, direction) {
            tracing::debug!("Touch at {} rejected: {:?}", candle.time, reason);
            outcome.record_rejection(reason);
            return Ok(None);
        }

        let trade = self.build_trade(&candle, direction, &history, hit, zones.len());
        if trade.risk_pips() > self.config.trade_bot.sl_width_pips {
            tracing::debug!(
                "Trade at {} rejected: SL width {:.1} pips over {}",
                candle.time,
                trade.risk_pips(),
                self.config.trade_bot.sl_width_pips
            );
            outcome.record_rejection(Rejection::StopLossWidth);
            return Ok(None);
        }

        Ok(Some(trade))
    }

    /// Colour/indecision and Saturday filters
    fn check_candle(&self, candle: &Candle, direction: Direction) -> Option<Rejection> {
        let features = classify_candle(candle, self.config.general.ic_perc);
        if !features.is_indecision && features.colour != direction.confirming_colour() {
            return Some(Rejection::Colour);
        }
        if self.discard_saturday && candle.time.weekday() == Weekday::Sat {
            tracing::info!("Possible trade at {} falls on a Saturday, skipping", candle.time);
            return Some(Rejection::Saturday);
        }
        None
    }

    fn build_trade(
        &self,
        candle: &Candle,
        direction: Direction,
        history: &CandleSeries,
        hit: ZoneHit<'_>,
        total_zones: usize,
    ) -> Trade {
        let add_pips = f64::from(self.config.trade.add_pips);
        let precision = self.config.general.precision;
        let pair = &self.pair;

        let (entry, stop_loss) = match direction {
            Direction::Short => {
                let extreme = stop_loss_extreme(history, direction).unwrap_or(candle.high);
                (pair.sub_pips(candle.low, add_pips), pair.add_pips(extreme, add_pips))
            }
            Direction::Long => {
                let extreme = stop_loss_extreme(history, direction).unwrap_or(candle.low);
                (pair.add_pips(candle.high, add_pips), pair.sub_pips(extreme, add_pips))
            }
        };

        Trade {
            id: Uuid::new_v4(),
            pair: pair.clone(),
            timeframe: self.timeframe,
            start: candle.time + self.timeframe.interval(),
            direction,
            entry: round_price(entry, precision),
            stop_loss: round_price(stop_loss, precision),
            zone_price: hit.zone.price,
            risk_reward: self.config.trade_bot.rr,
            strategy: STRATEGY_TAG.to_string(),
            total_zones,
            zone_rank: hit.rank,
        }
    }
}
