use crate::models::{Direction, Trade};
use serde::{Deserialize, Serialize};

/// Why a zone touch did not become a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Candle colour disagrees with the direction and it is not indecision
    Colour,
    Saturday,
    /// Entry/stop-loss distance over `sl_width_pips`
    StopLossWidth,
}

/// Result of one backtest run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestOutcome {
    pub trades: Vec<Trade>,

    // Step counters
    pub steps: usize,
    pub recalibrations: usize,
    /// Steps without a candle within an hour of the simulated time
    pub skipped_steps: usize,
    /// Steps suppressed by an active trade
    pub in_trade_steps: usize,

    // Zone touches
    pub touches: usize,
    pub rejected_colour: usize,
    pub rejected_saturday: usize,
    pub rejected_sl_width: usize,
}

impl BacktestOutcome {
    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }

    pub(crate) fn record_rejection(&mut self, reason: Rejection) {
        match reason {
            Rejection::Colour => self.rejected_colour += 1,
            Rejection::Saturday => self.rejected_saturday += 1,
            Rejection::StopLossWidth => self.rejected_sl_width += 1,
        }
    }

    pub fn count_direction(&self, direction: Direction) -> usize {
        self.trades.iter().filter(|t| t.direction == direction).count()
    }

    /// Mean entry/stop-loss distance in pips, 0 without trades
    pub fn avg_risk_pips(&self) -> f64 {
        if self.trades.is_empty() {
            return 0.0;
        }
        self.trades.iter().map(|t| t.risk_pips()).sum::<f64>() / self.trades.len() as f64
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║               S/R COUNTER BACKTEST REPORT             ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 RUN SUMMARY");
        println!("  Steps:                 {}", self.steps);
        println!("  Recalibrations:        {}", self.recalibrations);
        println!("  In-trade steps:        {}", self.in_trade_steps);
        println!("  Skipped (no candle):   {}", self.skipped_steps);

        println!("\n🎯 ZONE TOUCHES");
        println!("  Touches:               {}", self.touches);
        println!("  Rejected (colour):     {}", self.rejected_colour);
        println!("  Rejected (Saturday):   {}", self.rejected_saturday);
        println!("  Rejected (SL width):   {}", self.rejected_sl_width);

        println!("\n📈 TRADES");
        println!("  Total:                 {}", self.trades.len());
        println!("  Long:                  {}", self.count_direction(Direction::Long));
        println!("  Short:                 {}", self.count_direction(Direction::Short));

        if self.has_trades() {
            println!("  Avg risk:              {:.1} pips", self.avg_risk_pips());
            println!(
                "\n  {:<17} {:<6} {:>9} {:>9} {:>9} {:>9} {:>6}",
                "Start", "Dir", "Entry", "SL", "TP", "Zone", "Rank"
            );
            for t in &self.trades {
                println!(
                    "  {:<17} {:<6} {:>9.5} {:>9.5} {:>9.5} {:>9.5} {:>3}/{:<2}",
                    t.start.format("%Y-%m-%d %H:%M"),
                    t.direction.to_string(),
                    t.entry,
                    t.stop_loss,
                    t.take_profit(),
                    t.zone_price,
                    t.zone_rank,
                    t.total_zones
                );
            }
        } else {
            println!("  No trades");
        }

        println!("\n═════════════════════════════════════════════════════════\n");
    }
}
