use crate::indicators::PivotList;
use crate::models::{round_price, CandleSeries};
use crate::sr::ZoneParams;
use serde::Serialize;

/// Decimal places kept on ladder prices
const LADDER_PRECISION: u32 = 5;

/// Candidate S/R level with the pivot activity found in its band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRow {
    pub price: f64,
    pub bounces: usize,
    pub score_per_bounce: f64,
    pub total_score: f64,
}

/// Ladder bounds: lowest low and highest high widened by the bound buffer
///
/// Returns `None` for an empty series.
pub fn price_bounds(series: &CandleSeries, params: &ZoneParams) -> Option<(f64, f64)> {
    let low = series.lowest()?;
    let high = series.highest()?;
    let low = round_price(params.pair.sub_pips(low, params.bound_pips), params.precision);
    let high = round_price(params.pair.add_pips(high, params.bound_pips), params.precision);
    Some((low, high))
}

/// Score every ladder level between the series bounds
///
/// Levels are `low + k * step` up to `high`; each is scored by the pivots
/// inside its `±half_width` band.
pub fn scan_levels(series: &CandleSeries, pivots: &PivotList, params: &ZoneParams) -> Vec<LevelRow> {
    let Some((low, high)) = price_bounds(series, params) else {
        return Vec::new();
    };

    let step = params.step();
    let half_width = params.half_width();

    tracing::info!(
        "Scanning S/R levels {:.5}-{:.5} (step {:.5}, {} pivots)",
        low,
        high,
        step,
        pivots.count()
    );

    let mut rows = Vec::new();
    let mut k: u32 = 0;
    loop {
        let price = round_price(low + f64::from(k) * step, LADDER_PRECISION);
        if price > high {
            break;
        }

        let in_band = pivots.in_band(price, half_width);
        let row = LevelRow {
            price,
            bounces: in_band.count(),
            score_per_bounce: round_price(in_band.avg_score(), 2),
            total_score: in_band.total_score(),
        };
        tracing::debug!(
            "Level {:.5}: {} bounces, total score {}",
            row.price,
            row.bounces,
            row.total_score
        );
        rows.push(row);
        k += 1;
    }

    rows
}
