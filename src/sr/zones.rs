use crate::models::{Candle, Pair};
use crate::sr::LevelRow;
use serde::Serialize;

/// Horizontal support/resistance zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub price: f64,
    pub half_width_pips: f64,
    /// `half_width_pips` in price units
    pub half_width: f64,
    pub bounces: usize,
    pub total_score: f64,
    pub score_per_bounce: f64,
}

impl Zone {
    pub fn from_level(row: &LevelRow, pair: &Pair, half_width_pips: f64) -> Self {
        Self {
            price: row.price,
            half_width_pips,
            half_width: pair.pips_to_price(half_width_pips),
            bounces: row.bounces,
            total_score: row.total_score,
            score_per_bounce: row.score_per_bounce,
        }
    }

    pub fn lower(&self) -> f64 {
        self.price - self.half_width
    }

    pub fn upper(&self) -> f64 {
        self.price + self.half_width
    }

    /// Band intersects the candle's low-high range
    pub fn overlaps(&self, candle: &Candle) -> bool {
        self.lower() <= candle.high && self.upper() >= candle.low
    }
}

/// Zone touched by a candle, with its 1-based score rank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneHit<'a> {
    pub zone: &'a Zone,
    pub rank: usize,
}

/// Zones found in one look-back window, ascending by price
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneList {
    zones: Vec<Zone>,
}

impl ZoneList {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    /// Best zone whose band overlaps `candle`
    ///
    /// With several touched zones the highest total score wins, then the
    /// lowest price.
    pub fn on_area(&self, candle: &Candle) -> Option<ZoneHit<'_>> {
        let mut best: Option<(usize, &Zone)> = None;
        for (i, zone) in self.zones.iter().enumerate() {
            if !zone.overlaps(candle) {
                continue;
            }
            best = match best {
                Some((_, b)) if b.total_score > zone.total_score => best,
                Some((_, b)) if b.total_score == zone.total_score && b.price <= zone.price => best,
                _ => Some((i, zone)),
            };
        }

        best.map(|(i, zone)| ZoneHit {
            zone,
            rank: self.rank(i),
        })
    }

    /// 1-based position of zone `index` when ordered by descending score
    ///
    /// Equal scores keep creation order.
    pub fn rank(&self, index: usize) -> usize {
        let target = &self.zones[index];
        let ahead = self
            .zones
            .iter()
            .enumerate()
            .filter(|(i, z)| {
                z.total_score > target.total_score || (z.total_score == target.total_score && *i < index)
            })
            .count();
        ahead + 1
    }

    /// Tab-separated text report, one zone per line after a header
    pub fn report(&self) -> String {
        let mut out = String::from("price\tpips\tbounces\tscore_per_bounce\ttotal_score\n");
        for zone in &self.zones {
            out.push_str(&format!(
                "{:.5}\t{}\t{}\t{:.2}\t{:.5}\n",
                zone.price, zone.half_width_pips, zone.bounces, zone.score_per_bounce, zone.total_score
            ));
        }
        out
    }
}

impl<'a> IntoIterator for &'a ZoneList {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}
