// Candle-level indicators
// Candle colour/indecision classification and zig-zag pivots

pub mod candle_features;
pub mod pivots;

pub use candle_features::{classify_candle, CandleFeatures};
pub use pivots::{Pivot, PivotDetector, PivotKind, PivotList};
