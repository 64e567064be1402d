use crate::models::{Candle, Colour};

/// Derived features of a single candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleFeatures {
    pub colour: Colour,
    /// Body as a percentage of the full high-low range
    pub body_pct: f64,
    pub is_indecision: bool,
}

/// Classify a candle's colour and whether it is an indecision candle
///
/// A candle is indecision when its body is less than `ic_perc` percent of
/// its range. A candle with no range at all is treated as indecision.
pub fn classify_candle(candle: &Candle, ic_perc: f64) -> CandleFeatures {
    let colour = if candle.close > candle.open {
        Colour::Green
    } else if candle.close < candle.open {
        Colour::Red
    } else {
        Colour::Neutral
    };

    let range = candle.high - candle.low;
    let body_pct = if range > 0.0 {
        (candle.close - candle.open).abs() / range * 100.0
    } else {
        0.0
    };

    CandleFeatures {
        colour,
        body_pct,
        is_indecision: range <= 0.0 || body_pct < ic_perc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc::now(), open, high, low, close)
    }

    #[test]
    fn test_colour() {
        assert_eq!(classify_candle(&candle(1.0, 1.2, 0.9, 1.1), 10.0).colour, Colour::Green);
        assert_eq!(classify_candle(&candle(1.1, 1.2, 0.9, 1.0), 10.0).colour, Colour::Red);
        assert_eq!(classify_candle(&candle(1.0, 1.2, 0.9, 1.0), 10.0).colour, Colour::Neutral);
    }

    #[test]
    fn test_indecision_small_body() {
        // 1 pip body over a 20 pip range = 5%
        let features = classify_candle(&candle(1.0050, 1.0065, 1.0045, 1.0049), 20.0);
        assert!(features.is_indecision);
        assert!((features.body_pct - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_large_body_is_not_indecision() {
        let features = classify_candle(&candle(1.0060, 1.0065, 1.0045, 1.0046), 20.0);
        assert!(!features.is_indecision);
        assert_eq!(features.colour, Colour::Red);
    }

    #[test]
    fn test_flat_candle_is_indecision() {
        let features = classify_candle(&candle(1.0, 1.0, 1.0, 1.0), 10.0);
        assert!(features.is_indecision);
        assert_eq!(features.body_pct, 0.0);
    }
}
