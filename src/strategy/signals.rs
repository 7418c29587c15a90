use crate::models::Signal;

/// Buy/sell thresholds around a moving average
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub buy: f64,
    pub sell: f64,
}

impl Thresholds {
    /// `buy = sma * (1 - range)`, `sell = sma * (1 + range)`
    pub fn from_sma(sma: f64, threshold_range: f64) -> Self {
        Self {
            buy: sma * (1.0 - threshold_range),
            sell: sma * (1.0 + threshold_range),
        }
    }

    /// Width of the no-trade band
    pub fn band_width(&self) -> f64 {
        self.sell - self.buy
    }
}

/// Map the previous close onto a direction.
///
/// Strict inequalities: a close exactly on either threshold is Neutral.
pub fn decide(previous_close: f64, thresholds: &Thresholds) -> Signal {
    if previous_close < thresholds.buy {
        Signal::Long
    } else if previous_close > thresholds.sell {
        Signal::Short
    } else {
        Signal::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_thresholds_from_sma() {
        let t = Thresholds::from_sma(100.0, 0.02);
        assert!(approx(t.buy, 98.0));
        assert!(approx(t.sell, 102.0));
    }

    #[test]
    fn test_band_brackets_sma() {
        for &(sma, range) in &[(100.0, 0.02), (2650.0, 0.005), (0.5, 0.9), (1.0e6, 0.0001)] {
            let t = Thresholds::from_sma(sma, range);
            assert!(t.buy < sma && sma < t.sell, "sma={} range={}", sma, range);
            assert!(approx(t.band_width(), 2.0 * range * sma));
        }
    }

    #[test]
    fn test_decide_long_below_band() {
        let t = Thresholds::from_sma(100.0, 0.02);
        assert_eq!(decide(97.0, &t), Signal::Long);
    }

    #[test]
    fn test_decide_short_above_band() {
        let t = Thresholds::from_sma(100.0, 0.02);
        assert_eq!(decide(103.0, &t), Signal::Short);
    }

    #[test]
    fn test_decide_neutral_inside_band() {
        let t = Thresholds::from_sma(100.0, 0.02);
        assert_eq!(decide(100.0, &t), Signal::Neutral);
    }

    #[test]
    fn test_decide_neutral_on_boundaries() {
        let t = Thresholds { buy: 98.0, sell: 102.0 };
        assert_eq!(decide(98.0, &t), Signal::Neutral);
        assert_eq!(decide(102.0, &t), Signal::Neutral);
    }
}
