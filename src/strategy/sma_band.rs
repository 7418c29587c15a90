use super::signals::{decide, Thresholds};
use super::Strategy;
use crate::config::BotConfig;
use crate::error::BotError;
use crate::indicators::{calculate_sma, CloseTruncation};
use crate::models::{Bar, Signal};

/// Mean-reversion around an SMA: buy below the band, sell above it.
#[derive(Debug, Clone)]
pub struct SmaBandStrategy {
    period: usize,
    threshold_range: f64,
    truncation: CloseTruncation,
}

/// Everything derived from one cycle's bars
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub sma: f64,
    pub thresholds: Thresholds,
    pub previous_close: f64,
    pub signal: Signal,
}

impl SmaBandStrategy {
    pub fn new(period: usize, threshold_range: f64, truncation: CloseTruncation) -> Self {
        Self {
            period,
            threshold_range,
            truncation,
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.period, config.threshold_range, config.close_truncation)
    }

    /// Compute SMA, thresholds and signal. `bars[0]` is the most recent bar.
    pub fn evaluate(&self, bars: &[Bar]) -> Result<Evaluation, BotError> {
        let insufficient = || BotError::InsufficientBars {
            needed: self.min_bars_required(),
            got: bars.len(),
        };
        if bars.is_empty() || bars.len() < self.min_bars_required() {
            return Err(insufficient());
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let sma = calculate_sma(&closes, self.period, self.truncation).ok_or_else(insufficient)?;

        let previous_close = closes[0];
        let thresholds = Thresholds::from_sma(sma, self.threshold_range);
        let signal = decide(previous_close, &thresholds);

        tracing::debug!(
            sma = sma,
            buy = thresholds.buy,
            sell = thresholds.sell,
            previous_close = previous_close,
            ?signal,
            "Evaluated SMA band"
        );

        Ok(Evaluation {
            sma,
            thresholds,
            previous_close,
            signal,
        })
    }
}

impl Strategy for SmaBandStrategy {
    fn generate_signal(&self, bars: &[Bar]) -> Result<Signal, BotError> {
        Ok(self.evaluate(bars)?.signal)
    }

    fn name(&self) -> &str {
        "sma_band"
    }

    fn min_bars_required(&self) -> usize {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let newest = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: newest - Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
            })
            .collect()
    }

    #[test]
    fn test_long_when_close_drops_below_band() {
        // SMA(4) = (97 + 101 + 101 + 101) / 4 = 100, buy threshold = 98
        let strategy = SmaBandStrategy::new(4, 0.02, CloseTruncation::Exact);
        let eval = strategy
            .evaluate(&bars_from_closes(&[97.0, 101.0, 101.0, 101.0]))
            .unwrap();

        assert_eq!(eval.sma, 100.0);
        assert_eq!(eval.previous_close, 97.0);
        assert_eq!(eval.signal, Signal::Long);
    }

    #[test]
    fn test_short_when_close_rises_above_band() {
        // SMA(4) = (104 + 99 + 99 + 98) / 4 = 100, sell threshold = 102
        let strategy = SmaBandStrategy::new(4, 0.02, CloseTruncation::Exact);
        let signal = strategy
            .generate_signal(&bars_from_closes(&[104.0, 99.0, 99.0, 98.0]))
            .unwrap();

        assert_eq!(signal, Signal::Short);
    }

    #[test]
    fn test_neutral_inside_band() {
        let strategy = SmaBandStrategy::new(3, 0.02, CloseTruncation::Exact);
        let eval = strategy
            .evaluate(&bars_from_closes(&[100.0, 100.0, 100.0]))
            .unwrap();

        assert_eq!(eval.signal, Signal::Neutral);
    }

    #[test]
    fn test_previous_close_is_not_truncated() {
        // SMA from truncated closes is 100, but the raw close 97.9 is compared
        let strategy = SmaBandStrategy::new(2, 0.02, CloseTruncation::Truncate);
        let eval = strategy.evaluate(&bars_from_closes(&[97.9, 103.5])).unwrap();

        assert_eq!(eval.sma, 100.0);
        assert_eq!(eval.previous_close, 97.9);
        assert_eq!(eval.signal, Signal::Long);
    }

    #[test]
    fn test_insufficient_bars() {
        let strategy = SmaBandStrategy::new(20, 0.02, CloseTruncation::Truncate);
        let err = strategy
            .evaluate(&bars_from_closes(&[100.0, 101.0]))
            .unwrap_err();

        assert!(matches!(
            err,
            BotError::InsufficientBars { needed: 20, got: 2 }
        ));
    }

    #[test]
    fn test_evaluates_with_exactly_min_bars() {
        let strategy = SmaBandStrategy::new(3, 0.02, CloseTruncation::Exact);
        let needed = strategy.min_bars_required();

        let short = bars_from_closes(&vec![100.0; needed - 1]);
        assert!(matches!(
            strategy.evaluate(&short),
            Err(BotError::InsufficientBars { needed: 3, got: 2 })
        ));
        assert!(strategy.evaluate(&bars_from_closes(&vec![100.0; needed])).is_ok());
        assert!(matches!(
            strategy.evaluate(&[]),
            Err(BotError::InsufficientBars { got: 0, .. })
        ));
    }

    #[test]
    fn test_strategy_metadata() {
        let strategy = SmaBandStrategy::new(14, 0.01, CloseTruncation::Exact);
        assert_eq!(strategy.name(), "sma_band");
        assert_eq!(strategy.min_bars_required(), 14);
    }
}
