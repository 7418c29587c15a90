use serde::Deserialize;

/// How closing prices are treated before averaging
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CloseTruncation {
    /// Drop the fractional part of every close (toward zero) before averaging.
    /// Kept as the default so SMA values match the bot's historical output.
    #[default]
    Truncate,
    /// Average closes at full precision
    Exact,
}

impl CloseTruncation {
    pub fn apply(self, close: f64) -> f64 {
        match self {
            CloseTruncation::Truncate => close.trunc(),
            CloseTruncation::Exact => close,
        }
    }
}

/// Calculate Simple Moving Average (SMA) over the `period` most recent closes.
///
/// `closes` is ordered most-recent-first, so the window is the first `period`
/// elements. Returns `None` when there are fewer than `period` closes.
pub fn calculate_sma(closes: &[f64], period: usize, truncation: CloseTruncation) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let sum: f64 = closes
        .iter()
        .take(period)
        .map(|&close| truncation.apply(close))
        .sum();
    Some(sum / period as f64)
}
