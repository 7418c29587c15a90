// Trading strategy module
pub mod signals;
pub mod sma_band;

pub use signals::{decide, Thresholds};
pub use sma_band::{Evaluation, SmaBandStrategy};

use crate::error::BotError;
use crate::models::{Bar, Signal};

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal from bars ordered most-recent-first
    fn generate_signal(&self, bars: &[Bar]) -> Result<Signal, BotError>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum bars required for this strategy
    fn min_bars_required(&self) -> usize;
}
