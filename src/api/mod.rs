pub mod auth;
pub mod bybit;

pub use auth::RequestSigner;
pub use bybit::BybitClient;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{Bar, Order, OrderAck};

/// Parameters for a historical bar request
#[derive(Debug, Clone, PartialEq)]
pub struct KlineRequest {
    pub symbol: String,
    pub interval_minutes: u32,
    pub start_ms: i64,
    pub end_ms: i64,
    pub limit: usize,
}

/// Capabilities the trading loop needs from an exchange.
///
/// Implementations perform exactly one request per call and never retry;
/// the loop decides what a failure means for the current cycle.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Exchange server time as unix seconds
    async fn server_time(&self) -> Result<i64, ApiError>;

    /// Bars for the requested window, most recent first
    async fn klines(&self, request: &KlineRequest) -> Result<Vec<Bar>, ApiError>;

    /// Net position for `symbol`: positive long, negative short, zero flat
    async fn position_qty(&self, symbol: &str) -> Result<f64, ApiError>;

    /// Submit a market order. Flatten orders must be sent reduce-only.
    async fn place_market_order(&self, order: &Order) -> Result<OrderAck, ApiError>;
}
