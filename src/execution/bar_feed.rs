use chrono::{DateTime, Duration, Utc};

use crate::api::{Exchange, KlineRequest};
use crate::error::BotError;
use crate::models::Bar;

/// Time window covering the last `interval * period` minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
}

impl BarWindow {
    pub fn ending_at(
        now: DateTime<Utc>,
        interval_minutes: u32,
        period: usize,
    ) -> Result<Self, BotError> {
        let overflow = || {
            BotError::Config(format!(
                "bar window of {} x {}m does not fit in a timestamp",
                period, interval_minutes
            ))
        };

        let limit = (interval_minutes as usize)
            .checked_mul(period)
            .ok_or_else(overflow)?;
        let span = i64::try_from(limit)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(overflow)?;
        let start = now.checked_sub_signed(span).ok_or_else(overflow)?;

        Ok(Self {
            start,
            end: now,
            limit,
        })
    }
}

/// Retrieves bars for one symbol at one interval
pub struct BarFeed<'a, E: Exchange + ?Sized> {
    exchange: &'a E,
    symbol: &'a str,
    interval_minutes: u32,
}

impl<'a, E: Exchange + ?Sized> BarFeed<'a, E> {
    pub fn new(exchange: &'a E, symbol: &'a str, interval_minutes: u32) -> Self {
        Self {
            exchange,
            symbol,
            interval_minutes,
        }
    }

    /// Fetch bars for `window`, most recent first.
    ///
    /// Failures are returned as-is; there is no retry and no fallback to stale bars.
    pub async fn fetch_bars(&self, window: &BarWindow) -> Result<Vec<Bar>, BotError> {
        let request = KlineRequest {
            symbol: self.symbol.to_string(),
            interval_minutes: self.interval_minutes,
            start_ms: window.start.timestamp_millis(),
            end_ms: window.end.timestamp_millis(),
            limit: window.limit,
        };

        let mut bars = self
            .exchange
            .klines(&request)
            .await
            .map_err(|source| BotError::Fetch {
                symbol: self.symbol.to_string(),
                source,
            })?;

        if !is_most_recent_first(&bars) {
            tracing::warn!(symbol = %self.symbol, "Bars arrived out of order, re-sorting");
            bars.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        bars.truncate(window.limit);

        tracing::debug!(
            symbol = %self.symbol,
            bars = bars.len(),
            start = %window.start,
            end = %window.end,
            "Fetched bar window"
        );

        Ok(bars)
    }
}

fn is_most_recent_first(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp >= w[1].timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{Order, OrderAck};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct StubExchange {
        bars: Result<Vec<Bar>, String>,
        seen: Mutex<Option<KlineRequest>>,
    }

    #[async_trait]
    impl Exchange for StubExchange {
        async fn server_time(&self) -> Result<i64, ApiError> {
            unreachable!()
        }

        async fn klines(&self, request: &KlineRequest) -> Result<Vec<Bar>, ApiError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            self.bars.clone().map_err(ApiError::Malformed)
        }

        async fn position_qty(&self, _symbol: &str) -> Result<f64, ApiError> {
            unreachable!()
        }

        async fn place_market_order(&self, _order: &Order) -> Result<OrderAck, ApiError> {
            unreachable!()
        }
    }

    fn bar_at(minute: u32, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 12, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
        }
    }

    #[test]
    fn test_window_spans_interval_times_period() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let window = BarWindow::ending_at(now, 5, 20).unwrap();

        assert_eq!(window.end, now);
        assert_eq!(window.start, now - Duration::minutes(100));
        assert_eq!(window.limit, 100);
    }

    #[test]
    fn test_window_overflow_is_error() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();

        let err = BarWindow::ending_at(now, 1, 100_000_000_000_000_000).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
        assert!(BarWindow::ending_at(now, 43200, usize::MAX).is_err());
    }

    #[tokio::test]
    async fn test_fetch_passes_window_in_millis() {
        let exchange = StubExchange {
            bars: Ok(vec![bar_at(2, 101.0), bar_at(1, 100.0)]),
            seen: Mutex::new(None),
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 3, 0).unwrap();
        let window = BarWindow::ending_at(now, 1, 2).unwrap();

        let bars = BarFeed::new(&exchange, "PAXGUSDT", 1)
            .fetch_bars(&window)
            .await
            .unwrap();

        assert_eq!(bars.len(), 2);
        let request = exchange.seen.lock().unwrap().clone().unwrap();
        assert_eq!(request.symbol, "PAXGUSDT");
        assert_eq!(request.end_ms, now.timestamp_millis());
        assert_eq!(request.start_ms, now.timestamp_millis() - 2 * 60_000);
        assert_eq!(request.limit, 2);
    }

    #[tokio::test]
    async fn test_fetch_orders_most_recent_first_and_caps_limit() {
        let exchange = StubExchange {
            bars: Ok(vec![bar_at(1, 100.0), bar_at(3, 102.0), bar_at(2, 101.0)]),
            seen: Mutex::new(None),
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 4, 0).unwrap();
        let window = BarWindow::ending_at(now, 1, 2).unwrap();

        let bars = BarFeed::new(&exchange, "PAXGUSDT", 1)
            .fetch_bars(&window)
            .await
            .unwrap();

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![102.0, 101.0]);
    }

    #[tokio::test]
    async fn test_fetch_error_carries_symbol() {
        let exchange = StubExchange {
            bars: Err("kline response has no result list".to_string()),
            seen: Mutex::new(None),
        };
        let window = BarWindow::ending_at(Utc::now(), 1, 20).unwrap();

        let err = BarFeed::new(&exchange, "PAXGUSDT", 1)
            .fetch_bars(&window)
            .await
            .unwrap_err();

        match err {
            BotError::Fetch { symbol, .. } => assert_eq!(symbol, "PAXGUSDT"),
            other => panic!("expected fetch error, got {:?}", other),
        }
    }
}
