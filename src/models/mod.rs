use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLC bar for one interval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Long,
    Short,
    Neutral,
}

impl Signal {
    /// +1 for Long, -1 for Short, 0 for Neutral
    pub fn direction(self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Short => -1,
            Signal::Neutral => 0,
        }
    }
}

/// Why an order is being sent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderIntent {
    /// Close an opposing position to zero (reduce-only)
    Flatten,
    /// Open a new position in the signal's direction
    Entry,
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderIntent::Flatten => write!(f, "flatten"),
            OrderIntent::Entry => write!(f, "entry"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        }
    }
}

/// Market order with a signed quantity (positive buys, negative sells)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub symbol: String,
    pub quantity: f64,
    pub intent: OrderIntent,
}

impl Order {
    pub fn side(&self) -> OrderSide {
        if self.quantity >= 0.0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }

    /// Unsigned size as sent to the exchange
    pub fn size(&self) -> f64 {
        self.quantity.abs()
    }

    pub fn reduce_only(&self) -> bool {
        self.intent == OrderIntent::Flatten
    }
}

/// Exchange acknowledgement for a submitted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderAck {
    pub order_id: String,
    pub order_link_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_direction() {
        assert_eq!(Signal::Long.direction(), 1);
        assert_eq!(Signal::Short.direction(), -1);
        assert_eq!(Signal::Neutral.direction(), 0);
    }

    #[test]
    fn test_order_side_and_size() {
        let order = Order {
            symbol: "PAXGUSDT".to_string(),
            quantity: -0.5,
            intent: OrderIntent::Flatten,
        };

        assert_eq!(order.side(), OrderSide::Sell);
        assert_eq!(order.size(), 0.5);
        assert!(order.reduce_only());
    }

    #[test]
    fn test_entry_is_not_reduce_only() {
        let order = Order {
            symbol: "PAXGUSDT".to_string(),
            quantity: 0.01,
            intent: OrderIntent::Entry,
        };

        assert_eq!(order.side(), OrderSide::Buy);
        assert!(!order.reduce_only());
    }
}
