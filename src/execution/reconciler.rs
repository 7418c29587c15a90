use crate::models::{Order, OrderIntent, Signal};

/// Orders to submit this cycle, in submission order
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileDecision {
    pub orders: Vec<Order>,
    pub reason: String,
}

impl ReconcileDecision {
    fn skip(reason: impl Into<String>) -> Self {
        Self {
            orders: Vec::new(),
            reason: reason.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Decide what to send given the new signal and the current net position.
///
/// An opposing position is always flattened before the entry order, so the
/// returned list is `[flatten, entry]`, `[entry]`, or empty. A position that
/// already agrees with the signal is left alone.
pub fn reconcile(
    signal: Signal,
    symbol: &str,
    current_qty: f64,
    order_size: f64,
) -> ReconcileDecision {
    if signal == Signal::Neutral {
        return ReconcileDecision::skip("Neutral signal");
    }
    let direction = f64::from(signal.direction());

    // Same sign as the signal: already positioned
    if current_qty * direction > 0.0 {
        return ReconcileDecision::skip(format!(
            "Already holding {:?} position of {}",
            signal, current_qty
        ));
    }

    let mut orders = Vec::with_capacity(2);
    if current_qty != 0.0 {
        orders.push(Order {
            symbol: symbol.to_string(),
            quantity: -current_qty,
            intent: OrderIntent::Flatten,
        });
    }
    orders.push(Order {
        symbol: symbol.to_string(),
        quantity: direction * order_size,
        intent: OrderIntent::Entry,
    });

    let reason = if orders.len() == 2 {
        format!("{:?} signal: flatten {} then enter", signal, current_qty)
    } else {
        format!("{:?} signal from flat", signal)
    };

    ReconcileDecision { orders, reason }
}
