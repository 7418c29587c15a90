// Minute-aligned trading loop, one cycle per exchange minute

use chrono::{DateTime, Local, Timelike, Utc};
use std::time::Duration;

use crate::api::Exchange;
use crate::clock::{compute_sleep_duration, ClockState, ClockSynchronizer, RemoteTime};
use crate::config::BotConfig;
use crate::error::BotError;
use crate::execution::{reconcile, BarFeed, BarWindow, ReconcileDecision};
use crate::models::{OrderAck, Signal};
use crate::strategy::{Evaluation, SmaBandStrategy};

/// What one completed cycle saw and did
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub at: DateTime<Utc>,
    pub bars: usize,
    pub evaluation: Evaluation,
    /// `None` when the signal was Neutral and the position was not queried
    pub position_qty: Option<f64>,
    pub decision: ReconcileDecision,
    /// Acknowledgements for submitted orders, empty in dry-run
    pub submitted: Vec<OrderAck>,
}

pub struct CycleScheduler<E: Exchange> {
    config: BotConfig,
    exchange: E,
    strategy: SmaBandStrategy,
    clock: Option<ClockState>,
}

impl<E: Exchange> CycleScheduler<E> {
    pub fn new(config: BotConfig, exchange: E) -> Self {
        let strategy = SmaBandStrategy::from_config(&config);
        Self {
            config,
            exchange,
            strategy,
            clock: None,
        }
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Last observed exchange minute/second, set once per minute transition
    pub fn clock_state(&self) -> Option<ClockState> {
        self.clock
    }

    /// Run forever. Stops only when the surrounding task is dropped.
    pub async fn run(&mut self) {
        tracing::info!(
            symbol = %self.config.symbol,
            interval = self.config.interval,
            period = self.config.period,
            threshold_range = self.config.threshold_range,
            dry_run = self.config.dry_run,
            "Cycle scheduler starting"
        );

        loop {
            let sleep = self.tick().await;
            tracing::debug!("Sleeping {:?} until next minute boundary", sleep);
            tokio::time::sleep(sleep).await;
        }
    }

    /// Check the exchange clock, run a cycle if the minute changed, and return
    /// how long to sleep before the next check.
    pub async fn tick(&mut self) -> Duration {
        let remote = match ClockSynchronizer::new(&self.exchange).remote_time().await {
            Ok(remote) => remote,
            Err(e) => {
                // ClockState is left as it was; the next wake retries
                tracing::warn!(
                    symbol = %self.config.symbol,
                    error = %e,
                    "Clock sync failed, skipping cycle"
                );
                return compute_sleep_duration(Local::now().second());
            }
        };

        if self.clock.map(|c| c.minute) == Some(remote.clock.minute) {
            tracing::debug!(
                minute = remote.clock.minute,
                second = remote.clock.second,
                "Minute unchanged, waiting"
            );
            return compute_sleep_duration(remote.clock.second);
        }

        self.clock = Some(remote.clock);
        tracing::info!(
            "🔄 [CYCLE] {} at {}",
            self.config.symbol,
            remote.timestamp.format("%H:%M:%S")
        );

        match self.run_cycle(&remote).await {
            Ok(report) => log_report(&self.config.symbol, &report),
            Err(e) => {
                tracing::error!(
                    cycle = %remote.timestamp,
                    symbol = %self.config.symbol,
                    error = %e,
                    "Cycle aborted"
                );
            }
        }

        compute_sleep_duration(remote.clock.second)
    }

    /// One full fetch → evaluate → reconcile → submit pass anchored at `remote`.
    ///
    /// Orders are submitted in the order the reconciler returns them; the first
    /// failure ends the cycle so an entry is never sent after a failed flatten.
    pub async fn run_cycle(&self, remote: &RemoteTime) -> Result<CycleReport, BotError> {
        let config = &self.config;

        let window = BarWindow::ending_at(remote.timestamp, config.interval, config.period)?;
        let bars = BarFeed::new(&self.exchange, &config.symbol, config.interval)
            .fetch_bars(&window)
            .await?;

        let evaluation = self.strategy.evaluate(&bars)?;
        tracing::info!(
            "  SMA({}) {:.4} | band [{:.4}, {:.4}] | close {:.4} → {:?}",
            config.period,
            evaluation.sma,
            evaluation.thresholds.buy,
            evaluation.thresholds.sell,
            evaluation.previous_close,
            evaluation.signal
        );

        let position_qty = if evaluation.signal == Signal::Neutral {
            None
        } else {
            let qty = self
                .exchange
                .position_qty(&config.symbol)
                .await
                .map_err(|source| BotError::PositionQuery {
                    symbol: config.symbol.clone(),
                    source,
                })?;
            Some(qty)
        };

        let decision = reconcile(
            evaluation.signal,
            &config.symbol,
            position_qty.unwrap_or(0.0),
            config.order_size,
        );
        tracing::info!("  Decision: {}", decision.reason);

        let mut submitted = Vec::with_capacity(decision.orders.len());
        for order in &decision.orders {
            if config.dry_run {
                tracing::info!(
                    "  → Would {} {} {} ({}, dry run)",
                    order.side().as_str(),
                    order.size(),
                    order.symbol,
                    order.intent
                );
                continue;
            }

            let ack = self
                .exchange
                .place_market_order(order)
                .await
                .map_err(|source| BotError::OrderSubmission {
                    symbol: order.symbol.clone(),
                    intent: order.intent,
                    source,
                })?;

            tracing::info!(
                order_id = %ack.order_id,
                intent = %order.intent,
                "  ✓ {} {} {} submitted",
                order.side().as_str(),
                order.size(),
                order.symbol
            );
            submitted.push(ack);
        }

        Ok(CycleReport {
            at: remote.timestamp,
            bars: bars.len(),
            evaluation,
            position_qty,
            decision,
            submitted,
        })
    }
}

fn log_report(symbol: &str, report: &CycleReport) {
    tracing::info!(
        cycle = %report.at,
        symbol = %symbol,
        signal = ?report.evaluation.signal,
        position = ?report.position_qty,
        orders = report.decision.orders.len(),
        submitted = report.submitted.len(),
        "Cycle complete"
    );
}
