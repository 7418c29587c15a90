// Exchange clock alignment

use chrono::{DateTime, Local, TimeZone, Timelike, Utc};
use std::time::Duration;

use crate::api::Exchange;
use crate::error::{ApiError, BotError};

/// Minute and second of the exchange clock in local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    pub minute: u32,
    pub second: u32,
}

/// One reading of the remote clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTime {
    pub timestamp: DateTime<Utc>,
    pub clock: ClockState,
}

impl RemoteTime {
    pub fn from_unix(seconds: i64) -> Option<Self> {
        let timestamp = Utc.timestamp_opt(seconds, 0).single()?;
        let local = timestamp.with_timezone(&Local);
        Some(Self {
            timestamp,
            clock: ClockState {
                minute: local.minute(),
                second: local.second(),
            },
        })
    }
}

/// Seconds to sleep until just after the next minute boundary, never less than 1
pub fn compute_sleep_duration(current_second: u32) -> Duration {
    Duration::from_secs(u64::from(60u32.saturating_sub(current_second).max(1)))
}

/// Reads the authoritative time from an exchange
pub struct ClockSynchronizer<'a, E: Exchange + ?Sized> {
    exchange: &'a E,
}

impl<'a, E: Exchange + ?Sized> ClockSynchronizer<'a, E> {
    pub fn new(exchange: &'a E) -> Self {
        Self { exchange }
    }

    pub async fn remote_time(&self) -> Result<RemoteTime, BotError> {
        let seconds = self
            .exchange
            .server_time()
            .await
            .map_err(BotError::TimeSourceUnavailable)?;

        RemoteTime::from_unix(seconds).ok_or_else(|| {
            BotError::TimeSourceUnavailable(ApiError::Malformed(format!(
                "server time out of range: {}",
                seconds
            )))
        })
    }
}
