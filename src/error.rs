use thiserror::Error;

use crate::models::OrderIntent;

/// Failure reported by an exchange collaborator.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("exchange rejected request (retCode {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unsupported bar interval: {0} minutes")]
    UnsupportedInterval(u32),
}

/// Errors surfaced by the trading loop.
///
/// Every variant except `Config` is scoped to a single cycle: the scheduler
/// logs it and carries on at the next minute boundary.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("remote time source unavailable: {0}")]
    TimeSourceUnavailable(#[source] ApiError),

    #[error("failed to fetch bars for {symbol}: {source}")]
    Fetch {
        symbol: String,
        #[source]
        source: ApiError,
    },

    #[error("not enough bars for SMA({needed}): got {got}")]
    InsufficientBars { needed: usize, got: usize },

    #[error("failed to query position for {symbol}: {source}")]
    PositionQuery {
        symbol: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to submit {intent} order for {symbol}: {source}")]
    OrderSubmission {
        symbol: String,
        intent: OrderIntent,
        #[source]
        source: ApiError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        BotError::Config(err.to_string())
    }
}
