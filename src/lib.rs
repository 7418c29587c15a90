// Core modules
pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod scheduler;
pub mod strategy;

// Re-export commonly used types
pub use api::Exchange;
pub use crate::config::{BotConfig, ExchangeConfig, Settings};
pub use error::{ApiError, BotError};
pub use models::*;
pub use scheduler::{CycleReport, CycleScheduler};
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;
