//! Simulated betting bots and the catalogue of installable apps.

pub mod bot;
pub mod manager;
pub mod registry;

pub use bot::{BotAppConfig, BotConfigPatch, BotInstance, BotStatus, TotalStats, Trade, TradeSide, TradeStatus};
pub use manager::BotManager;
pub use registry::{AppCategory, AppDefinition, AppRegistry, NewBotApp};

use aussie_os_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Bot not found: {0}")]
    NotFound(String),
    #[error("App not found: {0}")]
    AppNotFound(String),
    #[error("Invalid app: {0}")]
    InvalidApp(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
