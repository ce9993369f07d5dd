//! Error types for the bot.
//!
//! [`BotError`] is what escapes a handler: only transport failures do, every
//! upstream problem is turned into a chat reply first. [`ChartError`] covers
//! rendering.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("no hourly data to plot")]
    EmptySeries,

    #[error("chart drawing failed: {0}")]
    Draw(String),

    #[error("chart I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("chart worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, BotError>;
