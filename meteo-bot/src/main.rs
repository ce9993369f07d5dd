//! Binary crate for the `meteo-bot` Telegram bot.
//!
//! This crate focuses on:
//! - The chat dialog (sessions, commands, keyboard buttons)
//! - Telegram transport
//! - Temperature chart rendering
//! - A small CLI to run the bot or query the weather from a terminal

use clap::Parser;

mod chart;
mod cli;
mod dialog;
mod error;
mod logger;
mod messages;
mod session;
mod telegram;
mod transport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
