//! Core library for the `meteo-bot` Telegram bot.
//!
//! This crate defines:
//! - Configuration handling
//! - City geocoding (free-text name to coordinates)
//! - Abstraction over the weather service (current, daily, hourly)
//! - Shared domain models
//!
//! It is used by `meteo-bot`, but has no chat-specific code.

pub mod config;
pub mod error;
pub mod geocoder;
pub mod model;
pub mod provider;

pub use config::Config;
pub use error::WeatherError;
pub use geocoder::{Geocode, Geocoder};
pub use model::{
    Coordinate, DayWindow, ForecastDay, HourlyPoint, HourlySeries, WeatherSnapshot,
};
pub use provider::WeatherProvider;
