use crate::{
    Config, Coordinate, DayWindow, ForecastDay, HourlySeries, WeatherSnapshot,
    error::Result,
    geocoder::{Geocoder, NominatimGeocoder},
    provider::open_meteo::OpenMeteoProvider,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

pub mod open_meteo;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, coord: Coordinate) -> Result<WeatherSnapshot>;

    /// Forecast for the location's current day.
    async fn daily_forecast(&self, coord: Coordinate) -> Result<ForecastDay>;

    async fn hourly_series(&self, coord: Coordinate, window: DayWindow) -> Result<HourlySeries>;
}

/// Shared HTTP client: one connection pool, the configured timeout and user agent.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(config.geocoding.user_agent.as_str())
        .timeout(config.http.timeout())
        .build()
        .context("Failed to build HTTP client")
}

/// Construct the weather provider from config.
pub fn provider_from_config(config: &Config, http: Client) -> Box<dyn WeatherProvider> {
    Box::new(OpenMeteoProvider::new(config.weather.base_url.clone(), http))
}

/// Construct the geocoder from config.
pub fn geocoder_from_config(config: &Config, http: Client) -> Box<dyn Geocoder> {
    Box::new(NominatimGeocoder::new(config.geocoding.base_url.clone(), http))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_builds_from_defaults() {
        assert!(http_client(&Config::default()).is_ok());
    }

    #[test]
    fn constructors_use_configured_urls() {
        let mut cfg = Config::default();
        cfg.weather.base_url = "http://weather.test".into();
        cfg.geocoding.base_url = "http://geo.test/".into();

        let http = http_client(&cfg).expect("client");
        let provider = provider_from_config(&cfg, http.clone());
        let geocoder = geocoder_from_config(&cfg, http);

        assert!(format!("{provider:?}").contains("http://weather.test"));
        // trailing slash is stripped
        assert!(format!("{geocoder:?}").contains("\"http://geo.test\""));
    }
}
