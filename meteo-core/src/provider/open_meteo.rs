use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::{Result, WeatherError, truncate_body},
    model::{Coordinate, DayWindow, ForecastDay, HourlyPoint, HourlySeries, WeatherSnapshot},
};

use super::WeatherProvider;

const SERVICE: &str = "Open-Meteo";

/// Weather provider backed by the free Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), http }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        coord: Coordinate,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/v1/forecast", self.base_url);
        let latitude = coord.latitude.to_string();
        let longitude = coord.longitude.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("timezone", "auto"),
            ])
            .query(params)
            .send()
            .await
            .map_err(|source| WeatherError::Request { service: SERVICE, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::Request { service: SERVICE, source })?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                service: SERVICE,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|source| WeatherError::Decode { service: SERVICE, source })
    }

    /// Hourly temperatures for `window`, with "today" taken from `now` in the
    /// location's own timezone.
    pub async fn hourly_series_at(
        &self,
        coord: Coordinate,
        window: DayWindow,
        now: DateTime<Utc>,
    ) -> Result<HourlySeries> {
        let parsed: OmHourlyResponse = self
            .fetch(
                coord,
                &[("hourly", "temperature_2m"), ("past_days", "1"), ("forecast_days", "2")],
            )
            .await?;

        let hourly = parsed.hourly.ok_or(WeatherError::Missing {
            service: SERVICE,
            what: "hourly data",
        })?;

        let today = local_date(now, parsed.utc_offset_seconds).ok_or(WeatherError::Missing {
            service: SERVICE,
            what: "a valid utc_offset_seconds",
        })?;
        let date = window.date_from(today);
        let series = select_day(&hourly.time, &hourly.temperature_2m, date);

        debug!(?window, %date, points = series.len(), "Hourly series selected");
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    windspeed: f64,
    time: String,
}

#[derive(Debug, Deserialize)]
struct OmCurrentResponse {
    current_weather: Option<OmCurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    windspeed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmDailyResponse {
    daily: Option<OmDaily>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmHourlyResponse {
    #[serde(default)]
    utc_offset_seconds: i64,
    hourly: Option<OmHourly>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn current_weather(&self, coord: Coordinate) -> Result<WeatherSnapshot> {
        let parsed: OmCurrentResponse = self.fetch(coord, &[("current_weather", "true")]).await?;

        let current = parsed.current_weather.ok_or(WeatherError::Missing {
            service: SERVICE,
            what: "current_weather",
        })?;

        let observed_at = parse_time(&current.time).ok_or(WeatherError::Missing {
            service: SERVICE,
            what: "a valid current_weather.time",
        })?;

        Ok(WeatherSnapshot {
            temperature_c: current.temperature,
            windspeed_kmh: current.windspeed,
            observed_at,
        })
    }

    async fn daily_forecast(&self, coord: Coordinate) -> Result<ForecastDay> {
        let parsed: OmDailyResponse = self
            .fetch(
                coord,
                &[(
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_sum,windspeed_10m_max",
                )],
            )
            .await?;

        let daily = parsed.daily.ok_or(WeatherError::Missing {
            service: SERVICE,
            what: "daily data",
        })?;

        // Always the first day: the API starts the series at the location's today.
        let date = daily
            .time
            .first()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or(WeatherError::Missing { service: SERVICE, what: "daily.time" })?;

        Ok(ForecastDay {
            date,
            temp_max_c: first_value(&daily.temperature_2m_max, "daily.temperature_2m_max")?,
            temp_min_c: first_value(&daily.temperature_2m_min, "daily.temperature_2m_min")?,
            precipitation_mm: first_value(&daily.precipitation_sum, "daily.precipitation_sum")?,
            wind_max_kmh: first_value(&daily.windspeed_10m_max, "daily.windspeed_10m_max")?,
        })
    }

    async fn hourly_series(&self, coord: Coordinate, window: DayWindow) -> Result<HourlySeries> {
        self.hourly_series_at(coord, window, Utc::now()).await
    }
}

fn first_value(values: &[Option<f64>], what: &'static str) -> Result<f64> {
    values.first().copied().flatten().ok_or(WeatherError::Missing { service: SERVICE, what })
}

/// `None` when the offset does not fit a real timestamp.
fn local_date(now: DateTime<Utc>, utc_offset_seconds: i64) -> Option<NaiveDate> {
    let offset = TimeDelta::try_seconds(utc_offset_seconds)?;
    Some(now.naive_utc().checked_add_signed(offset)?.date())
}

fn parse_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Keeps the entries whose timestamp string starts with `date`, skipping
/// null temperatures and unparsable times.
fn select_day(times: &[String], temps: &[Option<f64>], date: NaiveDate) -> HourlySeries {
    let prefix = date.format("%Y-%m-%d").to_string();

    let points = times
        .iter()
        .zip(temps)
        .filter(|(t, _)| t.starts_with(&prefix))
        .filter_map(|(t, temp)| {
            Some(HourlyPoint { time: parse_time(t)?, temperature_c: (*temp)? })
        })
        .collect();

    HourlySeries { date, points }
}
