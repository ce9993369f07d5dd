use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::{
    Coordinate,
    error::{Result, WeatherError, truncate_body},
};

const SERVICE: &str = "Nominatim";

/// Outcome of a city lookup.
///
/// `NotFound` means the service answered and had no match; `ServiceError`
/// means we could not get a usable answer at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Geocode {
    Resolved(Coordinate),
    NotFound,
    ServiceError(String),
}

impl Geocode {
    pub fn into_result(self, city: &str) -> Result<Coordinate> {
        match self {
            Geocode::Resolved(coord) => Ok(coord),
            Geocode::NotFound => Err(WeatherError::NotFound(city.to_string())),
            Geocode::ServiceError(reason) => {
                Err(WeatherError::Unavailable { service: SERVICE, reason })
            }
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve(&self, city: &str) -> Geocode;
}

/// Geocoder backed by the OpenStreetMap Nominatim search API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    /// `http` should carry a user agent; Nominatim refuses anonymous clients.
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), http }
    }

    async fn lookup(&self, city: &str) -> Result<Option<Coordinate>> {
        let url = format!("{}/search", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("format", "json"), ("q", city)])
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

        let places: Vec<NominatimPlace> = serde_json::from_str(&body)
            .map_err(|source| WeatherError::Decode { service: SERVICE, source })?;

        let Some(first) = places.first() else {
            return Ok(None);
        };

        let latitude = first.lat.trim().parse::<f64>();
        let longitude = first.lon.trim().parse::<f64>();
        match (latitude, longitude) {
            (Ok(latitude), Ok(longitude)) => Ok(Some(Coordinate { latitude, longitude })),
            _ => Err(WeatherError::Missing { service: SERVICE, what: "numeric lat/lon" }),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, city: &str) -> Geocode {
        let city = city.trim();
        if city.is_empty() {
            return Geocode::NotFound;
        }

        match self.lookup(city).await {
            Ok(Some(coord)) => {
                debug!(city, lat = coord.latitude, lon = coord.longitude, "City resolved");
                Geocode::Resolved(coord)
            }
            Ok(None) => {
                debug!(city, "City not found");
                Geocode::NotFound
            }
            Err(e) => {
                warn!(city, error = %e, "Geocoding failed");
                Geocode::ServiceError(e.to_string())
            }
        }
    }
}
