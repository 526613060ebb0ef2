//! Reverse geocoding: turn coordinates into a place label like "London, GB".

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::GeocodeError, model::Coordinates};

pub const DEFAULT_GEOCODE_URL: &str = "https://api.openweathermap.org/geo/1.0/reverse";

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` means the lookup succeeded but found nothing.
    async fn reverse_geocode(
        &self,
        coordinates: &Coordinates,
    ) -> Result<Option<String>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct GeoEntry {
    name: String,
    country: Option<String>,
}

impl GeoEntry {
    fn label(&self) -> String {
        match self.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", self.name, country),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    api_key: String,
    url: String,
    http: Client,
}

impl OpenWeatherGeocoder {
    pub fn new(api_key: String) -> Self {
        Self::with_url(api_key, DEFAULT_GEOCODE_URL.to_string())
    }

    pub fn with_url(api_key: String, url: String) -> Self {
        Self { api_key, url, http: Client::new() }
    }
}

#[async_trait]
impl ReverseGeocoder for OpenWeatherGeocoder {
    async fn reverse_geocode(
        &self,
        coordinates: &Coordinates,
    ) -> Result<Option<String>, GeocodeError> {
        let lat = coordinates.latitude().to_string();
        let lon = coordinates.longitude().to_string();

        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(GeocodeError::Status(res.status()));
        }

        let body = res.text().await?;
        let entries: Vec<GeoEntry> = serde_json::from_str(&body)?;

        Ok(entries.first().map(GeoEntry::label))
    }
}
