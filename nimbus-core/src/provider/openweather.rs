use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::{
    error::WeatherApiError,
    model::{Coordinates, WeatherSnapshot},
    provider::{UNITS, truncate_body},
};

use super::WeatherProvider;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_url(api_key, DEFAULT_WEATHER_URL.to_string())
    }

    /// Point the provider at a different endpoint (proxies, tests).
    pub fn with_url(api_key: String, url: String) -> Self {
        Self { api_key, url, http: Client::new() }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_weather(
        &self,
        coordinates: &Coordinates,
    ) -> Result<WeatherSnapshot, WeatherApiError> {
        let lat = coordinates.latitude().to_string();
        let lon = coordinates.longitude().to_string();

        tracing::debug!(url = %self.url, %lat, %lon, "requesting current weather");

        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", UNITS),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(status_error(status, res.text().await));
        }

        let body = res.text().await?;
        let snapshot = WeatherSnapshot::from_json(&body)?;

        tracing::debug!(
            temp = snapshot.current().temp,
            place = snapshot.place_name().unwrap_or("-"),
            "weather payload accepted"
        );

        Ok(snapshot)
    }
}

/// A non-success status wins over a body that could not be read.
fn status_error(status: StatusCode, body: Result<String, reqwest::Error>) -> WeatherApiError {
    let body = body.unwrap_or_else(|e| {
        tracing::debug!(%status, error = %e, "failed to read error body");
        String::new()
    });
    WeatherApiError::Status { status, body: truncate_body(&body) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_status_when_body_is_unreadable() {
        let read_failure = Client::new().get("not a url").build().unwrap_err();

        match status_error(StatusCode::BAD_GATEWAY, Err(read_failure)) {
            WeatherApiError::Status { status, body } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert!(body.is_empty());
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn status_error_truncates_readable_body() {
        let err = status_error(StatusCode::UNAUTHORIZED, Ok("x".repeat(500)));
        match err {
            WeatherApiError::Status { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.ends_with("..."));
                assert!(body.len() < 500);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
