use crate::{
    Config, WeatherSnapshot, error::WeatherApiError, model::Coordinates,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Units requested from the weather API. Presentation assumes °C and m/s.
pub const UNITS: &str = "metric";

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// One network round trip; no retry and no caching.
    async fn fetch_weather(
        &self,
        coordinates: &Coordinates,
    ) -> Result<WeatherSnapshot, WeatherApiError>;
}

/// Construct the weather provider described by the config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;

    Ok(Box::new(OpenWeatherProvider::with_url(
        api_key.to_owned(),
        config.endpoints.weather.clone(),
    )))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
