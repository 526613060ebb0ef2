use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;

use crate::{error::LocationError, model::Coordinates};

pub const DEFAULT_GEOIP_URL: &str = "https://ipapi.co/json/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Access to the device position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    /// Single-shot position read.
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    latitude: f64,
    longitude: f64,
}

/// Approximates the device position from its public IP address.
///
/// Permission is the user's `geolocation.enabled` setting; nothing is sent
/// over the network when it is off.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    enabled: bool,
    url: String,
    http: Client,
}

impl IpGeolocator {
    pub fn new(enabled: bool) -> Self {
        Self::with_url(enabled, DEFAULT_GEOIP_URL.to_string())
    }

    pub fn with_url(enabled: bool, url: String) -> Self {
        const AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        // Fall back to a plain client if the builder rejects the settings.
        let http = Client::builder()
            .user_agent(AGENT)
            .default_headers(headers)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build geolocation client: {e}");
                Client::new()
            });

        Self { enabled, url, http }
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn request_permission(&self) -> PermissionStatus {
        if self.enabled { PermissionStatus::Granted } else { PermissionStatus::Denied }
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let unavailable = |e: reqwest::Error| LocationError::PositionUnavailable(e.to_string());

        let geo = self
            .http
            .get(&self.url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json::<GeoIpResponse>()
            .await
            .map_err(unavailable)?;

        Coordinates::new(geo.latitude, geo.longitude)
            .map_err(|e| LocationError::PositionUnavailable(e.to_string()))
    }
}
