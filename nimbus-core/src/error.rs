use reqwest::StatusCode;

/// Failures that abort location resolution.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Permission to access location was denied")]
    PermissionDenied,
    #[error("Device position unavailable: {0}")]
    PositionUnavailable(String),
}

/// Failures of a single weather request.
#[derive(Debug, thiserror::Error)]
pub enum WeatherApiError {
    #[error("Weather request could not be sent: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Weather API error: {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Invalid weather data format: {0}")]
    InvalidFormat(String),
}

/// Reverse geocoding failures. Callers degrade to a placeholder name.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Geocoding returned status {0}")]
    Status(StatusCode),
    #[error("Geocoding response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("Coordinates out of range: latitude {latitude}, longitude {longitude}")]
pub struct InvalidCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Why a refresh cycle was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Weather(#[from] WeatherApiError),
}

impl RefreshError {
    /// Message suitable for showing to the user in place of the weather.
    pub fn user_message(&self) -> &'static str {
        match self {
            RefreshError::Location(LocationError::PermissionDenied) => {
                "Permission to access location was denied"
            }
            _ => "Error fetching weather data",
        }
    }
}
