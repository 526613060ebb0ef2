use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InvalidCoordinates, WeatherApiError};

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if valid {
            Ok(Self { latitude, longitude })
        } else {
            Err(InvalidCoordinates { latitude, longitude })
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Coordinates plus the label shown to the user.
///
/// Serializes as the flat `{latitude, longitude, name}` record used for the
/// persisted custom location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LocationRecord", into = "LocationRecord")]
pub struct NamedLocation {
    pub coordinates: Coordinates,
    pub name: String,
}

impl NamedLocation {
    pub fn new(coordinates: Coordinates, name: impl Into<String>) -> Self {
        Self { coordinates, name: name.into() }
    }
}

#[derive(Serialize, Deserialize)]
struct LocationRecord {
    latitude: f64,
    longitude: f64,
    name: String,
}

impl TryFrom<LocationRecord> for NamedLocation {
    type Error = InvalidCoordinates;

    fn try_from(record: LocationRecord) -> Result<Self, Self::Error> {
        let coordinates = Coordinates::new(record.latitude, record.longitude)?;
        Ok(Self { coordinates, name: record.name })
    }
}

impl From<NamedLocation> for LocationRecord {
    fn from(location: NamedLocation) -> Self {
        Self {
            latitude: location.coordinates.latitude,
            longitude: location.coordinates.longitude,
            name: location.name,
        }
    }
}

/// The current-conditions block. Its presence is what makes a payload valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// hPa
    pub pressure: u32,
    /// percent
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: u16,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// m/s
    pub speed: f64,
    pub deg: Option<u16>,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Wire schema of the OpenWeather current weather endpoint.
///
/// Everything is optional here; [`WeatherSnapshot::try_from`] decides
/// whether the payload is usable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWeatherPayload {
    pub coord: Option<GeoPoint>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: Option<MainReadings>,
    pub visibility: Option<u32>,
    pub wind: Option<Wind>,
    pub clouds: Option<Clouds>,
    pub dt: Option<i64>,
    pub sys: Option<Sys>,
    pub timezone: Option<i32>,
    pub name: Option<String>,
}

/// Point-in-time weather for one location, as returned by a single fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    coord: Option<GeoPoint>,
    weather: Vec<Condition>,
    main: MainReadings,
    visibility: Option<u32>,
    wind: Option<Wind>,
    clouds: Option<Clouds>,
    dt: Option<i64>,
    sys: Option<Sys>,
    timezone: Option<i32>,
    name: Option<String>,
}

impl TryFrom<RawWeatherPayload> for WeatherSnapshot {
    type Error = WeatherApiError;

    fn try_from(raw: RawWeatherPayload) -> Result<Self, Self::Error> {
        let main = raw.main.ok_or_else(|| {
            WeatherApiError::InvalidFormat("missing current conditions (`main`)".to_string())
        })?;

        Ok(Self {
            coord: raw.coord,
            weather: raw.weather,
            main,
            visibility: raw.visibility,
            wind: raw.wind,
            clouds: raw.clouds,
            dt: raw.dt,
            sys: raw.sys,
            timezone: raw.timezone,
            name: raw.name,
        })
    }
}

impl WeatherSnapshot {
    /// Parse and validate a response body.
    pub fn from_json(body: &str) -> Result<Self, WeatherApiError> {
        let raw: RawWeatherPayload = serde_json::from_str(body)
            .map_err(|e| WeatherApiError::InvalidFormat(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn current(&self) -> &MainReadings {
        &self.main
    }

    /// Primary weather condition, if the API sent any.
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.weather
    }

    pub fn wind(&self) -> Option<&Wind> {
        self.wind.as_ref()
    }

    pub fn cloudiness_pct(&self) -> Option<u8> {
        self.clouds.as_ref().map(|c| c.all)
    }

    pub fn visibility_m(&self) -> Option<u32> {
        self.visibility
    }

    pub fn visibility_km(&self) -> Option<f64> {
        self.visibility.map(|m| f64::from(m) / 1000.0)
    }

    pub fn place_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn country(&self) -> Option<&str> {
        self.sys.as_ref().and_then(|s| s.country.as_deref())
    }

    pub fn coord(&self) -> Option<&GeoPoint> {
        self.coord.as_ref()
    }

    /// Offset from UTC of the observed location, in seconds.
    pub fn timezone_offset(&self) -> Option<i32> {
        self.timezone
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(unix_to_utc)
    }

    pub fn sunrise(&self) -> Option<DateTime<Utc>> {
        self.sys.as_ref().and_then(|s| s.sunrise).and_then(unix_to_utc)
    }

    pub fn sunset(&self) -> Option<DateTime<Utc>> {
        self.sys.as_ref().and_then(|s| s.sunset).and_then(unix_to_utc)
    }

    /// Whether the observation falls between sunrise and sunset.
    pub fn is_daytime(&self) -> Option<bool> {
        let dt = self.dt?;
        let sys = self.sys.as_ref()?;
        Some(dt > sys.sunrise? && dt < sys.sunset?)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
