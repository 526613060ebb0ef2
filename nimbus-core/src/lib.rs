//! Core library for the `nimbus` CLI.
//!
//! This crate defines:
//! - Location resolution (saved location, or device position + reverse geocoding)
//! - Weather retrieval and payload validation
//! - Configuration and local key-value persistence
//! - The refresh cycle and the state container presentation reads from
//!
//! It is used by `nimbus-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod geocode;
pub mod geolocation;
pub mod location;
pub mod model;
pub mod provider;
pub mod refresh;
pub mod store;

pub use config::Config;
pub use error::{GeocodeError, LocationError, RefreshError, StoreError, WeatherApiError};
pub use geocode::{OpenWeatherGeocoder, ReverseGeocoder};
pub use geolocation::{Geolocator, IpGeolocator, PermissionStatus};
pub use location::LocationResolver;
pub use model::{Coordinates, NamedLocation, WeatherSnapshot};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use refresh::{AppState, Loaded, Refresher, StateHandle};
pub use store::{FileStore, KeyValueStore, MemoryStore};
