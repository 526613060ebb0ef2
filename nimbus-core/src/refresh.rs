//! One refresh cycle: resolve a location, fetch its weather, publish the
//! result to the shared [`AppState`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    Config,
    error::RefreshError,
    geocode::OpenWeatherGeocoder,
    geolocation::IpGeolocator,
    location::LocationResolver,
    model::{NamedLocation, WeatherSnapshot},
    provider::{WeatherProvider, provider_from_config},
    store::KeyValueStore,
};

/// A successfully fetched snapshot and the location it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub snapshot: Arc<WeatherSnapshot>,
    pub location: NamedLocation,
}

/// What presentation renders.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Refreshes started but not yet settled.
    pub in_flight: usize,
    /// Latest successful result. Survives later failures.
    pub weather: Option<Loaded>,
    /// User-visible message from the most recent failed refresh.
    pub error: Option<String>,
}

impl AppState {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// Shared handle to the state container owned by the composition root.
#[derive(Debug, Clone, Default)]
pub struct StateHandle(Arc<RwLock<AppState>>);

impl StateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current state.
    pub fn current(&self) -> AppState {
        self.0.read().clone()
    }

    /// Count a refresh as in flight until the returned guard is dropped.
    fn begin(&self) -> InFlight<'_> {
        self.0.write().in_flight += 1;
        InFlight(self)
    }

    fn settle(&self, outcome: Result<Loaded, &RefreshError>) {
        let mut state = self.0.write();
        match outcome {
            Ok(loaded) => {
                state.weather = Some(loaded);
                state.error = None;
            }
            Err(e) => state.error = Some(e.user_message().to_string()),
        }
    }
}

/// Decrements `in_flight` however the refresh ends, including cancellation.
#[must_use]
struct InFlight<'a>(&'a StateHandle);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = (self.0).0.write();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

/// Runs refresh cycles and publishes their outcome.
///
/// Overlapping refreshes are independent; whichever settles last wins.
#[derive(Debug, Clone)]
pub struct Refresher {
    resolver: LocationResolver,
    provider: Arc<dyn WeatherProvider>,
    state: StateHandle,
}

impl Refresher {
    pub fn new(
        resolver: LocationResolver,
        provider: Arc<dyn WeatherProvider>,
        state: StateHandle,
    ) -> Self {
        Self { resolver, provider, state }
    }

    /// Wire the default OpenWeather and IP geolocation collaborators.
    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let provider: Arc<dyn WeatherProvider> = Arc::from(provider_from_config(config)?);
        let geocoder = OpenWeatherGeocoder::with_url(
            config.api_key()?.to_owned(),
            config.endpoints.geocode.clone(),
        );
        let geolocator =
            IpGeolocator::with_url(config.geolocation.enabled, config.endpoints.geoip.clone());

        let resolver = LocationResolver::new(store, Arc::new(geolocator), Arc::new(geocoder));
        Ok(Self::new(resolver, provider, StateHandle::new()))
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub async fn refresh(&self) -> Result<Loaded, RefreshError> {
        let _in_flight = self.state.begin();

        match self.run_cycle().await {
            Ok(loaded) => {
                self.state.settle(Ok(loaded.clone()));
                Ok(loaded)
            }
            Err(e) => {
                tracing::error!("weather refresh failed: {e}");
                self.state.settle(Err(&e));
                Err(e)
            }
        }
    }

    async fn run_cycle(&self) -> Result<Loaded, RefreshError> {
        let location = self.resolver.resolve_location().await?;
        let snapshot = self.provider.fetch_weather(&location.coordinates).await?;

        Ok(Loaded { snapshot: Arc::new(snapshot), location })
    }
}
