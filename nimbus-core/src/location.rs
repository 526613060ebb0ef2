use std::sync::Arc;

use crate::{
    error::LocationError,
    geocode::ReverseGeocoder,
    geolocation::{Geolocator, PermissionStatus},
    model::NamedLocation,
    store::{KeyValueStore, StoredLocation, load_custom_location},
};

/// Label used when reverse geocoding yields nothing.
pub const PLACEHOLDER_NAME: &str = "Current Location";

/// Decides which location a refresh should query.
#[derive(Clone)]
pub struct LocationResolver {
    store: Arc<dyn KeyValueStore>,
    geolocator: Arc<dyn Geolocator>,
    geocoder: Arc<dyn ReverseGeocoder>,
}

impl LocationResolver {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        geolocator: Arc<dyn Geolocator>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        Self { store, geolocator, geocoder }
    }

    /// A saved custom location wins; otherwise ask the device and look up
    /// a display name for its position.
    pub async fn resolve_location(&self) -> Result<NamedLocation, LocationError> {
        if let Some(saved) = self.saved_location() {
            tracing::info!(name = %saved.name, "using saved custom location");
            return Ok(saved);
        }

        if self.geolocator.request_permission().await == PermissionStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }

        let coordinates = self.geolocator.current_position().await?;

        let name = match self.geocoder.reverse_geocode(&coordinates).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::debug!(%coordinates, "reverse geocoding found no place");
                PLACEHOLDER_NAME.to_string()
            }
            Err(e) => {
                tracing::warn!(%coordinates, "reverse geocoding failed: {e}");
                PLACEHOLDER_NAME.to_string()
            }
        };

        tracing::info!(%coordinates, %name, "resolved device location");
        Ok(NamedLocation::new(coordinates, name))
    }

    fn saved_location(&self) -> Option<NamedLocation> {
        match load_custom_location(self.store.as_ref()) {
            Ok(StoredLocation::Found(location)) => Some(location),
            Ok(StoredLocation::Missing) => None,
            Ok(StoredLocation::Malformed(e)) => {
                tracing::warn!("ignoring malformed saved location: {e}");
                None
            }
            Err(e) => {
                tracing::warn!("could not read saved location: {e}");
                None
            }
        }
    }
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{GeocodeError, StoreError},
        model::Coordinates,
        store::{CUSTOM_LOCATION_KEY, MemoryStore, save_custom_location},
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        reads: AtomicUsize,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    struct FakeGeolocator {
        permission: PermissionStatus,
        position: Option<Coordinates>,
        permission_calls: AtomicUsize,
        position_calls: AtomicUsize,
    }

    impl FakeGeolocator {
        fn new(permission: PermissionStatus, position: Option<Coordinates>) -> Self {
            Self {
                permission,
                position,
                permission_calls: AtomicUsize::new(0),
                position_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Geolocator for FakeGeolocator {
        async fn request_permission(&self) -> PermissionStatus {
            self.permission_calls.fetch_add(1, Ordering::SeqCst);
            self.permission
        }

        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            self.position_calls.fetch_add(1, Ordering::SeqCst);
            self.position
                .ok_or_else(|| LocationError::PositionUnavailable("no fix".into()))
        }
    }

    enum GeocodeOutcome {
        Name(&'static str),
        Empty,
        Fail,
    }

    struct FakeGeocoder {
        outcome: GeocodeOutcome,
        calls: AtomicUsize,
    }

    impl FakeGeocoder {
        fn new(outcome: GeocodeOutcome) -> Self {
            Self { outcome, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ReverseGeocoder for FakeGeocoder {
        async fn reverse_geocode(
            &self,
            _coordinates: &Coordinates,
        ) -> Result<Option<String>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                GeocodeOutcome::Name(n) => Ok(Some(n.to_string())),
                GeocodeOutcome::Empty => Ok(None),
                GeocodeOutcome::Fail => Err(GeocodeError::Status(reqwest::StatusCode::BAD_GATEWAY)),
            }
        }
    }

    fn berlin() -> Coordinates {
        Coordinates::new(52.52, 13.405).unwrap()
    }

    struct Harness {
        store: Arc<CountingStore>,
        geolocator: Arc<FakeGeolocator>,
        geocoder: Arc<FakeGeocoder>,
    }

    impl Harness {
        fn new(geolocator: FakeGeolocator, geocoder: FakeGeocoder) -> Self {
            Self {
                store: Arc::new(CountingStore::default()),
                geolocator: Arc::new(geolocator),
                geocoder: Arc::new(geocoder),
            }
        }

        fn resolver(&self) -> LocationResolver {
            LocationResolver::new(
                self.store.clone(),
                self.geolocator.clone(),
                self.geocoder.clone(),
            )
        }
    }

    #[tokio::test]
    async fn saved_location_skips_device_and_network() {
        let h = Harness::new(
            FakeGeolocator::new(PermissionStatus::Granted, Some(berlin())),
            FakeGeocoder::new(GeocodeOutcome::Name("Berlin, DE")),
        );
        let london = NamedLocation::new(Coordinates::new(51.5, -0.12).unwrap(), "London, GB");
        save_custom_location(h.store.as_ref(), &london).unwrap();

        let resolved = h.resolver().resolve_location().await.unwrap();

        assert_eq!(resolved, london);
        assert_eq!(h.store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(h.geolocator.permission_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.geolocator.position_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn denied_permission_stops_before_any_lookup() {
        let h = Harness::new(
            FakeGeolocator::new(PermissionStatus::Denied, Some(berlin())),
            FakeGeocoder::new(GeocodeOutcome::Name("Berlin, DE")),
        );

        let err = h.resolver().resolve_location().await.unwrap_err();

        assert!(matches!(err, LocationError::PermissionDenied));
        assert_eq!(h.geolocator.position_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn position_failure_is_fatal() {
        let h = Harness::new(
            FakeGeolocator::new(PermissionStatus::Granted, None),
            FakeGeocoder::new(GeocodeOutcome::Name("Berlin, DE")),
        );

        let err = h.resolver().resolve_location().await.unwrap_err();

        assert!(matches!(err, LocationError::PositionUnavailable(_)));
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn device_location_gets_geocoded_name() {
        let h = Harness::new(
            FakeGeolocator::new(PermissionStatus::Granted, Some(berlin())),
            FakeGeocoder::new(GeocodeOutcome::Name("Berlin, DE")),
        );

        let resolved = h.resolver().resolve_location().await.unwrap();

        assert_eq!(resolved.coordinates, berlin());
        assert_eq!(resolved.name, "Berlin, DE");
        assert_eq!(h.geolocator.position_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_geocode_result_uses_placeholder() {
        let h = Harness::new(
            FakeGeolocator::new(PermissionStatus::Granted, Some(berlin())),
            FakeGeocoder::new(GeocodeOutcome::Empty),
        );

        let resolved = h.resolver().resolve_location().await.unwrap();
        assert_eq!(resolved.name, PLACEHOLDER_NAME);
    }

    #[tokio::test]
    async fn geocode_failure_uses_placeholder() {
        let h = Harness::new(
            FakeGeolocator::new(PermissionStatus::Granted, Some(berlin())),
            FakeGeocoder::new(GeocodeOutcome::Fail),
        );

        let resolved = h.resolver().resolve_location().await.unwrap();
        assert_eq!(resolved.name, "Current Location");
        assert_eq!(resolved.coordinates, berlin());
    }

    #[tokio::test]
    async fn malformed_saved_location_falls_back_to_device() {
        let h = Harness::new(
            FakeGeolocator::new(PermissionStatus::Granted, Some(berlin())),
            FakeGeocoder::new(GeocodeOutcome::Name("Berlin, DE")),
        );
        h.store.set(CUSTOM_LOCATION_KEY, "not json".into()).unwrap();

        let resolved = h.resolver().resolve_location().await.unwrap();

        assert_eq!(resolved.name, "Berlin, DE");
        assert_eq!(h.geolocator.permission_calls.load(Ordering::SeqCst), 1);
    }
}
