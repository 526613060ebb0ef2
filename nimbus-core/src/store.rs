//! Small string key-value persistence.
//!
//! Values are stored as serialized strings so the same store can hold any
//! record the app needs; today that is only the user's custom location.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;

use crate::{error::StoreError, model::NamedLocation};

/// Key under which the user-chosen location is persisted.
pub const CUSTOM_LOCATION_KEY: &str = "customLocation";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Store backed by a single JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// In-process store, handy for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Outcome of reading the custom-location key.
#[derive(Debug)]
pub enum StoredLocation {
    Missing,
    Found(NamedLocation),
    /// Present but not a valid `{latitude, longitude, name}` record.
    Malformed(serde_json::Error),
}

pub fn load_custom_location(store: &dyn KeyValueStore) -> Result<StoredLocation, StoreError> {
    let Some(raw) = store.get(CUSTOM_LOCATION_KEY)? else {
        return Ok(StoredLocation::Missing);
    };

    Ok(match serde_json::from_str::<NamedLocation>(&raw) {
        Ok(location) => StoredLocation::Found(location),
        Err(e) => StoredLocation::Malformed(e),
    })
}

pub fn save_custom_location(
    store: &dyn KeyValueStore,
    location: &NamedLocation,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(location)?;
    store.set(CUSTOM_LOCATION_KEY, raw)
}

pub fn clear_custom_location(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(CUSTOM_LOCATION_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;

    fn london() -> NamedLocation {
        NamedLocation::new(Coordinates::new(51.5, -0.12).unwrap(), "London, GB")
    }

    #[test]
    fn missing_key_is_reported_as_missing() {
        let store = MemoryStore::new();
        assert!(matches!(load_custom_location(&store).unwrap(), StoredLocation::Missing));
    }

    #[test]
    fn saved_location_loads_back() {
        let store = MemoryStore::new();
        save_custom_location(&store, &london()).unwrap();

        match load_custom_location(&store).unwrap() {
            StoredLocation::Found(loc) => assert_eq!(loc, london()),
            other => panic!("expected stored location, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_malformed_not_an_error() {
        let store = MemoryStore::new();
        store.set(CUSTOM_LOCATION_KEY, "{\"latitude\": \"north\"}".into()).unwrap();

        assert!(matches!(load_custom_location(&store).unwrap(), StoredLocation::Malformed(_)));
    }

    #[test]
    fn clear_removes_location() {
        let store = MemoryStore::new();
        save_custom_location(&store, &london()).unwrap();
        clear_custom_location(&store).unwrap();

        assert!(matches!(load_custom_location(&store).unwrap(), StoredLocation::Missing));
    }
}
