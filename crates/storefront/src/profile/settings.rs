use std::sync::Arc;

use carpet_core::Settings;

use crate::storage::{self, KeyValueStore, StorageError, keys};

/// Device preferences.
pub struct SettingsStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Stored settings, with missing fields taken from the defaults.
    #[must_use]
    pub fn load(&self) -> Settings {
        storage::load_or_default(self.storage.as_ref(), keys::SETTINGS)
    }

    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        storage::save(self.storage.as_ref(), keys::SETTINGS, settings)
    }
}
