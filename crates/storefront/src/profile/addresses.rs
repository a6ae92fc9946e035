use std::sync::Arc;

use carpet_core::{
    AddressId, AddressLabel, AddressPatch, Coordinates, NewAddress, SavedAddress, UserId,
    random_id,
};
use serde::Deserialize;
use tracing::info;

use crate::api::types::ProfileAddress;
use crate::storage::{self, KeyValueStore, StorageError, keys};

use super::load_records;

/// Single address written by older builds.
#[derive(Debug, Default, Deserialize)]
struct LegacyAddress {
    #[serde(default)]
    address: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

/// A user's saved shipping addresses.
pub struct AddressBook {
    storage: Arc<dyn KeyValueStore>,
    uid: UserId,
}

impl AddressBook {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, uid: UserId) -> Self {
        Self { storage, uid }
    }

    /// Saved addresses in insertion order.
    ///
    /// An empty list triggers a one-time migration of the legacy single
    /// address, which is then removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a migrated list cannot be written.
    pub fn list(&self) -> Result<Vec<SavedAddress>, StorageError> {
        let list = load_records(self.storage.as_ref(), &keys::addresses(&self.uid));
        if list.is_empty() {
            return self.migrate_legacy();
        }
        Ok(list)
    }

    /// Store a new address and return it with its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn add(&self, address: NewAddress) -> Result<SavedAddress, StorageError> {
        let mut list = self.list()?;
        let saved = address.into_saved(random_id());
        list.push(saved.clone());
        self.write(&list)?;
        Ok(saved)
    }

    /// Apply a patch to one address. `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn update(
        &self,
        id: &AddressId,
        patch: AddressPatch,
    ) -> Result<Option<SavedAddress>, StorageError> {
        let mut list = self.list()?;
        let Some(entry) = list.iter_mut().find(|a| &a.id == id) else {
            return Ok(None);
        };
        entry.apply(patch);
        let updated = entry.clone();
        self.write(&list)?;
        Ok(Some(updated))
    }

    /// Delete an address. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn remove(&self, id: &AddressId) -> Result<(), StorageError> {
        let mut list = self.list()?;
        list.retain(|a| &a.id != id);
        self.write(&list)
    }

    fn write(&self, list: &[SavedAddress]) -> Result<(), StorageError> {
        storage::save(self.storage.as_ref(), &keys::addresses(&self.uid), list)
    }

    fn migrate_legacy(&self) -> Result<Vec<SavedAddress>, StorageError> {
        let legacy_key = keys::legacy_address(&self.uid);
        let Some(legacy) = storage::load::<LegacyAddress>(self.storage.as_ref(), &legacy_key)
        else {
            return Ok(Vec::new());
        };
        if legacy.address.is_empty() && legacy.latitude.is_none() && legacy.longitude.is_none() {
            return Ok(Vec::new());
        }

        let coordinates = legacy
            .latitude
            .zip(legacy.longitude)
            .and_then(|(lat, lng)| Coordinates::new(lat, lng));
        let list = vec![
            NewAddress {
                label: AddressLabel::Home,
                address: legacy.address,
                coordinates,
                ..NewAddress::default()
            }
            .into_saved(random_id()),
        ];
        self.write(&list)?;
        self.storage.remove(&legacy_key)?;
        info!(uid = %self.uid, "Migrated legacy saved address");
        Ok(list)
    }
}

/// Convert a saved address to the server profile shape: both address lines
/// joined into `addressLine`, the postal code as `pincode`, blanks omitted.
#[must_use]
pub fn to_api_address(address: &SavedAddress) -> ProfileAddress {
    fn present(value: &str) -> Option<String> {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_owned())
    }

    let line = [address.address.trim(), address.address2.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    ProfileAddress {
        address_line: present(&line),
        city: present(&address.city),
        state: present(&address.state),
        country: present(&address.country),
        pincode: present(&address.zip),
    }
}
