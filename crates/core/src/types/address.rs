//! Saved shipping addresses.
//!
//! Addresses are owned by a user id and kept client-side, several per user.
//! Records read back from storage are normalized field by field so an
//! older or partially written entry still loads.

use serde::{Deserialize, Serialize};

use super::id::AddressId;
use super::status::AddressLabel;

/// Default country for new addresses.
pub const DEFAULT_COUNTRY: &str = "India";

/// A latitude/longitude pin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds coordinates only when both values are finite and in range.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// A stored address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: AddressId,
    /// Label shown in the address picker.
    #[serde(rename = "name")]
    pub label: AddressLabel,
    /// First address line.
    pub address: String,
    /// Second address line.
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    /// Postal code.
    #[serde(default)]
    pub zip: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_owned()
}

impl SavedAddress {
    /// The pin for this address, if a valid one was recorded.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?)
    }

    /// Single-line rendering used in pickers and order summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            self.address.as_str(),
            self.address2.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.zip.as_str(),
            self.country.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: AddressPatch) {
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(address2) = patch.address2 {
            self.address2 = address2;
        }
        if let Some(city) = patch.city {
            self.city = city;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(zip) = patch.zip {
            self.zip = zip;
        }
        if let Some(country) = patch.country {
            self.country = country;
        }
        if let Some(coordinates) = patch.coordinates {
            self.latitude = coordinates.map(|c| c.latitude);
            self.longitude = coordinates.map(|c| c.longitude);
        }
    }
}

/// Fields for a new address (the id is assigned on insert).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewAddress {
    pub label: AddressLabel,
    pub address: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub coordinates: Option<Coordinates>,
}

impl NewAddress {
    /// Attach an id and produce the stored form.
    #[must_use]
    pub fn into_saved(self, id: AddressId) -> SavedAddress {
        let country = if self.country.trim().is_empty() {
            default_country()
        } else {
            self.country
        };
        SavedAddress {
            id,
            label: self.label,
            address: self.address,
            address2: self.address2,
            city: self.city,
            state: self.state,
            zip: self.zip,
            country,
            latitude: self.coordinates.map(|c| c.latitude),
            longitude: self.coordinates.map(|c| c.longitude),
        }
    }
}

/// Partial update. `coordinates: Some(None)` clears the pin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddressPatch {
    pub label: Option<AddressLabel>,
    pub address: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<Option<Coordinates>>,
}
