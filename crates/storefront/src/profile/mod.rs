//! Device-side profile records.
//!
//! Addresses and order history are stored per user id; payment methods and
//! settings are shared by everyone on the device. Lists are read leniently:
//! an entry that fails to decode is dropped and the rest are kept.

mod addresses;
mod orders;
mod payment_methods;
mod settings;

pub use addresses::{AddressBook, to_api_address};
pub use orders::OrderHistory;
pub use payment_methods::PaymentMethods;
pub use settings::SettingsStore;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::storage::{self, KeyValueStore};

/// Decode a stored JSON array entry by entry.
fn load_records<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let Some(raw) = storage::load::<Vec<serde_json::Value>>(store, key) else {
        return Vec::new();
    };
    let total = raw.len();
    let records: Vec<T> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if records.len() < total {
        debug!(key, dropped = total - records.len(), "Skipped malformed stored records");
    }
    records
}
