use std::sync::Arc;

use carpet_core::{PaymentMethodId, SavedPaymentMethod, random_id};

use crate::storage::{self, KeyValueStore, StorageError, keys};

use super::load_records;

/// Card references saved on this device.
pub struct PaymentMethods {
    storage: Arc<dyn KeyValueStore>,
}

impl PaymentMethods {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    #[must_use]
    pub fn list(&self) -> Vec<SavedPaymentMethod> {
        load_records(self.storage.as_ref(), keys::PAYMENT_METHODS)
    }

    /// Save a card reference. Only the last four digits are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn add(
        &self,
        label: &str,
        brand: &str,
        last4: &str,
    ) -> Result<SavedPaymentMethod, StorageError> {
        let digits: String = last4.chars().filter(char::is_ascii_digit).collect();
        let last4 = digits
            .char_indices()
            .rev()
            .nth(3)
            .map_or(digits.as_str(), |(i, _)| &digits[i..]);
        let method = SavedPaymentMethod {
            id: random_id(),
            label: label.trim().to_owned(),
            last4: last4.to_owned(),
            brand: brand.trim().to_owned(),
        };
        let mut list = self.list();
        list.push(method.clone());
        self.write(&list)?;
        Ok(method)
    }

    /// Forget a card. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn remove(&self, id: &PaymentMethodId) -> Result<(), StorageError> {
        let mut list = self.list();
        list.retain(|m| &m.id != id);
        self.write(&list)
    }

    fn write(&self, list: &[SavedPaymentMethod]) -> Result<(), StorageError> {
        storage::save(self.storage.as_ref(), keys::PAYMENT_METHODS, list)
    }
}
