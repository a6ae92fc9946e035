//! Profile-side records kept on the device: payment methods and settings.

use serde::{Deserialize, Serialize};

use super::id::PaymentMethodId;

/// A saved card reference. Only the brand and last four digits are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPaymentMethod {
    pub id: PaymentMethodId,
    #[serde(default)]
    pub label: String,
    pub last4: String,
    pub brand: String,
}

impl SavedPaymentMethod {
    /// `Visa •••• 4242` style rendering.
    #[must_use]
    pub fn masked(&self) -> String {
        format!("{} •••• {}", self.brand, self.last4)
    }
}

/// User preferences.
///
/// Every field has a default so that stored JSON missing a field (written
/// by an older build) still loads with the rest of its values intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub notify_orders: bool,
    pub notify_marketing: bool,
    pub region: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notify_orders: true,
            notify_marketing: false,
            region: "INR · English".to_owned(),
        }
    }
}
