//! Status and label enums for various entities.

use serde::{Deserialize, Serialize};

/// Status of a locally recorded order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed without payment verification (local checkout).
    #[default]
    Confirmed,
    /// Placed after the payment provider verified the charge.
    Paid,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// Label of a saved address.
///
/// The picker offers Home, Work and Other; anything else typed by the user
/// is kept verbatim as a custom label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum AddressLabel {
    #[default]
    Home,
    Work,
    Other,
    Custom(String),
}

impl AddressLabel {
    /// The labels offered by default.
    pub const PRESETS: [Self; 3] = [Self::Home, Self::Work, Self::Other];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "Home",
            Self::Work => "Work",
            Self::Other => "Other",
            Self::Custom(label) => label,
        }
    }
}

impl From<String> for AddressLabel {
    fn from(s: String) -> Self {
        match s.trim() {
            "" | "Home" | "home" => Self::Home,
            "Work" | "work" => Self::Work,
            "Other" | "other" => Self::Other,
            custom => Self::Custom(custom.to_owned()),
        }
    }
}

impl From<AddressLabel> for String {
    fn from(label: AddressLabel) -> Self {
        label.as_str().to_owned()
    }
}

impl std::fmt::Display for AddressLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AddressLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}
