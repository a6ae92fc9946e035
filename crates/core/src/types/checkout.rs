//! Checkout and sign-up form input with client-side validation.
//!
//! Validation failures are reported before any network call is made.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::address::{DEFAULT_COUNTRY, SavedAddress};
use super::email::{Email, EmailError};

/// Client-side validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was left empty.
    #[error("{0} is required")]
    Required(&'static str),

    /// The email address is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The cart has nothing to check out.
    #[error("your cart is empty")]
    EmptyCart,

    /// A quantity that must be positive was not.
    #[error("quantity must be at least 1")]
    NonPositiveQuantity,
}

/// Contact section of the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl ContactDetails {
    /// Validate and return the parsed email.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the email is missing or malformed.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::Required("email"));
        }
        Ok(Email::parse(&self.email)?)
    }
}

/// Shipping section of the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub full_name: String,
    pub address: String,
    #[serde(default)]
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl Default for ShippingDetails {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            address: String::new(),
            address2: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: DEFAULT_COUNTRY.to_owned(),
        }
    }
}

impl ShippingDetails {
    /// Prefill from a saved address, keeping the name already entered.
    #[must_use]
    pub fn from_saved(full_name: impl Into<String>, saved: &SavedAddress) -> Self {
        Self {
            full_name: full_name.into(),
            address: saved.address.clone(),
            address2: saved.address2.clone(),
            city: saved.city.clone(),
            state: saved.state.clone(),
            zip: saved.zip.clone(),
            country: saved.country.clone(),
        }
    }

    /// Check required fields (everything except the second address line).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] naming the first empty field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("full name", &self.full_name),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("postal code", &self.zip),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::Required(field));
            }
        }
        Ok(())
    }
}

/// Email/password sign-up input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    /// # Errors
    ///
    /// Fails on an empty or malformed email, an empty password, or a
    /// confirmation that does not match.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::Required("email"));
        }
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Asha Rao".into(),
            address: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            zip: "560001".into(),
            ..ShippingDetails::default()
        }
    }

    #[test]
    fn test_shipping_valid() {
        assert_eq!(shipping().validate(), Ok(()));
    }

    #[test]
    fn test_shipping_missing_city() {
        let details = ShippingDetails {
            city: "  ".into(),
            ..shipping()
        };
        assert_eq!(details.validate(), Err(ValidationError::Required("city")));
    }

    #[test]
    fn test_contact_requires_email() {
        let contact = ContactDetails::default();
        assert_eq!(contact.validate(), Err(ValidationError::Required("email")));

        let contact = ContactDetails {
            email: "not-an-email".into(),
            phone: String::new(),
        };
        assert!(matches!(
            contact.validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_sign_up_password_mismatch() {
        let form = SignUpForm {
            email: "a@b.co".into(),
            password: "hunter22".into(),
            confirm_password: "hunter23".into(),
        };
        assert_eq!(form.validate(), Err(ValidationError::PasswordMismatch));
    }

    #[test]
    fn test_sign_up_ok() {
        let form = SignUpForm {
            email: "a@b.co".into(),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
        };
        assert!(form.validate().is_ok());
    }
}
