//! Third-party identity provider seam.
//!
//! The storefront can sign users in through an external identity service
//! (federated popup/redirect sign-in, phone codes, email and password).
//! The provider is a trait object so that front-ends can plug in whatever
//! SDK they ship with; [`NoIdentityProvider`] is used when none is
//! configured and only email one-time codes are available.

use async_trait::async_trait;
use carpet_core::Email;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Handle for an in-progress phone verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneVerification {
    pub verification_id: String,
    pub phone_number: String,
}

/// A failure reported by the identity provider, with its user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct IdentityError {
    /// Provider error code, e.g. `auth/popup-blocked`.
    pub code: String,
    pub message: String,
}

impl IdentityError {
    /// Build an error from a provider code, mapping it to fixed text.
    #[must_use]
    pub fn from_code(code: impl Into<String>) -> Self {
        let code = code.into();
        let message = message_for_code(&code).to_string();
        Self { code, message }
    }

    /// Popup failures that should be retried as a full-page redirect.
    #[must_use]
    pub fn falls_back_to_redirect(&self) -> bool {
        matches!(
            self.code.as_str(),
            "auth/popup-blocked" | "auth/cancelled-popup-request" | "auth/popup-closed-by-user"
        )
    }

    /// The user backed out; callers usually show nothing.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self.code.as_str(),
            "auth/popup-closed-by-user"
                | "auth/cancelled-popup-request"
                | "auth/redirect-cancelled-by-user"
        )
    }
}

/// User-facing message for a provider error code.
#[must_use]
pub fn message_for_code(code: &str) -> &'static str {
    match code {
        "auth/popup-closed-by-user" | "auth/redirect-cancelled-by-user" => {
            "Sign-in was cancelled."
        }
        "auth/cancelled-popup-request" => "",
        "auth/account-exists-with-different-credential" => {
            "An account already exists with the same email using another sign-in method."
        }
        "auth/popup-blocked" => "Popup was blocked. Please allow popups for this site.",
        "auth/unauthorized-domain" => "This domain is not authorized for sign-in.",
        "auth/invalid-phone-number" => {
            "Invalid phone number. Include country code (e.g. +91 9876543210)."
        }
        "auth/too-many-requests" => "Too many attempts. Try again later.",
        "auth/invalid-verification-code" => "Invalid or expired code. Please request a new one.",
        "auth/code-expired" => "Code expired. Please request a new one.",
        "auth/captcha-check-failed" => "Verification failed. Please try again.",
        "auth/missing-client-identifier" => "Browser not supported for phone sign-in.",
        "auth/invalid-credential" | "auth/wrong-password" | "auth/user-not-found" => {
            "Invalid email or password."
        }
        "auth/email-already-in-use" => "An account with this email already exists.",
        "auth/weak-password" => "Password should be at least 6 characters.",
        _ => "Sign-in failed. Please try again.",
    }
}

/// External identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Currently signed-in user, if the provider has one cached.
    fn current_user(&self) -> Option<IdentityUser>;

    /// Completion of a redirect sign-in started in a previous run.
    /// `Ok(None)` when no redirect was pending.
    async fn redirect_result(&self) -> Result<Option<IdentityUser>, IdentityError>;

    /// Federated sign-in in a popup window.
    async fn sign_in_with_popup(&self) -> Result<IdentityUser, IdentityError>;

    /// Start a federated sign-in by full-page redirect. Completion is
    /// reported later by [`redirect_result`](Self::redirect_result).
    async fn sign_in_with_redirect(&self) -> Result<(), IdentityError>;

    async fn sign_in_with_email(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentityUser, IdentityError>;

    async fn sign_up_with_email(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentityUser, IdentityError>;

    /// Text a verification code to a phone number.
    async fn send_phone_code(&self, phone_number: &str)
    -> Result<PhoneVerification, IdentityError>;

    async fn confirm_phone_code(
        &self,
        verification: &PhoneVerification,
        code: &str,
    ) -> Result<IdentityUser, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Delete the signed-in account at the provider.
    async fn delete_account(&self) -> Result<(), IdentityError>;
}

/// Provider used when no identity service is configured. Every sign-in
/// attempt fails; there is never a federated user.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentityProvider;

const NOT_CONFIGURED: &str = "auth/operation-not-allowed";

#[async_trait]
impl IdentityProvider for NoIdentityProvider {
    fn current_user(&self) -> Option<IdentityUser> {
        None
    }

    async fn redirect_result(&self) -> Result<Option<IdentityUser>, IdentityError> {
        Ok(None)
    }

    async fn sign_in_with_popup(&self) -> Result<IdentityUser, IdentityError> {
        Err(IdentityError::from_code(NOT_CONFIGURED))
    }

    async fn sign_in_with_redirect(&self) -> Result<(), IdentityError> {
        Err(IdentityError::from_code(NOT_CONFIGURED))
    }

    async fn sign_in_with_email(
        &self,
        _email: &Email,
        _password: &SecretString,
    ) -> Result<IdentityUser, IdentityError> {
        Err(IdentityError::from_code(NOT_CONFIGURED))
    }

    async fn sign_up_with_email(
        &self,
        _email: &Email,
        _password: &SecretString,
    ) -> Result<IdentityUser, IdentityError> {
        Err(IdentityError::from_code(NOT_CONFIGURED))
    }

    async fn send_phone_code(
        &self,
        _phone_number: &str,
    ) -> Result<PhoneVerification, IdentityError> {
        Err(IdentityError::from_code(NOT_CONFIGURED))
    }

    async fn confirm_phone_code(
        &self,
        _verification: &PhoneVerification,
        _code: &str,
    ) -> Result<IdentityUser, IdentityError> {
        Err(IdentityError::from_code(NOT_CONFIGURED))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), IdentityError> {
        Err(IdentityError::from_code(NOT_CONFIGURED))
    }
}
