//! Unified error handling with Sentry integration.
//!
//! Every module has its own `thiserror` enum; [`StorefrontError`] rolls them
//! up so that front-ends handle a single type, and [`ErrorKind`] sorts any
//! failure into the handful of categories a user interface cares about.

use carpet_core::{EmailError, ValidationError};
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::session::identity::IdentityError;
use crate::storage::StorageError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Input was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Identity provider refused an operation.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Authentication operation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Order placement failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<EmailError> for StorefrontError {
    fn from(err: EmailError) -> Self {
        Self::Validation(ValidationError::InvalidEmail(err))
    }
}

/// Failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never got a response.
    Transport,
    /// The server answered with a failure message.
    Server,
    /// Client-side input or precondition failure.
    Validation,
    /// The identity provider refused.
    IdentityProvider,
    /// Local persistence failed.
    Storage,
    /// Configuration problem.
    Config,
}

impl ApiError {
    /// Failure category for an API error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Server { .. } | Self::Decode(_) | Self::Rejected(_) => ErrorKind::Server,
            Self::MissingToken => ErrorKind::Validation,
        }
    }
}

impl AuthError {
    /// Failure category for an auth error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEmail(_) | Self::Validation(_) | Self::MissingCode | Self::NotSignedIn => {
                ErrorKind::Validation
            }
            Self::Rejected(_) => ErrorKind::Server,
            Self::Identity(_) => ErrorKind::IdentityProvider,
            Self::Api(e) => e.kind(),
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl CheckoutError {
    /// Failure category for a checkout error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::NotSignedIn | Self::PaymentCancelled => {
                ErrorKind::Validation
            }
            Self::Api(e) => e.kind(),
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl StorefrontError {
    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(e) => e.kind(),
            Self::Storage(_) => ErrorKind::Storage,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Identity(_) => ErrorKind::IdentityProvider,
            Self::Auth(e) => e.kind(),
            Self::Checkout(e) => e.kind(),
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Log the error, sending unexpected failures to Sentry.
    ///
    /// Validation and identity-provider refusals are the user's to fix and
    /// are only logged.
    pub fn report(&self, context: &str) {
        match self.kind() {
            ErrorKind::Transport | ErrorKind::Server | ErrorKind::Storage | ErrorKind::Config => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "{context}"
                );
            }
            ErrorKind::Validation | ErrorKind::IdentityProvider => {
                tracing::info!(error = %self, "{context}");
            }
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context.
///
/// Call this after sign-in to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = StorefrontError::from(ApiError::Server {
            status: 500,
            message: "Out of stock".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.to_string(), "Out of stock");

        let err = StorefrontError::from(ValidationError::EmptyCart);
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = StorefrontError::from(IdentityError::from_code("auth/too-many-requests"));
        assert_eq!(err.kind(), ErrorKind::IdentityProvider);
        assert_eq!(err.to_string(), "Too many attempts. Try again later.");

        let err = StorefrontError::from(AuthError::Api(ApiError::MissingToken));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "No auth token found");
    }

    #[test]
    fn test_email_error_is_validation() {
        let err = StorefrontError::from(EmailError::Empty);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
