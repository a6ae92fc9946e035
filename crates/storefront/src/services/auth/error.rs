//! Authentication error types.

use carpet_core::{EmailError, ValidationError};
use thiserror::Error;

use crate::api::ApiError;
use crate::session::identity::IdentityError;
use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Form input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The one-time code was left empty.
    #[error("Please enter the code sent to your email")]
    MissingCode,

    /// The backend declined to send or verify a code.
    #[error("{0}")]
    Rejected(String),

    /// The identity provider refused the operation.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Token could not be persisted.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,
}

impl AuthError {
    /// Text suitable for the auth state's `error` field.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            Self::Storage(_) => "Could not save your session on this device".to_string(),
            other => other.to_string(),
        }
    }
}
