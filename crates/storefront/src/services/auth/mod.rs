//! Backend email one-time-code authentication and profile access.
//!
//! A successful verification yields an opaque token which is persisted under
//! the `token` storage key and attached to the API client. On the next start
//! [`AuthService::hydrate_from_storage`] restores a token-backed session from
//! that key alone; the email is filled in once the profile is fetched.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use carpet_core::Email;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use crate::api::ApiClient;
use crate::api::types::{ProfileUpdate, UserProfile};
use crate::session::BackendSession;
use crate::storage::{KeyValueStore, keys};
use crate::store::{AuthState, Store};

/// Email-OTP login, backend session lifecycle, and profile reads/writes.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<AuthServiceInner>,
}

struct AuthServiceInner {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    state: Store<AuthState>,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(AuthServiceInner {
                api,
                storage,
                state: Store::default(),
            }),
        }
    }

    /// Observable auth state.
    #[must_use]
    pub fn state(&self) -> &Store<AuthState> {
        &self.inner.state
    }

    /// Current token-backed session, if any.
    #[must_use]
    pub fn backend_session(&self) -> Option<BackendSession> {
        self.inner.state.borrow().backend_session.clone()
    }

    /// Email a one-time code.
    ///
    /// On success `email_sent_to` is set; on failure `error` is.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the email is malformed, the request fails, or
    /// the backend declines.
    #[instrument(skip(self, email))]
    pub async fn send_email_otp(&self, email: &str) -> Result<(), AuthError> {
        self.begin();
        let result = self.send_email_otp_inner(email).await;
        self.finish(result.as_ref().err());
        result
    }

    async fn send_email_otp_inner(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let response = self.inner.api.send_email_otp(email.as_str()).await?;
        if !response.success {
            return Err(AuthError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Failed to send OTP".to_string()),
            ));
        }
        info!(email = %email.masked(), "One-time code sent");
        self.inner
            .state
            .update(|s| s.email_sent_to = Some(email.into_inner()));
        Ok(())
    }

    /// Exchange an emailed code for a token-backed session.
    ///
    /// The token is persisted before the session is published.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the code is empty, the request fails, or the
    /// backend does not return a token.
    #[instrument(skip(self, email, otp))]
    pub async fn verify_email_otp(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        self.begin();
        let result = self.verify_email_otp_inner(email, otp).await;
        self.finish(result.as_ref().err());
        result
    }

    async fn verify_email_otp_inner(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let otp = otp.trim();
        if otp.is_empty() {
            return Err(AuthError::MissingCode);
        }

        let response = self.inner.api.verify_email_otp(email.as_str(), otp).await?;
        let token = match response.token {
            Some(token) if response.success && !token.is_empty() => SecretString::from(token),
            _ => {
                return Err(AuthError::Rejected(
                    response
                        .message
                        .unwrap_or_else(|| "Verification failed".to_string()),
                ));
            }
        };

        self.inner.storage.set(keys::TOKEN, token.expose_secret())?;
        self.inner.api.set_token(token.clone());
        info!(email = %email.masked(), "Email verified, backend session started");
        self.inner.state.update(|s| {
            s.backend_session = Some(BackendSession {
                email: email.into_inner(),
                token,
            });
        });
        Ok(())
    }

    /// Restore a token-backed session from storage.
    ///
    /// Returns `true` if a token was found. The restored session has an
    /// empty email until the profile is fetched.
    pub fn hydrate_from_storage(&self) -> bool {
        let token = match self.inner.storage.get(keys::TOKEN) {
            Ok(Some(token)) if !token.trim().is_empty() => SecretString::from(token),
            Ok(_) => return false,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                return false;
            }
        };
        self.inner.api.set_token(token.clone());
        self.inner.state.update(|s| {
            s.backend_session = Some(BackendSession {
                email: String::new(),
                token,
            });
        });
        true
    }

    /// End the token-backed session locally. No network call is made.
    pub fn clear_backend_session(&self) {
        if let Err(e) = self.inner.storage.remove(keys::TOKEN) {
            warn!(error = %e, "Failed to remove stored token");
        }
        self.inner.api.clear_token();
        self.inner.state.update(|s| {
            s.backend_session = None;
            s.user_profile = None;
        });
    }

    /// Fetch the signed-in user's profile into the auth state.
    ///
    /// A hydrated session that lacks an email picks it up from the profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_user_profile(&self) -> Result<Option<UserProfile>, AuthError> {
        self.inner.state.update(|s| s.profile_loading = true);
        let result = self.inner.api.get_profile().await;
        self.inner.state.update(|s| {
            s.profile_loading = false;
            if let Ok(Some(profile)) = &result {
                s.user_profile = Some(profile.clone());
                if let Some(session) = s.backend_session.as_mut()
                    && session.email.is_empty()
                {
                    session.email.clone_from(&profile.email);
                }
            }
        });
        Ok(result?)
    }

    /// Update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Api` if the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_user_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, AuthError> {
        let profile = self.inner.api.update_profile(update).await?;
        if let Some(profile) = &profile {
            self.inner
                .state
                .update(|s| s.user_profile = Some(profile.clone()));
        }
        Ok(profile)
    }

    /// Forget the code-sent address and any error.
    pub fn reset_otp_state(&self) {
        self.inner.state.update(|s| {
            s.email_sent_to = None;
            s.error = None;
        });
    }

    fn begin(&self) {
        self.inner.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn finish(&self, error: Option<&AuthError>) {
        self.inner.state.update(|s| {
            s.is_loading = false;
            if let Some(e) = error {
                s.error = Some(e.user_message());
            }
        });
    }
}
