//! Session resolution.
//!
//! A visitor is in one of three states: anonymous, signed in through the
//! identity provider, or holding a token from email one-time-code login.
//! The two signed-in states never coexist in the resolved [`Session`]; the
//! identity provider wins when both are present.

pub mod identity;

use std::sync::Arc;
use std::time::Duration;

use carpet_core::{SignUpForm, UserId};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::services::auth::{AuthError, AuthService};
use crate::store::Store;
use identity::{IdentityProvider, IdentityUser, PhoneVerification};

/// A token-backed session from email one-time-code login.
#[derive(Debug, Clone)]
pub struct BackendSession {
    /// Empty when restored from storage before the profile is fetched.
    pub email: String,
    pub token: SecretString,
}

/// The resolved session.
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Federated(IdentityUser),
    Backend(BackendSession),
}

impl Session {
    /// Pick the effective session. The identity provider takes precedence.
    #[must_use]
    pub fn resolve(federated: Option<IdentityUser>, backend: Option<BackendSession>) -> Self {
        match (federated, backend) {
            (Some(user), _) => Self::Federated(user),
            (None, Some(session)) => Self::Backend(session),
            (None, None) => Self::Anonymous,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        match self {
            Self::Anonymous => None,
            Self::Federated(user) => Some(SessionUser::from(user)),
            Self::Backend(session) => Some(SessionUser::backend(&session.email)),
        }
    }

    /// Stable identity for change detection.
    #[must_use]
    pub fn uid(&self) -> Option<UserId> {
        self.user().map(|u| u.uid)
    }
}

/// The signed-in user as the rest of the storefront sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl SessionUser {
    /// Synthetic user for a token-backed session.
    #[must_use]
    pub fn backend(email: &str) -> Self {
        Self {
            uid: UserId::new(format!("backend-{email}")),
            email: (!email.is_empty()).then(|| email.to_string()),
            display_name: None,
            photo_url: None,
        }
    }
}

impl From<&IdentityUser> for SessionUser {
    fn from(user: &IdentityUser) -> Self {
        Self {
            uid: UserId::new(user.uid.clone()),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
        }
    }
}

/// Outcome of a federated sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(IdentityUser),
    /// The popup failed and a redirect was started instead; the result
    /// arrives on the next [`SessionManager::initialize`].
    Redirecting,
}

// =============================================================================
// SessionManager
// =============================================================================

/// Tracks the identity-provider user alongside the backend session and
/// exposes the resolved [`Session`].
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    identity: Arc<dyn IdentityProvider>,
    auth: AuthService,
    federated: Store<Option<IdentityUser>>,
    loading: Store<bool>,
    redirect_timeout: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        auth: AuthService,
        redirect_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SessionManagerInner {
                identity,
                auth,
                federated: Store::new(None),
                loading: Store::new(true),
                redirect_timeout,
            }),
        }
    }

    /// Restore state at startup.
    ///
    /// Hydrates the backend token, then waits for any pending redirect
    /// sign-in to complete, giving up after the configured timeout.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Session {
        if self.inner.auth.hydrate_from_storage() {
            debug!("Restored backend session from storage");
        }

        let pending =
            tokio::time::timeout(self.inner.redirect_timeout, self.inner.identity.redirect_result())
                .await;
        match pending {
            Ok(Ok(Some(user))) => {
                info!(uid = %user.uid, "Completed redirect sign-in");
                self.inner.federated.set(Some(user));
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => warn!(code = %e.code, "Redirect sign-in failed"),
            Err(_) => debug!("Timed out waiting for redirect result"),
        }

        if let Some(user) = self.inner.identity.current_user() {
            self.inner.federated.set(Some(user));
        }
        self.inner.loading.set(false);
        self.current()
    }

    /// The resolved session right now.
    #[must_use]
    pub fn current(&self) -> Session {
        Session::resolve(
            self.inner.federated.snapshot(),
            self.inner.auth.backend_session(),
        )
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        self.current().user()
    }

    /// Whether startup resolution is still running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    /// Subscribe to identity-provider user changes.
    #[must_use]
    pub fn subscribe_identity(&self) -> watch::Receiver<Option<IdentityUser>> {
        self.inner.federated.subscribe()
    }

    /// The auth service backing token sessions.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Federated sign-in. Popup failures that a redirect can work around
    /// start a redirect instead.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Identity` if neither popup nor redirect works.
    #[instrument(skip(self))]
    pub async fn sign_in_federated(&self) -> Result<SignInOutcome, AuthError> {
        match self.inner.identity.sign_in_with_popup().await {
            Ok(user) => {
                self.inner.federated.set(Some(user.clone()));
                Ok(SignInOutcome::SignedIn(user))
            }
            Err(e) if e.falls_back_to_redirect() => {
                debug!(code = %e.code, "Popup sign-in unavailable, falling back to redirect");
                self.inner.identity.sign_in_with_redirect().await?;
                Ok(SignInOutcome::Redirecting)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Email and password sign-in at the identity provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` for a malformed email or a provider refusal.
    #[instrument(skip(self, email, password))]
    pub async fn sign_in_with_email(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionUser, AuthError> {
        let email = carpet_core::Email::parse(email)?;
        let user = self
            .inner
            .identity
            .sign_in_with_email(&email, password)
            .await?;
        Ok(self.set_federated(user))
    }

    /// Create an account at the identity provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` before any provider call if the form
    /// is incomplete, or `AuthError::Identity` if the provider refuses.
    #[instrument(skip(self, form))]
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<SessionUser, AuthError> {
        let email = form.validate()?;
        let password = SecretString::from(form.password.clone());
        let user = self
            .inner
            .identity
            .sign_up_with_email(&email, &password)
            .await?;
        Ok(self.set_federated(user))
    }

    /// Text a sign-in code to a phone number.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Identity` if the provider refuses.
    #[instrument(skip(self, phone_number))]
    pub async fn send_phone_code(&self, phone_number: &str) -> Result<PhoneVerification, AuthError> {
        Ok(self
            .inner
            .identity
            .send_phone_code(phone_number.trim())
            .await?)
    }

    /// Complete phone sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the code is empty or the provider refuses it.
    #[instrument(skip(self, verification, code))]
    pub async fn confirm_phone_code(
        &self,
        verification: &PhoneVerification,
        code: &str,
    ) -> Result<SessionUser, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::MissingCode);
        }
        let user = self
            .inner
            .identity
            .confirm_phone_code(verification, code)
            .await?;
        Ok(self.set_federated(user))
    }

    /// Sign out of whichever session is active. A token-backed session is
    /// ended locally without a network call.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Identity` if the provider fails to sign out.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if self.inner.federated.borrow().is_some() {
            self.inner.identity.sign_out().await?;
            self.inner.federated.set(None);
        } else if self.inner.auth.backend_session().is_some() {
            self.inner.auth.clear_backend_session();
        }
        Ok(())
    }

    /// Delete the identity-provider account and sign out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` without a federated user, or
    /// `AuthError::Identity` if the provider refuses.
    #[instrument(skip(self))]
    pub async fn delete_account(&self) -> Result<(), AuthError> {
        if self.inner.federated.borrow().is_none() {
            return Err(AuthError::NotSignedIn);
        }
        self.inner.identity.delete_account().await?;
        self.inner.federated.set(None);
        Ok(())
    }

    fn set_federated(&self, user: IdentityUser) -> SessionUser {
        let session_user = SessionUser::from(&user);
        self.inner.federated.set(Some(user));
        session_user
    }
}
