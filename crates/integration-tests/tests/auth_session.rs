//! Session handling: email one-time codes, token hydration, and the
//! identity-provider sign-in paths.

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use carpet_core::{Email, NewAddress};
use carpet_integration_tests::{MockBackend, OTP_CODE, TOKEN, memory_storage, sign_in};
use carpet_storefront::services::SyncMode;
use carpet_storefront::session::identity::{
    IdentityError, IdentityProvider, IdentityUser, NoIdentityProvider, PhoneVerification,
};
use carpet_storefront::session::{Session, SignInOutcome};
use carpet_storefront::storage::{FileStore, keys};
use carpet_storefront::{ErrorKind, MergePolicy};
use secrecy::SecretString;

const EMAIL: &str = "farah@example.com";

// ============================================================================
// Scripted identity provider
// ============================================================================

/// Identity provider with a fixed popup result and an optional redirect
/// that never completes. Everything else behaves like no provider at all.
#[derive(Default)]
struct ScriptedProvider {
    popup: Option<Result<IdentityUser, &'static str>>,
    stall_redirect: bool,
    redirect_started: AtomicBool,
}

fn federated_user() -> IdentityUser {
    IdentityUser {
        uid: "fed-7".into(),
        email: Some("zoya@example.com".into()),
        display_name: Some("Zoya".into()),
        photo_url: None,
        phone_number: None,
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    fn current_user(&self) -> Option<IdentityUser> {
        None
    }

    async fn redirect_result(&self) -> Result<Option<IdentityUser>, IdentityError> {
        if self.stall_redirect {
            std::future::pending::<()>().await;
        }
        Ok(None)
    }

    async fn sign_in_with_popup(&self) -> Result<IdentityUser, IdentityError> {
        match &self.popup {
            Some(Ok(user)) => Ok(user.clone()),
            Some(Err(code)) => Err(IdentityError::from_code(*code)),
            None => NoIdentityProvider.sign_in_with_popup().await,
        }
    }

    async fn sign_in_with_redirect(&self) -> Result<(), IdentityError> {
        self.redirect_started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_in_with_email(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentityUser, IdentityError> {
        NoIdentityProvider.sign_in_with_email(email, password).await
    }

    async fn sign_up_with_email(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentityUser, IdentityError> {
        NoIdentityProvider.sign_up_with_email(email, password).await
    }

    async fn send_phone_code(
        &self,
        phone_number: &str,
    ) -> Result<PhoneVerification, IdentityError> {
        NoIdentityProvider.send_phone_code(phone_number).await
    }

    async fn confirm_phone_code(
        &self,
        verification: &PhoneVerification,
        code: &str,
    ) -> Result<IdentityUser, IdentityError> {
        NoIdentityProvider
            .confirm_phone_code(verification, code)
            .await
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), IdentityError> {
        NoIdentityProvider.delete_account().await
    }
}

// ============================================================================
// Email one-time code
// ============================================================================

#[tokio::test]
async fn test_verify_stores_token_and_goes_remote() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();
    let storefront = backend.storefront(storage.clone());
    storefront.initialize().await.unwrap();

    storefront.send_email_otp(EMAIL).await.unwrap();
    assert_eq!(
        storefront.auth().state().borrow().email_sent_to.as_deref(),
        Some(EMAIL)
    );

    storefront.verify_email_otp(EMAIL, OTP_CODE).await.unwrap();

    assert_eq!(storage.get(keys::TOKEN).unwrap().as_deref(), Some(TOKEN));
    assert!(storefront.api().has_token());
    assert_eq!(storefront.cart().mode().await, SyncMode::Remote);
    assert_eq!(storefront.wishlist().mode().await, SyncMode::Remote);
    assert_eq!(storefront.user().unwrap().email.as_deref(), Some(EMAIL));
    assert_eq!(backend.hits("GET /users/profile"), 1);
}

#[tokio::test]
async fn test_wrong_code_keeps_anonymous_session() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();
    let storefront = backend.storefront(storage.clone());
    storefront.initialize().await.unwrap();

    let err = storefront
        .verify_email_otp(EMAIL, "000000")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.to_string(), "Invalid or expired OTP");
    assert_eq!(
        storefront.auth().state().borrow().error.as_deref(),
        Some("Invalid or expired OTP")
    );
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    assert!(storefront.user().is_none());
    assert_eq!(storefront.cart().mode().await, SyncMode::Local);
    assert_eq!(backend.hits("GET /cart"), 0);
}

#[tokio::test]
async fn test_malformed_email_is_rejected_before_request() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());

    let err = storefront.send_email_otp("not-an-email").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.total_hits(), 0);
}

#[tokio::test]
async fn test_stored_token_hydrates_next_run() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();

    let first = backend.storefront(storage.clone());
    first.initialize().await.unwrap();
    sign_in(&first, EMAIL).await;
    backend.state().cart.push(("rug-kilim".into(), 2));
    drop(first);

    let second = backend.storefront(storage);
    let session = second.initialize().await.unwrap();

    assert!(matches!(session, Session::Backend(_)));
    assert_eq!(second.cart().mode().await, SyncMode::Remote);
    assert_eq!(second.cart().items().len(), 1);

    // The restored session learns its email from the profile
    assert_eq!(second.user().unwrap().email.as_deref(), Some(EMAIL));
    let profile = second.auth().state().borrow().user_profile.clone().unwrap();
    assert_eq!(profile.email, EMAIL);
}

#[tokio::test]
async fn test_file_storage_keeps_user_data_across_runs() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();

    let first = backend.storefront(Arc::new(FileStore::open(dir.path()).unwrap()));
    first.initialize().await.unwrap();
    sign_in(&first, EMAIL).await;
    first
        .addresses()
        .unwrap()
        .add(NewAddress {
            address: "3 Church Street".into(),
            city: "Bengaluru".into(),
            ..NewAddress::default()
        })
        .unwrap();
    drop(first);

    assert!(dir.path().join("token.json").exists());

    let second = backend.storefront(Arc::new(FileStore::open(dir.path()).unwrap()));
    second.initialize().await.unwrap();
    let addresses = second.addresses().unwrap().list().unwrap();
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].city, "Bengaluru");
}

#[tokio::test]
async fn test_repeated_sync_is_a_no_op() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();
    sign_in(&storefront, EMAIL).await;

    backend.reset_hits();
    storefront.sync_session().await.unwrap();
    storefront.sync_session().await.unwrap();

    assert_eq!(backend.total_hits(), 0);
}

#[tokio::test]
async fn test_session_watcher_follows_sign_out() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();
    sign_in(&storefront, EMAIL).await;
    let watcher = storefront.spawn_session_watcher();

    // Ending the backend session directly leaves the resync to the watcher
    storefront.auth().clear_backend_session();

    tokio::time::timeout(Duration::from_secs(2), async {
        while storefront.cart().mode().await != SyncMode::Local {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    drop(storefront);
    tokio::time::timeout(Duration::from_secs(2), watcher)
        .await
        .unwrap()
        .unwrap();
}

// ============================================================================
// Identity provider
// ============================================================================

#[tokio::test]
async fn test_stalled_redirect_does_not_block_startup() {
    let backend = MockBackend::start().await;
    let provider = Arc::new(ScriptedProvider {
        stall_redirect: true,
        ..ScriptedProvider::default()
    });
    let storefront = backend.storefront_with(memory_storage(), provider, MergePolicy::Merge);

    let session = tokio::time::timeout(Duration::from_secs(5), storefront.initialize())
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(session, Session::Anonymous));
    assert!(!storefront.session().is_loading());
}

#[tokio::test]
async fn test_federated_sign_in_without_token_stays_local() {
    let backend = MockBackend::start().await;
    let provider = Arc::new(ScriptedProvider {
        popup: Some(Ok(federated_user())),
        ..ScriptedProvider::default()
    });
    let storefront = backend.storefront_with(memory_storage(), provider, MergePolicy::Merge);
    storefront.initialize().await.unwrap();

    let outcome = storefront.sign_in_federated().await.unwrap();

    assert_eq!(outcome, SignInOutcome::SignedIn(federated_user()));
    let user = storefront.user().unwrap();
    assert_eq!(user.uid.as_str(), "fed-7");
    assert_eq!(user.display_name.as_deref(), Some("Zoya"));
    assert_eq!(storefront.cart().mode().await, SyncMode::Local);
    assert_eq!(backend.hits("GET /cart"), 0);

    // Per-user stores open for the federated user
    assert!(storefront.addresses().is_some());
    assert!(storefront.orders().is_some());
}

#[tokio::test]
async fn test_blocked_popup_falls_back_to_redirect() {
    let backend = MockBackend::start().await;
    let provider = Arc::new(ScriptedProvider {
        popup: Some(Err("auth/popup-blocked")),
        ..ScriptedProvider::default()
    });
    let storefront =
        backend.storefront_with(memory_storage(), provider.clone(), MergePolicy::Merge);
    storefront.initialize().await.unwrap();

    let outcome = storefront.sign_in_federated().await.unwrap();

    assert_eq!(outcome, SignInOutcome::Redirecting);
    assert!(provider.redirect_started.load(Ordering::SeqCst));
    assert!(storefront.user().is_none());
}

#[tokio::test]
async fn test_unconfigured_provider_refuses_federated_sign_in() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();

    let err = storefront.sign_in_federated().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IdentityProvider);
    assert!(storefront.user().is_none());
}
