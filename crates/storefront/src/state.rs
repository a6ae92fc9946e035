//! The storefront handle shared by front-ends.
//!
//! [`Storefront`] owns the API client, storage, session manager and every
//! service, and keeps cart and wishlist storage in step with the session:
//! a session with a backend token syncs them with the server, anything else
//! keeps them on the device.

use std::sync::{Arc, Weak};

use carpet_core::{ContactDetails, Product, ProductId, SavedOrder, ShippingDetails};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::api::ApiClient;
use crate::config::StorefrontConfig;
use crate::error::{Result, StorefrontError, clear_sentry_user, set_sentry_user};
use crate::profile::{AddressBook, OrderHistory, PaymentMethods, SettingsStore};
use crate::services::auth::AuthService;
use crate::services::cart::CartService;
use crate::services::checkout::{CheckoutError, CheckoutService};
use crate::services::payment::{HostedCheckout, PaymentService};
use crate::services::product::{ProductService, RecentlyViewed};
use crate::services::wishlist::WishlistService;
use crate::session::identity::{IdentityProvider, NoIdentityProvider};
use crate::session::{Session, SessionManager, SessionUser};
use crate::storage::{FileStore, KeyValueStore};

/// What cart and wishlist were last synced against.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SyncTarget {
    /// `None` for anonymous visitors. Token-backed sessions share one key
    /// since the email may only arrive with the profile.
    user: Option<String>,
    remote: bool,
    backend: bool,
}

impl SyncTarget {
    fn for_session(session: &Session, has_token: bool) -> Self {
        let (user, backend) = match session {
            Session::Anonymous => (None, false),
            Session::Federated(user) => (Some(user.uid.clone()), false),
            Session::Backend(_) => (Some("backend".to_owned()), true),
        };
        Self {
            remote: user.is_some() && has_token,
            user,
            backend,
        }
    }
}

/// Cheaply cloneable storefront client.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    storage: Arc<dyn KeyValueStore>,
    api: ApiClient,
    session: SessionManager,
    cart: CartService,
    wishlist: WishlistService,
    products: ProductService,
    checkout: CheckoutService,
    synced: Mutex<Option<SyncTarget>>,
}

impl Storefront {
    /// Build a storefront persisting to `config.storage_dir`, without an
    /// identity provider.
    ///
    /// # Errors
    ///
    /// Fails if the storage directory cannot be created or the HTTP client
    /// cannot be built.
    pub fn from_config(config: StorefrontConfig) -> Result<Self> {
        let storage = Arc::new(FileStore::open(&config.storage_dir)?);
        Self::new(config, storage, Arc::new(NoIdentityProvider))
    }

    /// Build a storefront over the given storage and identity provider.
    ///
    /// Cart and wishlist start in local mode; call
    /// [`initialize`](Self::initialize) to restore the session.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        storage: Arc<dyn KeyValueStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let auth = AuthService::new(api.clone(), storage.clone());
        let session = SessionManager::new(identity, auth, config.redirect_timeout);
        let payment = PaymentService::new(api.clone(), config.currency);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                cart: CartService::new(api.clone(), storage.clone()),
                wishlist: WishlistService::new(api.clone(), storage.clone()),
                products: ProductService::new(api.clone()),
                checkout: CheckoutService::new(storage.clone(), payment),
                synced: Mutex::new(None),
                config,
                storage,
                api,
                session,
            }),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.storage
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        self.inner.session.auth()
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistService {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    #[must_use]
    pub fn recently_viewed(&self) -> RecentlyViewed {
        RecentlyViewed::new(self.inner.storage.clone())
    }

    #[must_use]
    pub fn settings(&self) -> SettingsStore {
        SettingsStore::new(self.inner.storage.clone())
    }

    #[must_use]
    pub fn payment_methods(&self) -> PaymentMethods {
        PaymentMethods::new(self.inner.storage.clone())
    }

    /// The signed-in user's address book.
    #[must_use]
    pub fn addresses(&self) -> Option<AddressBook> {
        let user = self.inner.session.user()?;
        Some(AddressBook::new(self.inner.storage.clone(), user.uid))
    }

    /// The signed-in user's order history.
    #[must_use]
    pub fn orders(&self) -> Option<OrderHistory> {
        let user = self.inner.session.user()?;
        Some(OrderHistory::new(self.inner.storage.clone(), user.uid))
    }

    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        self.inner.session.user()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Restore the session and sync cart and wishlist to it.
    ///
    /// # Errors
    ///
    /// Returns an error if syncing with the server fails. The session itself
    /// is restored regardless.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Session> {
        let session = self.inner.session.initialize().await;
        self.sync_session().await?;
        Ok(session)
    }

    /// Bring cart, wishlist and profile in line with the current session.
    ///
    /// Repeated calls for an unchanged session do nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failure; later steps still run and report their
    /// own failures.
    pub async fn sync_session(&self) -> Result<()> {
        self.apply_session(false).await
    }

    /// Email a one-time login code.
    ///
    /// # Errors
    ///
    /// See [`AuthService::send_email_otp`].
    pub async fn send_email_otp(&self, email: &str) -> Result<()> {
        Ok(self.auth().send_email_otp(email).await?)
    }

    /// Verify a one-time code and switch cart and wishlist to the server.
    ///
    /// # Errors
    ///
    /// Fails if the code is rejected; sync failures after a successful
    /// verification are returned as well.
    pub async fn verify_email_otp(&self, email: &str, otp: &str) -> Result<()> {
        self.auth().verify_email_otp(email, otp).await?;
        self.apply_session(true).await
    }

    /// Sign in through the identity provider.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::sign_in_federated`].
    pub async fn sign_in_federated(&self) -> Result<crate::session::SignInOutcome> {
        let outcome = self.inner.session.sign_in_federated().await?;
        self.sync_session().await?;
        Ok(outcome)
    }

    /// Sign out. Cart and wishlist fall back to local storage without a
    /// network call.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity provider fails to sign out.
    pub async fn sign_out(&self) -> Result<()> {
        self.inner.session.sign_out().await?;
        self.sync_session().await
    }

    /// Run [`sync_session`](Self::sync_session) whenever the auth state or
    /// the identity-provider user changes. Failures are logged.
    ///
    /// The task ends once the storefront is dropped.
    #[must_use]
    pub fn spawn_session_watcher(&self) -> JoinHandle<()> {
        let weak: Weak<StorefrontInner> = Arc::downgrade(&self.inner);
        let mut auth_rx = self.auth().state().subscribe();
        let mut identity_rx = self.inner.session.subscribe_identity();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = auth_rx.changed() => if changed.is_err() { break },
                    changed = identity_rx.changed() => if changed.is_err() { break },
                }
                let Some(inner) = weak.upgrade() else { break };
                let storefront = Self { inner };
                if let Err(e) = storefront.sync_session().await {
                    e.report("Session sync failed");
                }
            }
            debug!("Session watcher stopped");
        })
    }

    async fn apply_session(&self, force: bool) -> Result<()> {
        let session = self.inner.session.current();
        let target = SyncTarget::for_session(&session, self.inner.api.has_token());

        let mut synced = self.inner.synced.lock().await;
        if !force && synced.as_ref() == Some(&target) {
            return Ok(());
        }
        let was_remote = synced.as_ref().is_some_and(|t| t.remote);
        let user_changed = synced.as_ref().map(|t| &t.user) != Some(&target.user);
        *synced = Some(target.clone());

        let mut first_error: Option<StorefrontError> = None;
        let mut keep = |result: Result<()>, context: &str| {
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    e.report(context);
                }
            }
        };

        if target.remote && (force || !was_remote || user_changed) {
            info!("Syncing cart and wishlist with the server");
            let policy = self.inner.config.merge_policy;
            keep(self.inner.cart.use_remote(policy).await, "Cart sync failed");
            keep(
                self.inner.wishlist.use_remote(policy).await,
                "Wishlist sync failed",
            );
        } else if !target.remote && was_remote {
            info!("Session ended, switching cart and wishlist to local storage");
            self.inner.cart.use_local().await;
            self.inner.wishlist.use_local().await;
        }

        if target.backend && target.remote && (force || user_changed) {
            keep(
                self.auth().get_user_profile().await.map(|_| ()).map_err(Into::into),
                "Profile fetch failed",
            );
        }

        match session.user() {
            Some(user) => set_sentry_user(&user.uid, user.email.as_deref()),
            None => clear_sentry_user(),
        }

        first_error.map_or(Ok(()), Err)
    }

    // =========================================================================
    // Catalog and checkout
    // =========================================================================

    /// Fetch a product and remember it as recently viewed.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched.
    pub async fn view_product(&self, id: &ProductId) -> Result<Product> {
        let product = self.inner.products.get(id).await?;
        if let Err(e) = self.recently_viewed().record(id) {
            e.report("Failed to record recently viewed product");
        }
        Ok(product)
    }

    /// Place an order without payment. See [`CheckoutService::place_order`].
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` on invalid input, an empty cart, or a
    /// storage failure.
    pub async fn place_order(
        &self,
        contact: &ContactDetails,
        shipping: &ShippingDetails,
    ) -> std::result::Result<SavedOrder, CheckoutError> {
        let user = self.user();
        self.inner
            .checkout
            .place_order(&self.inner.cart, user.as_ref(), contact, shipping)
            .await
    }

    /// Place an order through the hosted checkout. See
    /// [`CheckoutService::place_paid_order`].
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` unless the payment is verified.
    pub async fn place_paid_order(
        &self,
        contact: &ContactDetails,
        shipping: &ShippingDetails,
        widget: &dyn HostedCheckout,
    ) -> std::result::Result<SavedOrder, CheckoutError> {
        let user = self.user();
        self.inner
            .checkout
            .place_paid_order(&self.inner.cart, user.as_ref(), contact, shipping, widget)
            .await
    }
}
