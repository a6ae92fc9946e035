//! Wishlist service with local and server-backed modes.
//!
//! Same shape as the cart: a [`WishlistBackend`] per mode and a service
//! that swaps them on session changes. Adding a saved product is a no-op;
//! toggling flips membership.

use std::sync::Arc;

use async_trait::async_trait;
use carpet_core::{Product, ProductId, WishlistEntries, WishlistItem};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::api::types::LinesResponse;
use crate::api::{ApiClient, ApiError};
use crate::config::MergePolicy;
use crate::error::Result;
use crate::storage::{self, KeyValueStore, keys};
use crate::store::{Store, WishlistState};

use super::SyncMode;

/// Storage for wishlist entries. Every mutation returns the authoritative
/// entries afterwards.
#[async_trait]
pub trait WishlistBackend: Send + Sync {
    fn mode(&self) -> SyncMode;

    async fn load(&self) -> Result<WishlistEntries>;

    async fn add(&self, item: WishlistItem) -> Result<WishlistEntries>;

    async fn remove(&self, product_id: &ProductId) -> Result<WishlistEntries>;

    async fn toggle(&self, item: WishlistItem) -> Result<WishlistEntries>;
}

/// Wishlist persisted under the `wishlist` storage key.
pub struct LocalWishlist {
    storage: Arc<dyn KeyValueStore>,
}

impl LocalWishlist {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    fn read(&self) -> WishlistEntries {
        storage::load_or_default(self.storage.as_ref(), keys::WISHLIST)
    }

    fn mutate(&self, f: impl FnOnce(&mut WishlistEntries)) -> Result<WishlistEntries> {
        let mut entries = self.read();
        f(&mut entries);
        storage::save(self.storage.as_ref(), keys::WISHLIST, &entries)?;
        Ok(entries)
    }

    fn clear(&self) -> Result<()> {
        self.storage.remove(keys::WISHLIST)?;
        Ok(())
    }
}

#[async_trait]
impl WishlistBackend for LocalWishlist {
    fn mode(&self) -> SyncMode {
        SyncMode::Local
    }

    async fn load(&self) -> Result<WishlistEntries> {
        Ok(self.read())
    }

    async fn add(&self, item: WishlistItem) -> Result<WishlistEntries> {
        self.mutate(|entries| {
            entries.add(item);
        })
    }

    async fn remove(&self, product_id: &ProductId) -> Result<WishlistEntries> {
        self.mutate(|entries| {
            entries.remove(product_id);
        })
    }

    async fn toggle(&self, item: WishlistItem) -> Result<WishlistEntries> {
        self.mutate(|entries| {
            entries.toggle(item);
        })
    }
}

/// Wishlist held by the server for the signed-in user.
pub struct RemoteWishlist {
    api: ApiClient,
}

impl RemoteWishlist {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn settle(&self, response: LinesResponse) -> Result<WishlistEntries> {
        if !response.success {
            return Err(ApiError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Wishlist update failed".to_string()),
            )
            .into());
        }
        match response.into_wishlist() {
            Some(entries) => Ok(entries),
            None => {
                debug!("Wishlist mutation did not echo items, re-fetching");
                self.load().await
            }
        }
    }
}

#[async_trait]
impl WishlistBackend for RemoteWishlist {
    fn mode(&self) -> SyncMode {
        SyncMode::Remote
    }

    async fn load(&self) -> Result<WishlistEntries> {
        let response = self.api.get_wishlist().await?;
        Ok(response.into_wishlist().unwrap_or_default())
    }

    async fn add(&self, item: WishlistItem) -> Result<WishlistEntries> {
        let response = self.api.add_to_wishlist(&item.product_id).await?;
        self.settle(response).await
    }

    async fn remove(&self, product_id: &ProductId) -> Result<WishlistEntries> {
        let response = self.api.remove_wishlist_item(product_id).await?;
        self.settle(response).await
    }

    async fn toggle(&self, item: WishlistItem) -> Result<WishlistEntries> {
        let response = self.api.toggle_wishlist(&item.product_id).await?;
        self.settle(response).await
    }
}

/// Wishlist operations against whichever backend the session calls for.
pub struct WishlistService {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    backend: Mutex<Box<dyn WishlistBackend>>,
    state: Store<WishlistState>,
}

impl WishlistService {
    /// Start in local mode with the stored anonymous wishlist.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStore>) -> Self {
        let local = LocalWishlist::new(storage.clone());
        let state = Store::new(WishlistState {
            items: local.read(),
            is_loading: false,
        });
        Self {
            api,
            storage,
            backend: Mutex::new(Box::new(local)),
            state,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &Store<WishlistState> {
        &self.state
    }

    #[must_use]
    pub fn items(&self) -> WishlistEntries {
        self.state.borrow().items.clone()
    }

    /// Whether a product is saved.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.state.borrow().items.contains(product_id)
    }

    pub async fn mode(&self) -> SyncMode {
        self.backend.lock().await.mode()
    }

    /// Save a product. Saving it again changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn add(&self, item: WishlistItem) -> Result<()> {
        let backend = self.backend.lock().await;
        let entries = backend.add(item).await?;
        self.publish(entries);
        Ok(())
    }

    /// Save a catalog product with its current name, image and price.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn add_product(&self, product: &Product) -> Result<()> {
        self.add(product.to_wishlist_item()).await
    }

    /// Unsave a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<()> {
        let backend = self.backend.lock().await;
        let entries = backend.remove(product_id).await?;
        self.publish(entries);
        Ok(())
    }

    /// Flip membership. Returns whether the product is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn toggle(&self, item: WishlistItem) -> Result<bool> {
        let product_id = item.product_id.clone();
        let backend = self.backend.lock().await;
        let entries = backend.toggle(item).await?;
        let saved = entries.contains(&product_id);
        self.publish(entries);
        Ok(saved)
    }

    /// Reload entries from the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let backend = self.backend.lock().await;
        self.reload(&**backend).await
    }

    /// Switch to the server wishlist, merging or dropping anonymous
    /// entries per `policy`. Merged entries leave local storage one by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the server wishlist cannot be fetched or local
    /// storage cannot be written.
    #[instrument(skip(self))]
    pub async fn use_remote(&self, policy: MergePolicy) -> Result<()> {
        let mut backend = self.backend.lock().await;
        let local = LocalWishlist::new(self.storage.clone());
        let remote = RemoteWishlist::new(self.api.clone());

        let pending = local.read();
        match policy {
            MergePolicy::Merge if !pending.is_empty() => {
                info!(entries = pending.len(), "Merging anonymous wishlist into server wishlist");
                for item in pending {
                    let product_id = item.product_id.clone();
                    match remote.add(item).await {
                        Ok(_) => {
                            local.remove(&product_id).await?;
                        }
                        Err(e) => {
                            warn!(
                                error = %e,
                                product_id = %product_id,
                                "Failed to merge wishlist entry"
                            );
                        }
                    }
                }
            }
            _ => local.clear()?,
        }

        *backend = Box::new(remote);
        self.reload(&**backend).await
    }

    /// Switch to the local wishlist. The store is emptied with no network
    /// call. Leaving the server wishlist drops entries it refused to merge.
    #[instrument(skip(self))]
    pub async fn use_local(&self) {
        let mut backend = self.backend.lock().await;
        self.state.set(WishlistState::default());
        let local = LocalWishlist::new(self.storage.clone());

        if backend.mode() == SyncMode::Remote {
            if let Err(e) = local.clear() {
                warn!(error = %e, "Failed to drop unmerged wishlist entries");
            }
            *backend = Box::new(local);
            return;
        }

        let entries = local.read();
        *backend = Box::new(local);
        self.publish(entries);
    }

    async fn reload(&self, backend: &dyn WishlistBackend) -> Result<()> {
        self.state.update(|s| s.is_loading = true);
        let result = backend.load().await;
        self.state.update(|s| {
            s.is_loading = false;
            if let Ok(entries) = &result {
                s.items = entries.clone();
            }
        });
        result.map(|_| ())
    }

    fn publish(&self, entries: WishlistEntries) {
        self.state.update(|s| s.items = entries);
    }
}
