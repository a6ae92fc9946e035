//! Cart service with local and server-backed modes.
//!
//! Anonymous visitors keep their cart in local storage. Once a session with
//! a backend token exists the cart lives on the server: mutations are sent
//! as-is and the store is replaced with whatever line list the server
//! returns (or re-fetched when it returns none). Nothing is applied
//! optimistically, so a failed call leaves the store as it was.

use std::sync::Arc;

use async_trait::async_trait;
use carpet_core::{CartItem, CartLines, Product, ProductId, ValidationError};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::api::types::LinesResponse;
use crate::api::{ApiClient, ApiError};
use crate::config::MergePolicy;
use crate::error::{Result, add_breadcrumb};
use crate::storage::{self, KeyValueStore, keys};
use crate::store::{CartState, Store};

use super::SyncMode;

/// Storage for cart lines. Every mutation returns the authoritative lines
/// afterwards.
#[async_trait]
pub trait CartBackend: Send + Sync {
    fn mode(&self) -> SyncMode;

    async fn load(&self) -> Result<CartLines>;

    async fn add(&self, item: CartItem) -> Result<CartLines>;

    /// Set a line's quantity. Callers route zero to [`remove`](Self::remove).
    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<CartLines>;

    async fn remove(&self, product_id: &ProductId) -> Result<CartLines>;

    async fn clear(&self) -> Result<CartLines>;
}

// =============================================================================
// LocalCart
// =============================================================================

/// Cart persisted under the `cart` storage key.
pub struct LocalCart {
    storage: Arc<dyn KeyValueStore>,
}

impl LocalCart {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    fn read(&self) -> CartLines {
        storage::load_or_default(self.storage.as_ref(), keys::CART)
    }

    fn write(&self, lines: &CartLines) -> Result<()> {
        storage::save(self.storage.as_ref(), keys::CART, lines)?;
        Ok(())
    }

    fn mutate(&self, f: impl FnOnce(&mut CartLines)) -> Result<CartLines> {
        let mut lines = self.read();
        f(&mut lines);
        self.write(&lines)?;
        Ok(lines)
    }
}

#[async_trait]
impl CartBackend for LocalCart {
    fn mode(&self) -> SyncMode {
        SyncMode::Local
    }

    async fn load(&self) -> Result<CartLines> {
        Ok(self.read())
    }

    async fn add(&self, item: CartItem) -> Result<CartLines> {
        self.mutate(|lines| lines.add(item))
    }

    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<CartLines> {
        self.mutate(|lines| {
            lines.set_quantity(product_id, i64::from(quantity));
        })
    }

    async fn remove(&self, product_id: &ProductId) -> Result<CartLines> {
        self.mutate(|lines| {
            lines.remove(product_id);
        })
    }

    async fn clear(&self) -> Result<CartLines> {
        self.storage.remove(keys::CART)?;
        Ok(CartLines::new())
    }
}

// =============================================================================
// RemoteCart
// =============================================================================

/// Cart held by the server for the signed-in user.
pub struct RemoteCart {
    api: ApiClient,
}

impl RemoteCart {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Use the echoed lines, or fetch them when the server sent none.
    async fn settle(&self, response: LinesResponse) -> Result<CartLines> {
        if !response.success {
            return Err(ApiError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Cart update failed".to_string()),
            )
            .into());
        }
        match response.into_cart() {
            Some(lines) => Ok(lines),
            None => {
                debug!("Cart mutation did not echo items, re-fetching");
                self.load().await
            }
        }
    }
}

#[async_trait]
impl CartBackend for RemoteCart {
    fn mode(&self) -> SyncMode {
        SyncMode::Remote
    }

    async fn load(&self) -> Result<CartLines> {
        let response = self.api.get_cart().await?;
        Ok(response.into_cart().unwrap_or_default())
    }

    async fn add(&self, item: CartItem) -> Result<CartLines> {
        let response = self
            .api
            .add_to_cart(&item.product_id, item.quantity)
            .await?;
        self.settle(response).await
    }

    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<CartLines> {
        let response = self.api.update_cart(product_id, quantity).await?;
        self.settle(response).await
    }

    async fn remove(&self, product_id: &ProductId) -> Result<CartLines> {
        let response = self.api.remove_cart_item(product_id).await?;
        self.settle(response).await
    }

    async fn clear(&self) -> Result<CartLines> {
        self.api.clear_cart().await?;
        Ok(CartLines::new())
    }
}

// =============================================================================
// CartService
// =============================================================================

/// Cart operations against whichever backend the session calls for.
pub struct CartService {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    backend: Mutex<Box<dyn CartBackend>>,
    state: Store<CartState>,
}

impl CartService {
    /// Start in local mode with the stored anonymous cart.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStore>) -> Self {
        let local = LocalCart::new(storage.clone());
        let state = Store::new(CartState {
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

    /// Observable cart state.
    #[must_use]
    pub const fn state(&self) -> &Store<CartState> {
        &self.state
    }

    /// Current lines.
    #[must_use]
    pub fn items(&self) -> CartLines {
        self.state.borrow().items.clone()
    }

    /// Units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.state.borrow().items.total_quantity()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.state.borrow().items.subtotal()
    }

    pub async fn mode(&self) -> SyncMode {
        self.backend.lock().await.mode()
    }

    /// Add a line, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Fails on a zero quantity, or if the backend call fails; the store is
    /// left unchanged in that case.
    #[instrument(skip(self, item), fields(product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add(&self, item: CartItem) -> Result<()> {
        if item.quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity.into());
        }
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", item.product_id.as_str())]),
        );
        let backend = self.backend.lock().await;
        let lines = backend.add(item).await?;
        self.publish(lines);
        Ok(())
    }

    /// Add a catalog product, snapshotting its name, image and price.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub async fn add_product(&self, product: &Product, quantity: u32) -> Result<()> {
        self.add(product.to_cart_item(quantity)).await
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            return self.remove(product_id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let backend = self.backend.lock().await;
        let lines = backend.set_quantity(product_id, quantity).await?;
        self.publish(lines);
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<()> {
        let backend = self.backend.lock().await;
        let lines = backend.remove(product_id).await?;
        self.publish(lines);
        Ok(())
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let backend = self.backend.lock().await;
        let lines = backend.clear().await?;
        self.publish(lines);
        Ok(())
    }

    /// Reload lines from the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let backend = self.backend.lock().await;
        self.reload(&**backend).await
    }

    /// Switch to the server cart.
    ///
    /// Anonymous lines are pushed to the server under
    /// [`MergePolicy::Merge`] and dropped under [`MergePolicy::Discard`].
    /// Each line leaves local storage as soon as the server accepts it, so
    /// a later merge only pushes what was refused.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cart cannot be fetched or local
    /// storage cannot be written. A refused line is logged and skipped.
    #[instrument(skip(self))]
    pub async fn use_remote(&self, policy: MergePolicy) -> Result<()> {
        let mut backend = self.backend.lock().await;
        let local = LocalCart::new(self.storage.clone());
        let remote = RemoteCart::new(self.api.clone());

        let pending = local.read();
        match policy {
            MergePolicy::Merge if !pending.is_empty() => {
                info!(lines = pending.len(), "Merging anonymous cart into server cart");
                for item in pending {
                    let product_id = item.product_id.clone();
                    match remote.add(item).await {
                        Ok(_) => {
                            local.remove(&product_id).await?;
                        }
                        Err(e) => {
                            warn!(error = %e, product_id = %product_id, "Failed to merge cart line");
                        }
                    }
                }
            }
            _ => {
                local.clear().await?;
            }
        }

        *backend = Box::new(remote);
        self.reload(&**backend).await
    }

    /// Switch to the local cart. The store is emptied immediately with no
    /// network call. Leaving the server cart also drops anonymous lines the
    /// server refused to merge; otherwise the stored cart is loaded.
    #[instrument(skip(self))]
    pub async fn use_local(&self) {
        let mut backend = self.backend.lock().await;
        self.state.set(CartState::default());
        let local = LocalCart::new(self.storage.clone());

        if backend.mode() == SyncMode::Remote {
            if let Err(e) = local.clear().await {
                warn!(error = %e, "Failed to drop unmerged cart lines");
            }
            *backend = Box::new(local);
            return;
        }

        let lines = local.read();
        *backend = Box::new(local);
        self.publish(lines);
    }

    async fn reload(&self, backend: &dyn CartBackend) -> Result<()> {
        self.state.update(|s| s.is_loading = true);
        match backend.load().await {
            Ok(lines) => {
                self.state.set(CartState {
                    items: lines,
                    is_loading: false,
                });
                Ok(())
            }
            Err(e) => {
                self.state.update(|s| s.is_loading = false);
                Err(e)
            }
        }
    }

    fn publish(&self, lines: CartLines) {
        self.state.update(|s| s.items = lines);
    }
}
