//! Catalog browsing and recently viewed products.

use std::sync::Arc;

use carpet_core::{Product, ProductId};
use tracing::instrument;

use crate::api::ApiClient;
pub use crate::api::types::{ProductPage, ProductQuery};
use crate::error::Result;
use crate::storage::{self, KeyValueStore, keys};
use crate::store::{ProductState, Store};

/// Most recently viewed products kept.
pub const RECENTLY_VIEWED_LIMIT: usize = 5;

/// Product listing and detail lookups, publishing the last listing to a
/// [`ProductState`] store.
pub struct ProductService {
    api: ApiClient,
    state: Store<ProductState>,
}

impl ProductService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Store::new(ProductState::default()),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &Store<ProductState> {
        &self.state
    }

    /// Fetch a page of products and publish it.
    ///
    /// On failure the previous listing stays in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing request fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.state.update(|s| s.is_loading = true);
        let result = self.api.list_products(query).await;
        self.state.update(|s| {
            s.is_loading = false;
            if let Ok(page) = &result {
                s.products.clone_from(&page.products);
                s.pagination = page.pagination;
            }
        });
        Ok(result?)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Product> {
        Ok(self.api.get_product(id).await?)
    }
}

/// Product ids the shopper opened recently, newest first.
pub struct RecentlyViewed {
    storage: Arc<dyn KeyValueStore>,
}

impl RecentlyViewed {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Recorded ids, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<ProductId> {
        storage::load_or_default(self.storage.as_ref(), keys::RECENTLY_VIEWED)
    }

    /// Move `id` to the front, dropping any earlier occurrence and anything
    /// past the limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn record(&self, id: &ProductId) -> Result<Vec<ProductId>> {
        let mut ids = self.list();
        ids.retain(|existing| existing != id);
        ids.insert(0, id.clone());
        ids.truncate(RECENTLY_VIEWED_LIMIT);
        storage::save(self.storage.as_ref(), keys::RECENTLY_VIEWED, &ids)?;
        Ok(ids)
    }

    /// Forget everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be removed.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove(keys::RECENTLY_VIEWED)?;
        Ok(())
    }
}
