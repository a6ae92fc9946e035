//! Wishlist entries.
//!
//! A wishlist is a set of saved products (no quantity). Membership is a
//! linear scan by product id, which is fine for the handful of entries a
//! shopper keeps.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A saved product with display snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: String,
    pub price: Decimal,
}

/// Ordered wishlist contents with at most one entry per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WishlistEntries(Vec<WishlistItem>);

impl WishlistEntries {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds entries from a list, keeping the first occurrence of each id.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = WishlistItem>) -> Self {
        let mut entries = Self::new();
        for item in items {
            entries.add(item);
        }
        entries
    }

    /// Adds an item. Returns `false` (and changes nothing) if it is already
    /// saved.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        if self.contains(&item.product_id) {
            return false;
        }
        self.0.push(item);
        true
    }

    /// Removes an item. Returns `false` if it was not saved.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.0.len();
        self.0.retain(|entry| &entry.product_id != product_id);
        self.0.len() != before
    }

    /// Flips membership. Returns the new membership state.
    pub fn toggle(&mut self, item: WishlistItem) -> bool {
        if self.remove(&item.product_id) {
            false
        } else {
            self.0.push(item);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.0.iter().any(|entry| &entry.product_id == product_id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WishlistItem> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[WishlistItem] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a WishlistEntries {
    type Item = &'a WishlistItem;
    type IntoIter = std::slice::Iter<'a, WishlistItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for WishlistEntries {
    type Item = WishlistItem;
    type IntoIter = std::vec::IntoIter<WishlistItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
