//! Cache types for catalog responses.

use carpet_core::{Product, ProductId};

use super::types::ProductPage;

/// Cache key for product reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    /// Listing keyed by its serialized query.
    Products(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Box<ProductPage>),
}
