//! Catalog products as served by the storefront API.
//!
//! Products are server-owned and read-only on the client. Most descriptive
//! attributes are optional because listing and detail responses do not
//! always populate every field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartItem;
use super::id::ProductId;
use super::wishlist::WishlistItem;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    /// List price before discount.
    #[serde(default)]
    pub mrp: Option<Decimal>,
    /// Price after discount, when the server computes one.
    #[serde(default)]
    pub final_price: Option<Decimal>,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub shipping_charge: Option<Decimal>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default)]
    pub room_type: Vec<String>,
    #[serde(default)]
    pub care_instructions: Option<String>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl Product {
    /// The price a shopper pays: the discounted price when present.
    #[must_use]
    pub fn selling_price(&self) -> Decimal {
        self.final_price.unwrap_or(self.price)
    }

    /// First image, used as the cart/wishlist thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }

    /// Snapshot this product as a cart line.
    #[must_use]
    pub fn to_cart_item(&self, quantity: u32) -> CartItem {
        CartItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            image_url: self.primary_image().to_owned(),
            price: self.selling_price(),
            quantity,
        }
    }

    /// Snapshot this product as a wishlist entry.
    #[must_use]
    pub fn to_wishlist_item(&self) -> WishlistItem {
        WishlistItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            image_url: self.primary_image().to_owned(),
            price: self.selling_price(),
        }
    }
}

/// Listing pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }
}
