//! Cart lines and the rules that keep them consistent.
//!
//! ## Invariants
//! - At most one line per product id (adding again increases quantity)
//! - Quantity is always >= 1; setting it to 0 or below removes the line
//! - Prices are snapshots taken when the line was created
//!
//! Both the anonymous local cart and the server-echoed cart are represented
//! as [`CartLines`], so these rules hold regardless of where state lives.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// One product-quantity pairing in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product the line refers to.
    pub product_id: ProductId,
    /// Display name at the time of adding.
    pub name: String,
    /// Image reference at the time of adding.
    pub image_url: String,
    /// Unit price snapshot.
    pub price: Decimal,
    /// Quantity, always >= 1 once stored.
    pub quantity: u32,
}

impl CartItem {
    /// Line total (unit price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Ordered cart contents keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLines(Vec<CartItem>);

impl CartLines {
    /// Creates an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds cart lines from an arbitrary list, folding duplicate product
    /// ids together and dropping zero-quantity entries.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut lines = Self::new();
        for item in items {
            lines.add(item);
        }
        lines
    }

    /// Adds an item, or increases the quantity of an existing line.
    ///
    /// A zero quantity is a no-op. The snapshot fields of an existing line
    /// are kept; only the quantity grows.
    pub fn add(&mut self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }
        if let Some(line) = self.find_mut(&item.product_id) {
            line.quantity = line.quantity.saturating_add(item.quantity);
            return;
        }
        self.0.push(item);
    }

    /// Sets the quantity of a line. Zero or below removes it.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.find_mut(product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes a line by product id. Returns `false` if it was not present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.0.len();
        self.0.retain(|line| &line.product_id != product_id);
        self.0.len() != before
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Folds another cart into this one, summing quantities per product.
    pub fn merge_from(&mut self, other: Self) {
        for item in other {
            self.add(item);
        }
    }

    /// Looks up a line by product id.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.0.iter().find(|line| &line.product_id == product_id)
    }

    fn find_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.0.iter_mut().find(|line| &line.product_id == product_id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all quantities (the badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.0.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.0.iter().map(CartItem::line_total).sum()
    }

    /// Iterates lines in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.0.iter()
    }

    /// Borrow the lines as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[CartItem] {
        &self.0
    }

    /// Consume into the underlying list.
    #[must_use]
    pub fn into_vec(self) -> Vec<CartItem> {
        self.0
    }
}

impl<'a> IntoIterator for &'a CartLines {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for CartLines {
    type Item = CartItem;
    type IntoIter = std::vec::IntoIter<CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Rug {id}"),
            image_url: format!("https://cdn.example.com/{id}.jpg"),
            price: Decimal::from(price),
            quantity,
        }
    }

    #[test]
    fn test_add_same_product_sums_quantity() {
        let mut cart = CartLines::new();
        cart.add(item("p1", 10, 1));
        cart.add(item("p1", 10, 2));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&ProductId::new("p1")).map(|l| l.quantity), Some(3));
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = CartLines::new();
        cart.add(item("p1", 10, 1));
        cart.add(item("p1", 10, 2));
        assert!(cart.set_quantity(&ProductId::new("p1"), 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_from_sums_overlap() {
        let mut cart = CartLines::from_items([item("p1", 10, 1), item("p2", 5, 1)]);
        cart.merge_from(CartLines::from_items([item("p2", 5, 2), item("p3", 7, 1)]));
        assert_eq!(cart.len(), 3);
        assert_eq!(cart.get(&ProductId::new("p2")).map(|l| l.quantity), Some(3));
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_negative_quantity_removes_line() {
        let mut cart = CartLines::from_items([item("p1", 10, 4)]);
        assert!(cart.set_quantity(&ProductId::new("p1"), -3));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_product() {
        let mut cart = CartLines::new();
        assert!(!cart.set_quantity(&ProductId::new("nope"), 2));
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = CartLines::new();
        cart.add(item("p1", 10, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_price_kept_on_merge() {
        let mut cart = CartLines::new();
        cart.add(item("p1", 10, 1));
        cart.add(item("p1", 99, 1));
        assert_eq!(
            cart.get(&ProductId::new("p1")).map(|l| l.price),
            Some(Decimal::from(10))
        );
    }

    #[test]
    fn test_totals() {
        let cart = CartLines::from_items([item("p1", 2499, 2), item("p2", 1000, 1)]);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.subtotal(), Decimal::from(5998));
    }

    #[test]
    fn test_from_items_folds_duplicates() {
        let cart = CartLines::from_items([item("p1", 10, 1), item("p2", 5, 1), item("p1", 10, 4)]);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_quantity(), 6);
    }
}
