//! Locally recorded orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{CartItem, CartLines};
use super::id::{OrderId, ProductId};
use super::status::OrderStatus;

/// A purchased line, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "variantId")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&CartItem> for OrderItem {
    fn from(line: &CartItem) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            image_url: line.image_url.clone(),
            price: line.price,
            quantity: line.quantity,
        }
    }
}

/// An order in a user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedOrder {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    /// Payment provider reference for paid orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

impl SavedOrder {
    /// Freeze the given cart into an order record.
    #[must_use]
    pub fn from_cart(id: OrderId, cart: &CartLines, status: OrderStatus) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            items: cart.iter().map(OrderItem::from).collect(),
            subtotal: cart.subtotal(),
            status,
            payment_id: None,
        }
    }

    /// Total units in the order.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cart_freezes_lines() {
        let cart = CartLines::from_items([CartItem {
            product_id: ProductId::new("p1"),
            name: "Dhurrie".into(),
            image_url: String::new(),
            price: Decimal::from(750),
            quantity: 2,
        }]);
        let order = SavedOrder::from_cart(OrderId::new("o1"), &cart, OrderStatus::Confirmed);
        assert_eq!(order.subtotal, Decimal::from(1500));
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.items.first().map(|i| i.quantity), Some(2));
    }

    #[test]
    fn test_wire_shape_uses_variant_id() {
        let item = OrderItem {
            product_id: ProductId::new("p9"),
            name: "Kilim".into(),
            image_url: String::new(),
            price: Decimal::from(10),
            quantity: 1,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["variantId"], "p9");
    }
}
