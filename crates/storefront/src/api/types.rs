//! Request and response bodies for the storefront REST API.
//!
//! Responses share a loose envelope: `success`, an optional `message`, and a
//! resource-specific payload. Fields the client does not use are ignored.

use carpet_core::{
    CartItem, CartLines, OrderItem, Pagination, Product, ProductId, ShippingDetails,
    WishlistEntries, WishlistItem,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

const fn default_quantity() -> u32 {
    1
}

/// Minimal envelope for responses whose payload the client ignores.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

/// Filters and paging for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// One page of the product listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductListResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ProductPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductDetailResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub product: Option<Product>,
}

// =============================================================================
// Cart and wishlist
// =============================================================================

/// Product reference on a server-side line: either a bare id or a
/// populated product document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(ProductId),
    Populated {
        #[serde(rename = "_id")]
        id: ProductId,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "finalPrice")]
        final_price: Option<Decimal>,
        #[serde(default)]
        price: Option<Decimal>,
        #[serde(default)]
        images: Vec<String>,
    },
}

impl ProductRef {
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        match self {
            Self::Id(id) | Self::Populated { id, .. } => id,
        }
    }
}

/// A cart or wishlist line as stored by the server, with snapshots taken
/// when the product was added.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerLine {
    pub product: ProductRef,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub price_at_add: Option<Decimal>,
    #[serde(default)]
    pub name_snapshot: Option<String>,
    #[serde(default)]
    pub image_snapshot: Option<String>,
}

impl ServerLine {
    /// Snapshots win; a populated product fills whatever is missing.
    fn into_parts(self) -> (ProductId, String, String, Decimal, u32) {
        let (id, name, image, price) = match self.product {
            ProductRef::Id(id) => (id, None, None, None),
            ProductRef::Populated {
                id,
                name,
                final_price,
                price,
                images,
            } => (id, name, images.into_iter().next(), final_price.or(price)),
        };
        (
            id,
            self.name_snapshot.or(name).unwrap_or_default(),
            self.image_snapshot.or(image).unwrap_or_default(),
            self.price_at_add.or(price).unwrap_or_default(),
            self.quantity,
        )
    }

    #[must_use]
    pub fn into_cart_item(self) -> CartItem {
        let (product_id, name, image_url, price, quantity) = self.into_parts();
        CartItem {
            product_id,
            name,
            image_url,
            price,
            quantity,
        }
    }

    #[must_use]
    pub fn into_wishlist_item(self) -> WishlistItem {
        let (product_id, name, image_url, price, _) = self.into_parts();
        WishlistItem {
            product_id,
            name,
            image_url,
            price,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinesData {
    #[serde(default)]
    pub items: Option<Vec<ServerLine>>,
}

/// Response to any cart or wishlist read or mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct LinesResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<LinesData>,
}

impl LinesResponse {
    /// The line list, if the server echoed one.
    #[must_use]
    pub fn into_lines(self) -> Option<Vec<ServerLine>> {
        self.data.and_then(|d| d.items)
    }

    /// Echoed lines as cart contents.
    #[must_use]
    pub fn into_cart(self) -> Option<CartLines> {
        self.into_lines()
            .map(|lines| CartLines::from_items(lines.into_iter().map(ServerLine::into_cart_item)))
    }

    /// Echoed lines as wishlist contents.
    #[must_use]
    pub fn into_wishlist(self) -> Option<WishlistEntries> {
        self.into_lines().map(|lines| {
            WishlistEntries::from_items(lines.into_iter().map(ServerLine::into_wishlist_item))
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartLineRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WishlistRequest<'a> {
    pub product_id: &'a ProductId,
}

// =============================================================================
// Auth and profile
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct SendOtpRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

/// Response to sending or verifying an email one-time code.
#[derive(Clone, Deserialize)]
pub struct OtpResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Session token, present on successful verification.
    #[serde(default)]
    pub token: Option<String>,
}

impl std::fmt::Debug for OtpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpResponse")
            .field("success", &self.success)
            .field("message", &self.message)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Postal address held on the server profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

/// Server-side user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<ProfileAddress>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields accepted by the profile update endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<ProfileAddress>,
}

impl ProfileUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none() && self.address.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

// =============================================================================
// Payment
// =============================================================================

/// Buyer contact passed along with a payment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentCustomer {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A purchased line as sent to the payment backend. Prices are JSON
/// numbers on this endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLine {
    pub variant_id: ProductId,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&OrderItem> for PaymentLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            variant_id: item.product_id.clone(),
            name: item.name.clone(),
            image_url: item.image_url.clone(),
            price: item.price,
            quantity: item.quantity,
        }
    }
}

/// Request to open a hosted-checkout order. The amount is computed
/// server-side from `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub currency: String,
    pub receipt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<PaymentCustomer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingDetails>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PaymentLine>,
}

/// Order opened with the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePaymentOrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<PaymentOrder>,
    #[serde(default)]
    pub key_id: Option<String>,
}

/// What the hosted checkout widget hands back after a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(rename = "razorpay_order_id")]
    pub order_id: String,
    #[serde(rename = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(rename = "razorpay_signature")]
    pub signature: String,
}

/// Server verdict on a payment confirmation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lines_response_maps_snapshots() {
        let response: LinesResponse = serde_json::from_value(json!({
            "success": true,
            "data": {
                "_id": "c1",
                "items": [
                    {"product": "p1", "quantity": 2, "priceAtAdd": 2499,
                     "nameSnapshot": "Jaipur Rug", "imageSnapshot": "a.jpg"},
                    {"product": {"_id": "p2", "name": "Kilim", "price": 899,
                     "images": ["k.jpg"]}, "quantity": 1}
                ]
            }
        }))
        .unwrap();

        let cart = response.into_cart().unwrap();
        assert_eq!(cart.len(), 2);
        let first = cart.get(&ProductId::new("p1")).unwrap();
        assert_eq!(first.price, Decimal::from(2499));
        assert_eq!(first.name, "Jaipur Rug");
        let second = cart.get(&ProductId::new("p2")).unwrap();
        assert_eq!(second.price, Decimal::from(899));
        assert_eq!(second.name, "Kilim");
        assert_eq!(second.image_url, "k.jpg");
    }

    #[test]
    fn test_lines_response_without_items() {
        let response: LinesResponse =
            serde_json::from_value(json!({"success": true, "message": "ok"})).unwrap();
        assert!(response.into_cart().is_none());
    }

    #[test]
    fn test_product_query_omits_unset_filters() {
        let query = ProductQuery {
            page: Some(2),
            min_price: Some(Decimal::from(1000)),
            ..ProductQuery::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value, json!({"page": 2, "minPrice": "1000"}));
    }

    #[test]
    fn test_payment_line_price_is_number() {
        let line = PaymentLine {
            variant_id: ProductId::new("p1"),
            name: "Dhurrie".into(),
            image_url: String::new(),
            price: Decimal::new(149_950, 2),
            quantity: 1,
        };
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["price"], json!(1499.5));
        assert!(value.get("imageUrl").is_none());
    }

    #[test]
    fn test_confirmation_wire_names() {
        let confirmation = PaymentConfirmation {
            order_id: "order_1".into(),
            payment_id: "pay_1".into(),
            signature: "sig".into(),
        };
        let value = serde_json::to_value(&confirmation).unwrap();
        assert_eq!(value["razorpay_order_id"], "order_1");
        assert_eq!(value["razorpay_signature"], "sig");
    }

    #[test]
    fn test_otp_response_debug_redacts_token() {
        let response: OtpResponse =
            serde_json::from_value(json!({"success": true, "token": "s3cret"})).unwrap();
        let debug = format!("{response:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("REDACTED"));
    }
}
