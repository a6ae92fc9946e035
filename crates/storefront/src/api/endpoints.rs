//! REST endpoint paths, relative to the configured base URL.

use carpet_core::ProductId;

pub const PRODUCTS: &str = "/products";
pub const SEND_EMAIL_OTP: &str = "/auth/send-email-otp";
pub const VERIFY_EMAIL_OTP: &str = "/auth/verify-email-otp";
pub const USER_PROFILE: &str = "/users/profile";

pub const CART: &str = "/cart";
pub const CART_ADD: &str = "/cart/add";
pub const CART_UPDATE: &str = "/cart/update";
pub const CART_CLEAR: &str = "/cart/clear";

pub const WISHLIST: &str = "/wishlist";
pub const WISHLIST_ADD: &str = "/wishlist/add";
pub const WISHLIST_TOGGLE: &str = "/wishlist/toggle";

pub const PAYMENT_CREATE_ORDER: &str = "/payment/create-order";
pub const PAYMENT_VERIFY: &str = "/payment/verify";

/// `/products/{id}`
#[must_use]
pub fn product(id: &ProductId) -> String {
    format!("{PRODUCTS}/{}", urlencoding::encode(id.as_str()))
}

/// `/cart/item/{productId}`
#[must_use]
pub fn cart_item(id: &ProductId) -> String {
    format!("{CART}/item/{}", urlencoding::encode(id.as_str()))
}

/// `/wishlist/item/{productId}`
#[must_use]
pub fn wishlist_item(id: &ProductId) -> String {
    format!("{WISHLIST}/item/{}", urlencoding::encode(id.as_str()))
}
