//! Storage key names.
//!
//! The token, recently viewed and profile keys use the names the web
//! storefront writes, so data exported from a browser reads back as-is.

use carpet_core::UserId;

/// Backend session token.
pub const TOKEN: &str = "token";
/// Anonymous cart lines.
pub const CART: &str = "cart";
/// Anonymous wishlist entries.
pub const WISHLIST: &str = "wishlist";
/// Recently viewed product ids.
pub const RECENTLY_VIEWED: &str = "carpet-recently-viewed";
/// Saved payment methods (device-wide).
pub const PAYMENT_METHODS: &str = "profile_payment_methods";
/// User preferences (device-wide).
pub const SETTINGS: &str = "profile_settings";

/// Saved addresses for a user.
#[must_use]
pub fn addresses(uid: &UserId) -> String {
    format!("profile_addresses_{uid}")
}

/// Single-address format written by older builds.
#[must_use]
pub fn legacy_address(uid: &UserId) -> String {
    format!("profile_address_{uid}")
}

/// Order history for a user.
#[must_use]
pub fn orders(uid: &UserId) -> String {
    format!("profile_orders_{uid}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_user_keys() {
        let uid = UserId::new("backend-a@b.co");
        assert_eq!(addresses(&uid), "profile_addresses_backend-a@b.co");
        assert_eq!(legacy_address(&uid), "profile_address_backend-a@b.co");
        assert_eq!(orders(&uid), "profile_orders_backend-a@b.co");
    }

    #[test]
    fn test_shared_key_names() {
        assert_eq!(TOKEN, "token");
        assert_eq!(RECENTLY_VIEWED, "carpet-recently-viewed");
        assert_eq!(SETTINGS, "profile_settings");
        assert_eq!(PAYMENT_METHODS, "profile_payment_methods");
    }
}
