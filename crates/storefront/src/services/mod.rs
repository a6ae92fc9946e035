//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email one-time-code login, backend session, server profile
//! - `cart` - Cart lines in local storage or on the server
//! - `wishlist` - Saved products in local storage or on the server
//! - `product` - Catalog listing, product detail, recently viewed
//! - `payment` - Hosted-checkout order creation and verification
//! - `checkout` - Order placement from the current cart
//!
//! Cart and wishlist each run against a [`SyncMode::Local`] or
//! [`SyncMode::Remote`] backend; the [`Storefront`](crate::Storefront)
//! switches them as the session changes.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod payment;
pub mod product;
pub mod wishlist;

/// Where cart or wishlist contents are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Local storage, for anonymous visitors.
    Local,
    /// The server, for signed-in users with a backend token.
    Remote,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Remote => "server",
        })
    }
}
