//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod checkout;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod profile;
pub mod status;
pub mod wishlist;

pub use address::{AddressPatch, Coordinates, NewAddress, SavedAddress};
pub use cart::{CartItem, CartLines};
pub use checkout::{ContactDetails, ShippingDetails, SignUpForm, ValidationError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{OrderItem, SavedOrder};
pub use price::{CurrencyCode, Price};
pub use product::{Pagination, Product};
pub use profile::{SavedPaymentMethod, Settings};
pub use status::*;
pub use wishlist::{WishlistEntries, WishlistItem};
