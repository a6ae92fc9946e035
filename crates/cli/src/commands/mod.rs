//! Subcommand implementations.

pub mod addresses;
pub mod auth;
pub mod cards;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod profile;
pub mod settings;
pub mod wishlist;

use carpet_storefront::Storefront;
use carpet_storefront::StorefrontError;
use carpet_storefront::profile::{AddressBook, OrderHistory};
use carpet_storefront::services::checkout::CheckoutError;
use carpet_storefront::storage::StorageError;
use thiserror::Error;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Sign in first: carpet auth send-otp <email>")]
    NotSignedIn,

    #[error("{0}")]
    NotFound(String),
}

fn address_book(storefront: &Storefront) -> Result<AddressBook, CliError> {
    storefront.addresses().ok_or(CliError::NotSignedIn)
}

fn order_history(storefront: &Storefront) -> Result<OrderHistory, CliError> {
    storefront.orders().ok_or(CliError::NotSignedIn)
}
