//! Carpet Core - Shared domain types for the storefront client.
//!
//! This crate provides the types used across the Carpet Company components:
//! - `storefront` - The client library (API client, stores, sync services)
//! - `cli` - The `carpet` command-line front-end
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no storage
//! access, no HTTP clients. Cart and wishlist invariants live here so that
//! both the local (anonymous) and remote (signed-in) backends share them.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, cart lines, wishlist entries,
//!   products, addresses, orders, and checkout validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
