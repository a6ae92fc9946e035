//! Carpet Company storefront client library.
//!
//! Keeps cart, wishlist, session and profile state consistent between
//! in-memory stores, a persistent key-value storage, and the remote REST
//! API. The [`Storefront`] handle wires everything together; the modules
//! are public so that front-ends can drive individual services directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod profile;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;

pub use config::{MergePolicy, StorefrontConfig};
pub use error::{ErrorKind, StorefrontError};
pub use state::Storefront;
