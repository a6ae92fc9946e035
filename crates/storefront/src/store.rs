//! Observable in-memory state.
//!
//! Each [`Store`] wraps a `tokio::sync::watch` channel: the owning service
//! writes, everyone else reads snapshots or subscribes for changes.

use carpet_core::{CartLines, Pagination, Product, WishlistEntries};
use tokio::sync::watch;

use crate::api::types::UserProfile;
use crate::session::BackendSession;

/// A single-writer, many-reader state holder.
#[derive(Debug)]
pub struct Store<T> {
    tx: watch::Sender<T>,
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Store<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the state and notify subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate the state in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Subscribe to changes. The receiver starts with the current value
    /// marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Borrow the current value. Keep the guard short-lived.
    #[must_use]
    pub fn borrow(&self) -> watch::Ref<'_, T> {
        self.tx.borrow()
    }
}

impl<T: Clone> Store<T> {
    /// Clone of the current value.
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.tx.borrow().clone()
    }
}

// =============================================================================
// State shapes
// =============================================================================

/// Cart lines and whether a fetch is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub items: CartLines,
    pub is_loading: bool,
}

/// Wishlist entries and whether a fetch is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistState {
    pub items: WishlistEntries,
    pub is_loading: bool,
}

/// Last product listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductState {
    pub products: Vec<Product>,
    pub pagination: Option<Pagination>,
    pub is_loading: bool,
}

/// Authentication progress and backend-session details.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub is_loading: bool,
    pub error: Option<String>,
    /// Address a one-time code was last sent to.
    pub email_sent_to: Option<String>,
    pub backend_session: Option<BackendSession>,
    pub user_profile: Option<UserProfile>,
    pub profile_loading: bool,
}
