use std::sync::Arc;

use carpet_core::{SavedOrder, UserId};

use crate::storage::{self, KeyValueStore, StorageError, keys};

use super::load_records;

/// A user's locally recorded orders, newest first.
pub struct OrderHistory {
    storage: Arc<dyn KeyValueStore>,
    uid: UserId,
}

impl OrderHistory {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, uid: UserId) -> Self {
        Self { storage, uid }
    }

    #[must_use]
    pub fn list(&self) -> Vec<SavedOrder> {
        load_records(self.storage.as_ref(), &keys::orders(&self.uid))
    }

    /// Prepend an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written.
    pub fn record(&self, order: &SavedOrder) -> Result<(), StorageError> {
        let mut list = self.list();
        list.insert(0, order.clone());
        storage::save(self.storage.as_ref(), &keys::orders(&self.uid), &list)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use carpet_core::{CartItem, CartLines, OrderId, OrderStatus, ProductId};
    use rust_decimal::Decimal;

    #[test]
    fn test_orders_are_newest_first_and_per_user() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let history = OrderHistory::new(store.clone(), UserId::new("u1"));
        let cart = CartLines::from_items([CartItem {
            product_id: ProductId::new("p1"),
            name: "Jute runner".into(),
            image_url: String::new(),
            price: Decimal::from(1200),
            quantity: 1,
        }]);

        for id in ["o1", "o2"] {
            let order = SavedOrder::from_cart(OrderId::new(id), &cart, OrderStatus::Confirmed);
            history.record(&order).unwrap();
        }

        let ids: Vec<_> = history.list().into_iter().map(|o| o.id.into_inner()).collect();
        assert_eq!(ids, ["o2", "o1"]);
        assert!(OrderHistory::new(store, UserId::new("u2")).list().is_empty());
    }
}
