//! Order placement from the current cart.
//!
//! Two flows:
//!
//! - [`CheckoutService::place_order`] records the order on the device and
//!   clears the cart. No payment is taken.
//! - [`CheckoutService::place_paid_order`] opens a hosted-checkout order,
//!   collects the payment through the widget, and only records the order
//!   and clears the cart once the server has verified the payment.

use std::sync::Arc;

use carpet_core::{
    CartLines, ContactDetails, Email, OrderStatus, SavedOrder, ShippingDetails, ValidationError,
    random_id,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::ApiError;
use crate::error::add_breadcrumb;
use crate::profile::OrderHistory;
use crate::services::cart::CartService;
use crate::services::payment::{HostedCheckout, PaymentService};
use crate::session::SessionUser;
use crate::storage::{KeyValueStore, StorageError};

/// Checkout failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Form input or cart contents were rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Paid checkout needs a signed-in user.
    #[error("Please sign in to pay online")]
    NotSignedIn,

    /// The shopper closed the payment widget without paying.
    #[error("Payment was cancelled")]
    PaymentCancelled,

    /// Order creation or payment verification failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The order could not be recorded.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Places orders for the current cart.
pub struct CheckoutService {
    storage: Arc<dyn KeyValueStore>,
    payment: PaymentService,
}

impl CheckoutService {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, payment: PaymentService) -> Self {
        Self { storage, payment }
    }

    /// Record an order for the cart without taking payment.
    ///
    /// The order is kept in the signed-in user's history; anonymous
    /// orders are not recorded. The cart is cleared either way.
    ///
    /// # Errors
    ///
    /// Fails on invalid contact or shipping details, an empty cart, or if
    /// the order cannot be written. A cart that cannot be cleared afterwards
    /// is logged and does not fail the order.
    #[instrument(skip_all, fields(uid = user.map(|u| u.uid.as_str())))]
    pub async fn place_order(
        &self,
        cart: &CartService,
        user: Option<&SessionUser>,
        contact: &ContactDetails,
        shipping: &ShippingDetails,
    ) -> Result<SavedOrder, CheckoutError> {
        let (_, lines) = validate(cart, contact, shipping)?;

        let order = SavedOrder::from_cart(random_id(), &lines, OrderStatus::Confirmed);
        if let Some(user) = user {
            OrderHistory::new(self.storage.clone(), user.uid.clone()).record(&order)?;
        }
        self.finish(cart, &order).await;
        Ok(order)
    }

    /// Take payment through the hosted checkout, then record the order.
    ///
    /// Nothing is recorded and the cart is untouched unless the server
    /// verifies the payment.
    ///
    /// # Errors
    ///
    /// Fails on invalid input or an empty cart, when no user is signed in,
    /// when the order cannot be opened, when the widget is dismissed, or
    /// when verification fails.
    #[instrument(skip_all, fields(uid = user.map(|u| u.uid.as_str())))]
    pub async fn place_paid_order(
        &self,
        cart: &CartService,
        user: Option<&SessionUser>,
        contact: &ContactDetails,
        shipping: &ShippingDetails,
        widget: &dyn HostedCheckout,
    ) -> Result<SavedOrder, CheckoutError> {
        let (email, lines) = validate(cart, contact, shipping)?;
        let user = user.ok_or(CheckoutError::NotSignedIn)?;

        let request = self.payment.order_request(
            Some(&user.uid),
            &lines,
            &shipping.full_name,
            &email,
            &contact.phone,
            shipping,
        );
        let opened = self.payment.create_order(&request).await?;

        let Some(confirmation) = widget
            .collect(&opened.order, opened.key_id.as_deref())
            .await
        else {
            info!(order_id = %opened.order.order_id, "Payment widget dismissed");
            return Err(CheckoutError::PaymentCancelled);
        };

        let verification = self.payment.verify(&confirmation).await?;

        let mut order = SavedOrder::from_cart(random_id(), &lines, OrderStatus::Paid);
        order.payment_id = verification.payment_id.or(Some(confirmation.payment_id));
        OrderHistory::new(self.storage.clone(), user.uid.clone()).record(&order)?;
        self.finish(cart, &order).await;
        Ok(order)
    }

    async fn finish(&self, cart: &CartService, order: &SavedOrder) {
        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_id", order.id.as_str())]),
        );
        info!(
            order_id = %order.id,
            status = %order.status,
            items = order.item_count(),
            "Order placed"
        );
        if let Err(e) = cart.clear().await {
            warn!(order_id = %order.id, "Order recorded but the cart was not cleared");
            e.report("Failed to clear cart after checkout");
        }
    }
}

fn validate(
    cart: &CartService,
    contact: &ContactDetails,
    shipping: &ShippingDetails,
) -> Result<(Email, CartLines), ValidationError> {
    let email = contact.validate()?;
    shipping.validate()?;
    let lines = cart.items();
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    Ok((email, lines))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::api::types::{PaymentConfirmation, PaymentOrder};
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use carpet_core::{CartItem, CurrencyCode, ProductId, UserId};
    use rust_decimal::Decimal;

    struct Fixture {
        storage: Arc<dyn KeyValueStore>,
        cart: CartService,
        checkout: CheckoutService,
    }

    fn fixture() -> Fixture {
        let config = StorefrontConfig::for_api("http://127.0.0.1:9/api/v1").unwrap();
        let api = ApiClient::new(&config).unwrap();
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        Fixture {
            cart: CartService::new(api.clone(), storage.clone()),
            checkout: CheckoutService::new(
                storage.clone(),
                PaymentService::new(api, CurrencyCode::INR),
            ),
            storage,
        }
    }

    fn contact() -> ContactDetails {
        ContactDetails {
            email: "meera@example.com".into(),
            phone: String::new(),
        }
    }

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Meera Iyer".into(),
            address: "9 Cathedral Road".into(),
            address2: String::new(),
            city: "Chennai".into(),
            state: "Tamil Nadu".into(),
            zip: "600086".into(),
            country: "India".into(),
        }
    }

    fn user() -> SessionUser {
        SessionUser {
            uid: UserId::new("u1"),
            email: Some("meera@example.com".into()),
            display_name: None,
            photo_url: None,
        }
    }

    async fn fill(cart: &CartService) {
        cart.add(CartItem {
            product_id: ProductId::new("p1"),
            name: "Persian wool".into(),
            image_url: String::new(),
            price: Decimal::from(10),
            quantity: 3,
        })
        .await
        .unwrap();
    }

    struct NeverPays;

    #[async_trait]
    impl HostedCheckout for NeverPays {
        async fn collect(&self, _: &PaymentOrder, _: Option<&str>) -> Option<PaymentConfirmation> {
            None
        }
    }

    #[tokio::test]
    async fn test_place_order_records_and_clears_cart() {
        let f = fixture();
        fill(&f.cart).await;

        let order = f
            .checkout
            .place_order(&f.cart, Some(&user()), &contact(), &shipping())
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.subtotal, Decimal::from(30));
        assert!(f.cart.items().is_empty());

        let history = OrderHistory::new(f.storage.clone(), UserId::new("u1")).list();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, order.id);
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_cart() {
        let f = fixture();
        let err = f
            .checkout
            .place_order(&f.cart, None, &contact(), &shipping())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_place_order_rejects_missing_city() {
        let f = fixture();
        fill(&f.cart).await;
        let mut shipping = shipping();
        shipping.city = "  ".into();

        let err = f
            .checkout
            .place_order(&f.cart, None, &contact(), &shipping)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::Required("city"))
        ));
        assert_eq!(f.cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_paid_order_requires_user() {
        let f = fixture();
        fill(&f.cart).await;
        let err = f
            .checkout
            .place_paid_order(&f.cart, None, &contact(), &shipping(), &NeverPays)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NotSignedIn));
        assert_eq!(f.cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_paid_order_without_token_leaves_cart() {
        let f = fixture();
        fill(&f.cart).await;
        let err = f
            .checkout
            .place_paid_order(&f.cart, Some(&user()), &contact(), &shipping(), &NeverPays)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Api(ApiError::MissingToken)));
        assert_eq!(f.cart.items().len(), 1);
        assert!(
            OrderHistory::new(f.storage.clone(), UserId::new("u1"))
                .list()
                .is_empty()
        );
    }
}
