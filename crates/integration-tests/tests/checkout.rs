//! Order placement: direct orders and hosted-checkout payments.

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use std::sync::Mutex;

use async_trait::async_trait;
use carpet_core::{ContactDetails, OrderStatus, ProductId, ShippingDetails, ValidationError};
use carpet_integration_tests::{MockBackend, PAYMENT_ORDER_ID, memory_storage, sign_in};
use carpet_storefront::Storefront;
use carpet_storefront::api::ApiError;
use carpet_storefront::api::types::{PaymentConfirmation, PaymentOrder};
use carpet_storefront::services::checkout::CheckoutError;
use carpet_storefront::services::payment::HostedCheckout;
use carpet_storefront::storage::keys;
use rust_decimal::Decimal;

const EMAIL: &str = "devika@example.com";

fn contact() -> ContactDetails {
    ContactDetails {
        email: EMAIL.into(),
        phone: "+91 98765 43210".into(),
    }
}

fn shipping() -> ShippingDetails {
    ShippingDetails {
        full_name: "Devika Menon".into(),
        address: "12 Marine Drive".into(),
        address2: "Flat 4B".into(),
        city: "Kochi".into(),
        state: "Kerala".into(),
        zip: "682031".into(),
        country: "India".into(),
    }
}

async fn fill_cart(storefront: &Storefront) {
    let jaipur = storefront
        .products()
        .get(&ProductId::new("rug-jaipur"))
        .await
        .unwrap();
    let kilim = storefront
        .products()
        .get(&ProductId::new("rug-kilim"))
        .await
        .unwrap();
    storefront.cart().add_product(&jaipur, 1).await.unwrap();
    storefront.cart().add_product(&kilim, 2).await.unwrap();
}

async fn signed_in(backend: &MockBackend) -> Storefront {
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();
    sign_in(&storefront, EMAIL).await;
    storefront
}

/// Widget that either pays or is dismissed, remembering what it was shown.
struct Widget {
    pays: bool,
    shown: Mutex<Option<(String, Option<String>)>>,
}

impl Widget {
    const fn new(pays: bool) -> Self {
        Self {
            pays,
            shown: Mutex::new(None),
        }
    }
}

#[async_trait]
impl HostedCheckout for Widget {
    async fn collect(
        &self,
        order: &PaymentOrder,
        key_id: Option<&str>,
    ) -> Option<PaymentConfirmation> {
        *self.shown.lock().unwrap() = Some((order.order_id.clone(), key_id.map(str::to_owned)));
        self.pays.then(|| PaymentConfirmation {
            order_id: order.order_id.clone(),
            payment_id: "pay_mock_1".into(),
            signature: "mock-signature".into(),
        })
    }
}

// ============================================================================
// Direct orders
// ============================================================================

#[tokio::test]
async fn test_signed_in_order_is_recorded_and_server_cart_cleared() {
    let backend = MockBackend::start().await;
    let storefront = signed_in(&backend).await;
    fill_cart(&storefront).await;

    let order = storefront.place_order(&contact(), &shipping()).await.unwrap();

    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.subtotal, Decimal::from(24999 + 2 * 8999));
    assert_eq!(order.payment_id, None);

    let history = storefront.orders().unwrap().list();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, order.id);

    assert_eq!(backend.hits("POST /cart/clear"), 1);
    assert!(backend.state().cart.is_empty());
    assert!(storefront.cart().items().is_empty());
}

#[tokio::test]
async fn test_anonymous_order_clears_local_cart_without_history() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();
    let storefront = backend.storefront(storage.clone());
    storefront.initialize().await.unwrap();
    fill_cart(&storefront).await;

    let order = storefront.place_order(&contact(), &shipping()).await.unwrap();

    assert_eq!(order.items.len(), 2);
    assert!(storefront.orders().is_none());
    assert!(storefront.cart().items().is_empty());
    assert_eq!(storage.get(keys::CART).unwrap(), None);
    assert_eq!(backend.hits("POST /cart/clear"), 0);
}

#[tokio::test]
async fn test_invalid_contact_keeps_cart() {
    let backend = MockBackend::start().await;
    let storefront = signed_in(&backend).await;
    fill_cart(&storefront).await;

    let mut contact = contact();
    contact.email = "devika.example.com".into();
    let err = storefront
        .place_order(&contact, &shipping())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::InvalidEmail(_))
    ));
    assert_eq!(storefront.cart().items().len(), 2);
    assert!(storefront.orders().unwrap().list().is_empty());
}

// ============================================================================
// Hosted checkout
// ============================================================================

#[tokio::test]
async fn test_paid_order_is_recorded_after_verification() {
    let backend = MockBackend::start().await;
    let storefront = signed_in(&backend).await;
    fill_cart(&storefront).await;
    let widget = Widget::new(true);

    let order = storefront
        .place_paid_order(&contact(), &shipping(), &widget)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.payment_id.as_deref(), Some("pay_mock_1"));
    let (order_id, key_id) = widget.shown.lock().unwrap().clone().unwrap();
    assert_eq!(order_id, PAYMENT_ORDER_ID);
    assert_eq!(key_id.as_deref(), Some("rzp_test_mock"));

    let request = backend.state().last_order_request.clone().unwrap();
    assert_eq!(request["currency"], "INR");
    assert_eq!(request["customer"]["email"], EMAIL);
    assert_eq!(request["items"][0]["variantId"], "rug-jaipur");
    assert_eq!(request["items"][1]["quantity"], 2);
    assert!(request["receipt"].as_str().unwrap().starts_with("rcpt_"));

    assert_eq!(backend.hits("POST /payment/verify"), 1);
    assert_eq!(storefront.orders().unwrap().list()[0].id, order.id);
    assert!(storefront.cart().items().is_empty());
}

#[tokio::test]
async fn test_failed_verification_records_nothing() {
    let backend = MockBackend::start().await;
    let storefront = signed_in(&backend).await;
    fill_cart(&storefront).await;
    backend.state().verify_payments = false;

    let err = storefront
        .place_paid_order(&contact(), &shipping(), &Widget::new(true))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Api(ApiError::Server { status: 400, .. })
    ));
    assert_eq!(err.to_string(), "Invalid payment signature");
    assert!(storefront.orders().unwrap().list().is_empty());
    assert_eq!(storefront.cart().items().len(), 2);
    assert_eq!(backend.hits("POST /cart/clear"), 0);
}

#[tokio::test]
async fn test_dismissed_widget_cancels_payment() {
    let backend = MockBackend::start().await;
    let storefront = signed_in(&backend).await;
    fill_cart(&storefront).await;

    let err = storefront
        .place_paid_order(&contact(), &shipping(), &Widget::new(false))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::PaymentCancelled));
    assert_eq!(backend.hits("POST /payment/create-order"), 1);
    assert_eq!(backend.hits("POST /payment/verify"), 0);
    assert_eq!(storefront.cart().items().len(), 2);
    assert!(storefront.orders().unwrap().list().is_empty());
    assert!(backend.state().last_order_request.is_some());
}

#[tokio::test]
async fn test_paid_order_needs_signed_in_user() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();
    fill_cart(&storefront).await;

    let err = storefront
        .place_paid_order(&contact(), &shipping(), &Widget::new(true))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::NotSignedIn));
    assert_eq!(backend.hits("POST /payment/create-order"), 0);
}
