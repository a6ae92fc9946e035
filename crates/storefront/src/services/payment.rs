//! Hosted-checkout payments.
//!
//! The server opens an order with the payment provider, the provider's
//! widget collects the payment, and the server verifies the signature the
//! widget hands back. The widget itself sits behind [`HostedCheckout`].

use async_trait::async_trait;
use carpet_core::{CartLines, CurrencyCode, Email, OrderItem, ShippingDetails, UserId};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::types::{
    CreatePaymentOrder, PaymentConfirmation, PaymentCustomer, PaymentLine, PaymentOrder,
    PaymentVerification,
};
use crate::api::{ApiClient, ApiError};

/// The provider's payment widget.
#[async_trait]
pub trait HostedCheckout: Send + Sync {
    /// Present the widget for `order`. Returns `None` if the shopper
    /// dismissed it without paying.
    async fn collect(
        &self,
        order: &PaymentOrder,
        key_id: Option<&str>,
    ) -> Option<PaymentConfirmation>;
}

/// An opened order and the publishable key for the widget.
#[derive(Debug, Clone)]
pub struct OpenedOrder {
    pub order: PaymentOrder,
    pub key_id: Option<String>,
}

/// Order creation and payment verification.
#[derive(Clone)]
pub struct PaymentService {
    api: ApiClient,
    currency: CurrencyCode,
}

impl PaymentService {
    #[must_use]
    pub const fn new(api: ApiClient, currency: CurrencyCode) -> Self {
        Self { api, currency }
    }

    /// Build the order request for a cart. The amount is left to the server.
    #[must_use]
    pub fn order_request(
        &self,
        user_id: Option<&UserId>,
        cart: &CartLines,
        customer_name: &str,
        email: &Email,
        phone: &str,
        shipping: &ShippingDetails,
    ) -> CreatePaymentOrder {
        let phone = phone.trim();
        CreatePaymentOrder {
            user_id: user_id.map(ToString::to_string),
            currency: self.currency.code().to_owned(),
            receipt: format!("rcpt_{}", Uuid::new_v4().simple()),
            customer: Some(PaymentCustomer {
                name: customer_name.to_owned(),
                email: email.as_str().to_owned(),
                phone: (!phone.is_empty()).then(|| phone.to_owned()),
            }),
            shipping: Some(shipping.clone()),
            items: cart
                .iter()
                .map(|line| PaymentLine::from(&OrderItem::from(line)))
                .collect(),
        }
    }

    /// Open an order with the provider.
    ///
    /// # Errors
    ///
    /// Fails unless the server reports success and returns an order id.
    #[instrument(skip(self, request), fields(receipt = %request.receipt))]
    pub async fn create_order(&self, request: &CreatePaymentOrder) -> Result<OpenedOrder, ApiError> {
        let (order, key_id) = self.api.create_payment_order(request).await?;
        info!(order_id = %order.order_id, "Payment order opened");
        Ok(OpenedOrder { order, key_id })
    }

    /// Verify a completed payment.
    ///
    /// # Errors
    ///
    /// Fails unless the server reports success.
    #[instrument(skip(self, confirmation), fields(order_id = %confirmation.order_id))]
    pub async fn verify(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<PaymentVerification, ApiError> {
        self.api.verify_payment(confirmation).await
    }
}
