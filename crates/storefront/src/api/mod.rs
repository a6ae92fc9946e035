//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - One shared `reqwest::Client` behind an `Arc`, so [`ApiClient`] clones
//!   are cheap and share connections
//! - Authenticated calls carry the session token in a `token` header and as
//!   a bearer credential; a call without a token fails before any I/O
//! - Error bodies are normalized to a single message string
//! - Product reads are cached in memory via `moka`
//!
//! # Example
//!
//! ```rust,ignore
//! use carpet_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config)?;
//! let page = client.list_products(&ProductQuery::default()).await?;
//!
//! client.set_token(token);
//! let cart = client.get_cart().await?;
//! ```

mod cache;
pub mod endpoints;
pub mod types;

use std::sync::{Arc, PoisonError, RwLock};

use carpet_core::{Product, ProductId};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::StorefrontConfig;

use cache::{CacheKey, CacheValue};
use types::{
    Ack, CartLineRequest, CreatePaymentOrder, CreatePaymentOrderResponse, LinesResponse,
    OtpResponse, PaymentConfirmation, PaymentOrder, PaymentVerification, ProductDetailResponse,
    ProductListResponse, ProductPage, ProductQuery, ProfileResponse, ProfileUpdate,
    SendOtpRequest, UserProfile, VerifyOtpRequest, WishlistRequest,
};

/// Message used when an error body carries nothing usable.
pub const NO_RESPONSE_MESSAGE: &str = "No response from server";

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response (DNS, connect, timeout, TLS).
    #[error("No response received from the server")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),

    /// An authenticated call was attempted without a session token.
    #[error("No auth token found")]
    MissingToken,

    /// The server answered `success: false`.
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// HTTP status for server-reported failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server refused the session token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingToken | Self::Server { status: 401, .. })
    }
}

/// Extract a human-readable message from an error response body.
///
/// Prefers a string `error` field, then `msg`, then `message`.
#[must_use]
pub fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return NO_RESPONSE_MESSAGE.to_string();
    };
    ["error", "msg", "message"]
        .into_iter()
        .find_map(|key| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .map_or_else(|| NO_RESPONSE_MESSAGE.to_string(), str::to_string)
}

fn truncated(body: &str) -> String {
    body.chars().take(500).collect()
}

fn rejected(message: Option<String>, fallback: &str) -> ApiError {
    ApiError::Rejected(
        message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    )
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<SecretString>>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("carpet-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                token: RwLock::new(None),
                cache,
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Attach a session token to subsequent authenticated calls.
    pub fn set_token(&self, token: SecretString) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Forget the session token.
    pub fn clear_token(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a session token is attached.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    fn token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        self.inner.client.request(method, url)
    }

    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.token().ok_or(ApiError::MissingToken)?;
        Ok(self
            .request(method, path)
            .header("token", token.expose_secret())
            .bearer_auth(token.expose_secret()))
    }

    /// Send a request and decode the JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::warn!(
                status = %status,
                body = %truncated(&body),
                "API returned non-success status"
            );
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body = if body.trim().is_empty() { "{}" } else { &body };
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncated(body),
                "Failed to parse API response"
            );
            ApiError::Decode(e)
        })
    }

    async fn send_json<B, T>(&self, request: RequestBuilder, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(request.json(body)).await
    }

    /// Drop every cached product read.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products matching a query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let cache_key = CacheKey::Products(serde_json::to_string(query)?);

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(*page);
        }

        let response: ProductListResponse = self
            .execute(self.request(Method::GET, endpoints::PRODUCTS).query(query))
            .await?;
        if !response.success {
            return Err(rejected(response.message, "Failed to load products"));
        }
        let page = response.data.unwrap_or_default();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Box::new(page.clone())))
            .await;

        Ok(page)
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the product is missing.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let response: ProductDetailResponse = self
            .execute(self.request(Method::GET, &endpoints::product(id)))
            .await?;
        let product = match response {
            ProductDetailResponse {
                success: true,
                product: Some(product),
                ..
            } => product,
            ProductDetailResponse { message, .. } => {
                return Err(rejected(message, "Product not found"));
            }
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Ask the backend to email a one-time code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, email))]
    pub async fn send_email_otp(&self, email: &str) -> Result<OtpResponse, ApiError> {
        self.send_json(
            self.request(Method::POST, endpoints::SEND_EMAIL_OTP),
            &SendOtpRequest { email },
        )
        .await
    }

    /// Exchange an emailed code for a session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, email, otp))]
    pub async fn verify_email_otp(&self, email: &str, otp: &str) -> Result<OtpResponse, ApiError> {
        self.send_json(
            self.request(Method::POST, endpoints::VERIFY_EMAIL_OTP),
            &VerifyOtpRequest { email, otp },
        )
        .await
    }

    /// Fetch the signed-in user's profile. `None` if the server has none.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<Option<UserProfile>, ApiError> {
        let response: ProfileResponse = self
            .execute(self.authorized(Method::GET, endpoints::USER_PROFILE)?)
            .await?;
        Ok(response.success.then_some(response.user).flatten())
    }

    /// Update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, ApiError> {
        let response: ProfileResponse = self
            .send_json(self.authorized(Method::PUT, endpoints::USER_PROFILE)?, update)
            .await?;
        Ok(response.success.then_some(response.user).flatten())
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Fetch the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<LinesResponse, ApiError> {
        self.execute(self.authorized(Method::GET, endpoints::CART)?)
            .await
    }

    /// Add units of a product to the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<LinesResponse, ApiError> {
        self.send_json(
            self.authorized(Method::POST, endpoints::CART_ADD)?,
            &CartLineRequest {
                product_id,
                quantity,
            },
        )
        .await
    }

    /// Set the quantity of a server cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_cart(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<LinesResponse, ApiError> {
        self.send_json(
            self.authorized(Method::POST, endpoints::CART_UPDATE)?,
            &CartLineRequest {
                product_id,
                quantity,
            },
        )
        .await
    }

    /// Remove a line from the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_cart_item(&self, product_id: &ProductId) -> Result<LinesResponse, ApiError> {
        self.execute(self.authorized(Method::DELETE, &endpoints::cart_item(product_id))?)
            .await
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set, the request fails, or the
    /// server reports failure.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        let ack: Ack = self
            .execute(self.authorized(Method::POST, endpoints::CART_CLEAR)?)
            .await?;
        if ack.success {
            Ok(())
        } else {
            Err(rejected(ack.message, "Failed to clear cart"))
        }
    }

    // =========================================================================
    // Wishlist Methods
    // =========================================================================

    /// Fetch the server wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self) -> Result<LinesResponse, ApiError> {
        self.execute(self.authorized(Method::GET, endpoints::WISHLIST)?)
            .await
    }

    /// Add a product to the server wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(&self, product_id: &ProductId) -> Result<LinesResponse, ApiError> {
        self.send_json(
            self.authorized(Method::POST, endpoints::WISHLIST_ADD)?,
            &WishlistRequest { product_id },
        )
        .await
    }

    /// Flip a product's wishlist membership on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<LinesResponse, ApiError> {
        self.send_json(
            self.authorized(Method::POST, endpoints::WISHLIST_TOGGLE)?,
            &WishlistRequest { product_id },
        )
        .await
    }

    /// Remove a product from the server wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<LinesResponse, ApiError> {
        self.execute(self.authorized(Method::DELETE, &endpoints::wishlist_item(product_id))?)
            .await
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Open a hosted-checkout order.
    ///
    /// Returns the order and the publishable key the widget should use, if
    /// the server sent one.
    ///
    /// # Errors
    ///
    /// Fails unless the server reports success and returns an order id.
    #[instrument(skip(self, order), fields(receipt = %order.receipt))]
    pub async fn create_payment_order(
        &self,
        order: &CreatePaymentOrder,
    ) -> Result<(PaymentOrder, Option<String>), ApiError> {
        let response: CreatePaymentOrderResponse = self
            .send_json(
                self.authorized(Method::POST, endpoints::PAYMENT_CREATE_ORDER)?,
                order,
            )
            .await?;
        match response {
            CreatePaymentOrderResponse {
                success: true,
                data: Some(data),
                key_id,
                ..
            } if !data.order_id.is_empty() => Ok((data, key_id)),
            CreatePaymentOrderResponse { message, .. } => {
                Err(rejected(message, "Failed to create order"))
            }
        }
    }

    /// Ask the server to verify a completed payment.
    ///
    /// # Errors
    ///
    /// Fails unless the server reports success.
    #[instrument(skip(self, confirmation), fields(order_id = %confirmation.order_id))]
    pub async fn verify_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<PaymentVerification, ApiError> {
        let response: PaymentVerification = self
            .send_json(
                self.authorized(Method::POST, endpoints::PAYMENT_VERIFY)?,
                confirmation,
            )
            .await?;
        if response.success {
            Ok(response)
        } else {
            Err(rejected(response.message, "Payment verification failed"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        // Port 9 (discard) on loopback; nothing here should reach the network.
        let config = StorefrontConfig::for_api("http://127.0.0.1:9/api/v1").unwrap();
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_error_message_prefers_string_error() {
        assert_eq!(
            error_message(r#"{"error":"Out of stock","message":"ignored"}"#),
            "Out of stock"
        );
    }

    #[test]
    fn test_error_message_skips_structured_error() {
        assert_eq!(
            error_message(r#"{"error":{"email":["invalid"]},"msg":"Bad email"}"#),
            "Bad email"
        );
        assert_eq!(error_message(r#"{"message":"Not found"}"#), "Not found");
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_message("{}"), NO_RESPONSE_MESSAGE);
        assert_eq!(error_message("<html>502</html>"), NO_RESPONSE_MESSAGE);
        assert_eq!(error_message(""), NO_RESPONSE_MESSAGE);
    }

    #[tokio::test]
    async fn test_authenticated_call_without_token_fails_fast() {
        let client = client();
        let err = client.get_cart().await.unwrap_err();
        assert!(matches!(err, ApiError::MissingToken));
        assert_eq!(err.to_string(), "No auth token found");
    }

    #[test]
    fn test_token_set_and_clear() {
        let client = client();
        assert!(!client.has_token());
        client.set_token(SecretString::from("t0k".to_string()));
        assert!(client.has_token());
        assert!(!format!("{client:?}").contains("t0k"));
        client.clear_token();
        assert!(!client.has_token());
    }

    #[test]
    fn test_unauthorized_classification() {
        assert!(ApiError::MissingToken.is_unauthorized());
        let err = ApiError::Server {
            status: 401,
            message: "expired".into(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
        assert!(!ApiError::Rejected("x".into()).is_unauthorized());
    }
}
