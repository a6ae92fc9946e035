//! Integration tests for the Carpet storefront client.
//!
//! The tests drive a real [`Storefront`](carpet_storefront::Storefront)
//! against [`MockBackend`], an in-process axum server that speaks the
//! storefront REST API on a random loopback port. No external services are
//! needed:
//!
//! ```bash
//! cargo test -p carpet-integration-tests
//! ```
//!
//! The mock keeps one cart and one wishlist for the single user whose token
//! it hands out, and exposes switches for the failure modes the client has
//! to survive: mutations that do not echo items, mutations that fail, and
//! payments that do not verify.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unused_async)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use carpet_storefront::session::identity::{IdentityProvider, NoIdentityProvider};
use carpet_storefront::storage::{KeyValueStore, MemoryStore};
use carpet_storefront::{MergePolicy, Storefront, StorefrontConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// The one-time code the mock accepts.
pub const OTP_CODE: &str = "424242";

/// The session token the mock issues and expects.
pub const TOKEN: &str = "mock-session-token";

/// The backend user id behind [`TOKEN`].
pub const USER_ID: &str = "user-1";

/// Order id returned by the payment endpoint.
pub const PAYMENT_ORDER_ID: &str = "order_mock_1";

const API_PREFIX: &str = "/api/v1";

// ============================================================================
// Mock state
// ============================================================================

/// Server-side state of the mock API.
#[derive(Debug, Default)]
pub struct MockState {
    /// Catalog, keyed by product id
    pub products: Vec<Value>,
    /// Server cart as `(product id, quantity)` in insertion order
    pub cart: Vec<(String, u32)>,
    /// Server wishlist product ids in insertion order
    pub wishlist: Vec<String>,
    /// Email the last issued token was verified for
    pub email: Option<String>,
    /// When false, cart and wishlist mutations answer without `data.items`
    pub echo_items: bool,
    /// When true, cart and wishlist mutations answer with a server error
    pub fail_mutations: bool,
    /// Product ids that cart and wishlist adds refuse
    pub rejected_products: Vec<String>,
    /// When false, payment verification rejects the signature
    pub verify_payments: bool,
    /// Last body posted to `/payment/create-order`
    pub last_order_request: Option<Value>,
    /// Request counts keyed by `"METHOD /path"`, without the API prefix
    pub hits: HashMap<String, usize>,
}

impl MockState {
    fn product(&self, id: &str) -> Option<&Value> {
        self.products.iter().find(|p| p["_id"] == id)
    }

    fn line(&self, id: &str, quantity: u32) -> Value {
        let product = self.product(id);
        json!({
            "product": id,
            "quantity": quantity,
            "priceAtAdd": product.map_or(Value::Null, |p| p["price"].clone()),
            "nameSnapshot": product.map_or(Value::Null, |p| p["name"].clone()),
        })
    }

    fn cart_body(&self) -> Value {
        let items: Vec<Value> = self
            .cart
            .iter()
            .map(|(id, quantity)| self.line(id, *quantity))
            .collect();
        json!({"success": true, "data": {"items": items}})
    }

    fn wishlist_body(&self) -> Value {
        let items: Vec<Value> = self.wishlist.iter().map(|id| self.line(id, 1)).collect();
        json!({"success": true, "data": {"items": items}})
    }

    /// Response for a successful mutation, honouring `echo_items`.
    fn mutation_body(&self, full: Value) -> Value {
        if self.echo_items {
            full
        } else {
            json!({"success": true, "message": "Updated"})
        }
    }
}

/// Sample rugs used by every test.
#[must_use]
pub fn sample_products() -> Vec<Value> {
    vec![
        json!({
            "_id": "rug-jaipur", "name": "Jaipur Hand-Knotted", "price": 24999,
            "mrp": 31999, "inStock": true, "category": "hand-knotted",
            "images": ["https://cdn.example.com/jaipur.jpg"]
        }),
        json!({
            "_id": "rug-kilim", "name": "Anatolian Kilim", "price": 8999,
            "inStock": true, "category": "flat-weave"
        }),
        json!({
            "_id": "rug-dhurrie", "name": "Cotton Dhurrie", "price": 2499,
            "inStock": false, "category": "flat-weave"
        }),
    ]
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ============================================================================
// MockBackend
// ============================================================================

/// A mock storefront API on a random loopback port.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Start the mock with the sample catalog, echoing mutations and
    /// verifying every payment.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState {
            products: sample_products(),
            echo_items: true,
            verify_payments: true,
            ..MockState::default()
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// API base URL to hand to the client.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}{API_PREFIX}", self.addr)
    }

    /// Lock the server state for inspection or fault injection.
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// How many times `"METHOD /path"` was requested.
    #[must_use]
    pub fn hits(&self, route: &str) -> usize {
        self.state().hits.get(route).copied().unwrap_or(0)
    }

    /// Total requests served so far.
    #[must_use]
    pub fn total_hits(&self) -> usize {
        self.state().hits.values().sum()
    }

    /// Forget recorded request counts.
    pub fn reset_hits(&self) {
        self.state().hits.clear();
    }

    /// Client configuration pointing at this mock.
    #[must_use]
    pub fn config(&self, merge_policy: MergePolicy) -> StorefrontConfig {
        let mut config = StorefrontConfig::for_api(&self.base_url()).unwrap();
        config.merge_policy = merge_policy;
        config.http_timeout = Duration::from_secs(5);
        config.redirect_timeout = Duration::from_millis(200);
        config
    }

    /// A storefront over the given storage with no identity provider.
    #[must_use]
    pub fn storefront(&self, storage: Arc<dyn KeyValueStore>) -> Storefront {
        self.storefront_with(storage, Arc::new(NoIdentityProvider), MergePolicy::Merge)
    }

    /// A storefront with full control over its collaborators.
    #[must_use]
    pub fn storefront_with(
        &self,
        storage: Arc<dyn KeyValueStore>,
        identity: Arc<dyn IdentityProvider>,
        merge_policy: MergePolicy,
    ) -> Storefront {
        Storefront::new(self.config(merge_policy), storage, identity).unwrap()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Fresh in-memory storage.
#[must_use]
pub fn memory_storage() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

/// Sign a storefront in through the mock's email code flow.
pub async fn sign_in(storefront: &Storefront, email: &str) {
    storefront.send_email_otp(email).await.unwrap();
    storefront.verify_email_otp(email, OTP_CODE).await.unwrap();
}

// ============================================================================
// Routes
// ============================================================================

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/auth/send-email-otp", post(send_otp))
        .route("/auth/verify-email-otp", post(verify_otp))
        .route("/users/profile", get(get_profile))
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update", post(update_cart))
        .route("/cart/item/{id}", delete(remove_cart_item))
        .route("/cart/clear", post(clear_cart))
        .route("/wishlist", get(get_wishlist))
        .route("/wishlist/add", post(add_to_wishlist))
        .route("/wishlist/toggle", post(toggle_wishlist))
        .route("/wishlist/item/{id}", delete(remove_wishlist_item))
        .route("/payment/create-order", post(create_order))
        .route("/payment/verify", post(verify_payment));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(middleware::from_fn_with_state(state.clone(), record_hit))
        .with_state(state)
}

async fn record_hit(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let route = format!(
        "{} {}",
        request.method(),
        path.strip_prefix(API_PREFIX).unwrap_or(path)
    );
    *lock(&state).hits.entry(route).or_default() += 1;
    next.run(request).await
}

type Reply = (StatusCode, Json<Value>);

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

fn unauthorized() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": "Not authorized, token missing"})),
    )
}

fn mutation_failed() -> Reply {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"success": false, "error": "Inventory service unavailable"})),
    )
}

fn product_rejected() -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": "Product is no longer available"})),
    )
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("token").and_then(|v| v.to_str().ok()) == Some(TOKEN)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineBody {
    product_id: String,
    #[serde(default)]
    quantity: Option<u32>,
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
    #[serde(default)]
    otp: Option<String>,
}

async fn list_products(State(state): State<Shared>) -> Reply {
    let state = lock(&state);
    let total = state.products.len();
    ok(json!({
        "success": true,
        "data": {
            "products": state.products,
            "pagination": {"page": 1, "limit": 12, "total": total, "pages": 1}
        }
    }))
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    match lock(&state).product(&id) {
        Some(product) => ok(json!({"success": true, "product": product})),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Product not found"})),
        ),
    }
}

async fn send_otp(Json(body): Json<EmailBody>) -> Reply {
    if body.email.contains('@') {
        ok(json!({"success": true, "message": "OTP sent"}))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Invalid email"})),
        )
    }
}

async fn verify_otp(State(state): State<Shared>, Json(body): Json<EmailBody>) -> Reply {
    if body.otp.as_deref() != Some(OTP_CODE) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Invalid or expired OTP"})),
        );
    }
    lock(&state).email = Some(body.email);
    ok(json!({"success": true, "message": "Verified", "token": TOKEN}))
}

async fn get_profile(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let email = lock(&state)
        .email
        .clone()
        .unwrap_or_else(|| "returning@example.com".to_owned());
    ok(json!({
        "success": true,
        "user": {"_id": USER_ID, "email": email, "isVerified": true}
    }))
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    ok(lock(&state).cart_body())
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<LineBody>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = lock(&state);
    if state.fail_mutations {
        return mutation_failed();
    }
    if state.rejected_products.contains(&body.product_id) {
        return product_rejected();
    }
    let quantity = body.quantity.unwrap_or(1);
    match state.cart.iter_mut().find(|(id, _)| *id == body.product_id) {
        Some((_, existing)) => *existing += quantity,
        None => state.cart.push((body.product_id, quantity)),
    }
    let full = state.cart_body();
    ok(state.mutation_body(full))
}

async fn update_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<LineBody>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = lock(&state);
    if state.fail_mutations {
        return mutation_failed();
    }
    let quantity = body.quantity.unwrap_or(1);
    if let Some((_, existing)) = state.cart.iter_mut().find(|(id, _)| *id == body.product_id) {
        *existing = quantity;
    }
    let full = state.cart_body();
    ok(state.mutation_body(full))
}

async fn remove_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = lock(&state);
    if state.fail_mutations {
        return mutation_failed();
    }
    state.cart.retain(|(line, _)| *line != id);
    let full = state.cart_body();
    ok(state.mutation_body(full))
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = lock(&state);
    if state.fail_mutations {
        return mutation_failed();
    }
    state.cart.clear();
    ok(json!({"success": true, "message": "Cart cleared"}))
}

async fn get_wishlist(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    ok(lock(&state).wishlist_body())
}

async fn add_to_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<LineBody>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = lock(&state);
    if state.fail_mutations {
        return mutation_failed();
    }
    if state.rejected_products.contains(&body.product_id) {
        return product_rejected();
    }
    if !state.wishlist.contains(&body.product_id) {
        state.wishlist.push(body.product_id);
    }
    let full = state.wishlist_body();
    ok(state.mutation_body(full))
}

async fn toggle_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<LineBody>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = lock(&state);
    if state.fail_mutations {
        return mutation_failed();
    }
    if state.wishlist.contains(&body.product_id) {
        state.wishlist.retain(|id| *id != body.product_id);
    } else {
        state.wishlist.push(body.product_id);
    }
    let full = state.wishlist_body();
    ok(state.mutation_body(full))
}

async fn remove_wishlist_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = lock(&state);
    if state.fail_mutations {
        return mutation_failed();
    }
    state.wishlist.retain(|line| *line != id);
    let full = state.wishlist_body();
    ok(state.mutation_body(full))
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let currency = body["currency"].clone();
    let receipt = body["receipt"].clone();
    lock(&state).last_order_request = Some(body);
    ok(json!({
        "success": true,
        "data": {
            "order_id": PAYMENT_ORDER_ID,
            "currency": currency,
            "receipt": receipt,
            "status": "created"
        },
        "keyId": "rzp_test_mock"
    }))
}

async fn verify_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    if !lock(&state).verify_payments {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Invalid payment signature"})),
        );
    }
    ok(json!({
        "success": true,
        "message": "Payment verified",
        "orderId": body["razorpay_order_id"],
        "paymentId": body["razorpay_payment_id"]
    }))
}
