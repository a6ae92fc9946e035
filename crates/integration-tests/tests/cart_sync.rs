//! Cart sync between local storage and the server cart.
//!
//! Anonymous shoppers keep their cart on the device. Signing in switches the
//! cart to the server and folds the anonymous lines in according to the
//! merge policy; signing out drops back to the device without a request.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use carpet_core::ProductId;
use carpet_integration_tests::{MockBackend, memory_storage, sign_in};
use carpet_storefront::services::SyncMode;
use carpet_storefront::session::identity::NoIdentityProvider;
use carpet_storefront::storage::keys;
use carpet_storefront::{ErrorKind, MergePolicy};
use rust_decimal::Decimal;

const EMAIL: &str = "ananya@example.com";

fn jaipur() -> ProductId {
    ProductId::new("rug-jaipur")
}

fn kilim() -> ProductId {
    ProductId::new("rug-kilim")
}

// ============================================================================
// Anonymous cart
// ============================================================================

#[tokio::test]
async fn test_anonymous_cart_never_touches_server_cart() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();
    let storefront = backend.storefront(storage.clone());
    storefront.initialize().await.unwrap();

    let product = storefront.products().get(&kilim()).await.unwrap();
    storefront.cart().add_product(&product, 2).await.unwrap();
    storefront.cart().add_product(&product, 1).await.unwrap();

    assert_eq!(storefront.cart().mode().await, SyncMode::Local);
    let lines = storefront.cart().items();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.get(&kilim()).unwrap().quantity, 3);
    assert_eq!(storefront.cart().subtotal(), Decimal::from(8999 * 3));

    assert_eq!(backend.hits("GET /cart"), 0);
    assert_eq!(backend.hits("POST /cart/add"), 0);
    assert!(storage.get(keys::CART).unwrap().is_some());
}

#[tokio::test]
async fn test_anonymous_cart_survives_restart() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();

    let first = backend.storefront(storage.clone());
    first.initialize().await.unwrap();
    let product = first.products().get(&jaipur()).await.unwrap();
    first.cart().add_product(&product, 1).await.unwrap();
    drop(first);

    let second = backend.storefront(storage);
    second.initialize().await.unwrap();
    let lines = second.cart().items();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.get(&jaipur()).unwrap().name, "Jaipur Hand-Knotted");
}

// ============================================================================
// Sign-in merge
// ============================================================================

#[tokio::test]
async fn test_sign_in_merges_anonymous_cart_into_server() {
    let backend = MockBackend::start().await;
    backend.state().cart.push(("rug-jaipur".into(), 1));
    let storage = memory_storage();
    let storefront = backend.storefront(storage.clone());
    storefront.initialize().await.unwrap();

    let product = storefront.products().get(&kilim()).await.unwrap();
    storefront.cart().add_product(&product, 2).await.unwrap();

    sign_in(&storefront, EMAIL).await;

    assert_eq!(storefront.cart().mode().await, SyncMode::Remote);
    assert_eq!(
        backend.state().cart,
        vec![("rug-jaipur".to_string(), 1), ("rug-kilim".to_string(), 2)]
    );

    let lines = storefront.cart().items();
    assert_eq!(lines.len(), 2);
    let merged = lines.get(&kilim()).unwrap();
    assert_eq!(merged.quantity, 2);
    assert_eq!(merged.name, "Anatolian Kilim");
    assert_eq!(merged.price, Decimal::from(8999));

    // Local lines are gone once the server has them
    assert_eq!(storage.get(keys::CART).unwrap(), None);
}

#[tokio::test]
async fn test_discard_policy_drops_anonymous_cart() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();
    let storefront =
        backend.storefront_with(storage.clone(), Arc::new(NoIdentityProvider), MergePolicy::Discard);
    storefront.initialize().await.unwrap();

    let product = storefront.products().get(&kilim()).await.unwrap();
    storefront.cart().add_product(&product, 1).await.unwrap();

    sign_in(&storefront, EMAIL).await;

    assert_eq!(backend.hits("POST /cart/add"), 0);
    assert!(backend.state().cart.is_empty());
    assert!(storefront.cart().items().is_empty());
    assert_eq!(storage.get(keys::CART).unwrap(), None);
}

#[tokio::test]
async fn test_failed_merge_keeps_local_lines_until_sign_out() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();
    let storefront = backend.storefront(storage.clone());
    storefront.initialize().await.unwrap();

    let product = storefront.products().get(&kilim()).await.unwrap();
    storefront.cart().add_product(&product, 1).await.unwrap();

    backend.state().fail_mutations = true;
    sign_in(&storefront, EMAIL).await;

    // Still switched to the server, but the anonymous line is kept for later
    assert_eq!(storefront.cart().mode().await, SyncMode::Remote);
    assert!(storefront.cart().items().is_empty());
    assert!(storage.get(keys::CART).unwrap().is_some());

    backend.reset_hits();
    storefront.sign_out().await.unwrap();

    assert_eq!(backend.total_hits(), 0);
    assert!(storefront.cart().items().is_empty());
    assert_eq!(storage.get(keys::CART).unwrap(), None);

    // Nothing left over to push on the next sign-in
    backend.state().fail_mutations = false;
    sign_in(&storefront, EMAIL).await;
    assert_eq!(backend.hits("POST /cart/add"), 0);
    assert!(backend.state().cart.is_empty());
}

#[tokio::test]
async fn test_partial_merge_retries_only_refused_lines() {
    let backend = MockBackend::start().await;
    backend.state().rejected_products = vec!["rug-dhurrie".into()];
    let storage = memory_storage();
    let storefront = backend.storefront(storage.clone());
    storefront.initialize().await.unwrap();

    let dhurrie = ProductId::new("rug-dhurrie");
    let kilim_product = storefront.products().get(&kilim()).await.unwrap();
    let dhurrie_product = storefront.products().get(&dhurrie).await.unwrap();
    storefront.cart().add_product(&kilim_product, 1).await.unwrap();
    storefront.cart().add_product(&dhurrie_product, 1).await.unwrap();

    sign_in(&storefront, EMAIL).await;

    assert_eq!(backend.state().cart, vec![("rug-kilim".to_string(), 1)]);
    let kept = storage.get(keys::CART).unwrap().unwrap();
    assert!(kept.contains("rug-dhurrie"));
    assert!(!kept.contains("rug-kilim"));

    // Verifying again resyncs and pushes only the refused line
    backend.state().rejected_products.clear();
    sign_in(&storefront, EMAIL).await;

    assert_eq!(
        backend.state().cart,
        vec![("rug-kilim".to_string(), 1), ("rug-dhurrie".to_string(), 1)]
    );
    assert_eq!(storage.get(keys::CART).unwrap(), None);

    // A full sign-out and sign-in cycle does not add the kilim twice
    storefront.sign_out().await.unwrap();
    sign_in(&storefront, EMAIL).await;
    assert_eq!(
        backend.state().cart,
        vec![("rug-kilim".to_string(), 1), ("rug-dhurrie".to_string(), 1)]
    );
    assert_eq!(storefront.cart().items().len(), 2);
}

// ============================================================================
// Server cart mutations
// ============================================================================

#[tokio::test]
async fn test_echoed_items_replace_store_without_refetch() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();
    sign_in(&storefront, EMAIL).await;
    backend.reset_hits();

    let product = storefront.products().get(&jaipur()).await.unwrap();
    storefront.cart().add_product(&product, 2).await.unwrap();

    assert_eq!(backend.hits("POST /cart/add"), 1);
    assert_eq!(backend.hits("GET /cart"), 0);
    assert_eq!(storefront.cart().items().get(&jaipur()).unwrap().quantity, 2);
}

#[tokio::test]
async fn test_mutation_without_items_refetches_cart() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();
    sign_in(&storefront, EMAIL).await;

    backend.state().echo_items = false;
    backend.reset_hits();

    let product = storefront.products().get(&jaipur()).await.unwrap();
    storefront.cart().add_product(&product, 1).await.unwrap();
    storefront.cart().update_quantity(&jaipur(), 4).await.unwrap();

    assert_eq!(backend.hits("GET /cart"), 2);
    assert_eq!(storefront.cart().items().get(&jaipur()).unwrap().quantity, 4);
}

#[tokio::test]
async fn test_failed_mutation_leaves_store_unchanged() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();
    sign_in(&storefront, EMAIL).await;

    let product = storefront.products().get(&jaipur()).await.unwrap();
    storefront.cart().add_product(&product, 1).await.unwrap();
    let before = storefront.cart().items();

    backend.state().fail_mutations = true;
    let other = storefront.products().get(&kilim()).await.unwrap();
    let err = storefront.cart().add_product(&other, 1).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.to_string(), "Inventory service unavailable");
    assert_eq!(storefront.cart().items(), before);
}

#[tokio::test]
async fn test_quantity_zero_removes_server_line() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    storefront.initialize().await.unwrap();
    sign_in(&storefront, EMAIL).await;

    let product = storefront.products().get(&jaipur()).await.unwrap();
    storefront.cart().add_product(&product, 3).await.unwrap();
    storefront.cart().update_quantity(&jaipur(), 0).await.unwrap();

    assert_eq!(backend.hits("DELETE /cart/item/rug-jaipur"), 1);
    assert_eq!(backend.hits("POST /cart/update"), 0);
    assert!(storefront.cart().items().is_empty());
}

// ============================================================================
// Sign-out
// ============================================================================

#[tokio::test]
async fn test_sign_out_empties_cart_without_network() {
    let backend = MockBackend::start().await;
    let storage = memory_storage();
    let storefront = backend.storefront(storage.clone());
    storefront.initialize().await.unwrap();
    sign_in(&storefront, EMAIL).await;

    let product = storefront.products().get(&jaipur()).await.unwrap();
    storefront.cart().add_product(&product, 1).await.unwrap();
    assert_eq!(storefront.cart().items().len(), 1);

    backend.reset_hits();
    storefront.sign_out().await.unwrap();

    assert_eq!(backend.total_hits(), 0);
    assert_eq!(storefront.cart().mode().await, SyncMode::Local);
    assert!(storefront.cart().items().is_empty());
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);

    // The server cart is untouched and comes back on the next sign-in
    assert_eq!(backend.state().cart.len(), 1);
    sign_in(&storefront, EMAIL).await;
    assert_eq!(storefront.cart().items().len(), 1);
}
