//! Catalog reads, caching, and recently viewed products.

#![allow(clippy::unwrap_used)]

use carpet_core::ProductId;
use carpet_integration_tests::{MockBackend, memory_storage};
use carpet_storefront::ErrorKind;
use carpet_storefront::services::product::ProductQuery;

#[tokio::test]
async fn test_listing_fills_store_and_is_cached() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());

    let query = ProductQuery {
        category: Some("flat-weave".into()),
        ..ProductQuery::default()
    };
    let page = storefront.products().list(&query).await.unwrap();
    assert_eq!(page.products.len(), 3);

    let state = storefront.products().state().snapshot();
    assert_eq!(state.products.len(), 3);
    assert_eq!(state.pagination.unwrap().total, 3);
    assert!(!state.is_loading);

    storefront.products().list(&query).await.unwrap();
    assert_eq!(backend.hits("GET /products"), 1);

    // A different query is a different cache entry
    storefront
        .products()
        .list(&ProductQuery::default())
        .await
        .unwrap();
    assert_eq!(backend.hits("GET /products"), 2);
}

#[tokio::test]
async fn test_product_detail_is_cached() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());
    let id = ProductId::new("rug-jaipur");

    let product = storefront.products().get(&id).await.unwrap();
    assert_eq!(product.name, "Jaipur Hand-Knotted");
    assert!(product.in_stock);

    storefront.products().get(&id).await.unwrap();
    assert_eq!(backend.hits("GET /products/rug-jaipur"), 1);

    storefront.api().invalidate_catalog();
    storefront.products().get(&id).await.unwrap();
    assert_eq!(backend.hits("GET /products/rug-jaipur"), 2);
}

#[tokio::test]
async fn test_missing_product_reports_server_message() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());

    let err = storefront
        .view_product(&ProductId::new("rug-unknown"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.to_string(), "Product not found");
    assert!(storefront.recently_viewed().list().is_empty());
}

#[tokio::test]
async fn test_viewing_products_tracks_recent_order() {
    let backend = MockBackend::start().await;
    let storefront = backend.storefront(memory_storage());

    for id in ["rug-jaipur", "rug-kilim", "rug-jaipur"] {
        storefront.view_product(&ProductId::new(id)).await.unwrap();
    }

    assert_eq!(
        storefront.recently_viewed().list(),
        vec![ProductId::new("rug-jaipur"), ProductId::new("rug-kilim")]
    );
}
