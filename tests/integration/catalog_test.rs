use std::sync::{atomic::Ordering, Arc};

use iap_subscriptions::{
    error::IapError,
    services::{SessionPhase, SubscriptionSession},
};

use crate::common::{catalog, FakeStore, FakeValidator, RecordingNotifier};

#[tokio::test]
async fn test_catalog_never_contains_unrequested_products() {
    let store = Arc::new(FakeStore::with_products(&["sub_b", "sub_x", "sub_a", "sub_b"]));
    let session = SubscriptionSession::start(
        store.clone(),
        Arc::new(FakeValidator::new()),
        Arc::new(RecordingNotifier::default()),
        &catalog(&["sub_a", "sub_b"]),
    )
    .await;

    let ids: Vec<_> = session
        .products()
        .into_iter()
        .map(|p| p.product_id)
        .collect();

    // Store order is kept, unknown and duplicate entries are dropped
    assert_eq!(ids, vec!["sub_b", "sub_a"]);
    assert_eq!(session.phase(), SessionPhase::Loaded);
}

#[tokio::test]
async fn test_connection_failure_leaves_catalog_empty() {
    let store = Arc::new(FakeStore::with_products(&["sub_a", "sub_b"]).failing_open());
    let session = SubscriptionSession::start(
        store.clone(),
        Arc::new(FakeValidator::new()),
        Arc::new(RecordingNotifier::default()),
        &catalog(&["sub_a", "sub_b"]),
    )
    .await;

    assert!(session.products().is_empty());
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);

    // Screen stays usable; purchases are refused because nothing is loaded
    let result = session.request_purchase("sub_a").await;
    assert!(matches!(result, Err(IapError::UnknownProduct(_))));
    assert!(store.purchase_requests().is_empty());
}

#[tokio::test]
async fn test_store_is_opened_once_across_reloads() {
    let store = Arc::new(FakeStore::with_products(&["sub_a", "sub_b"]));
    let session = SubscriptionSession::start(
        store.clone(),
        Arc::new(FakeValidator::new()),
        Arc::new(RecordingNotifier::default()),
        &catalog(&["sub_a", "sub_b"]),
    )
    .await;

    let reloaded = session.reload_products().await.unwrap();

    assert_eq!(reloaded.len(), 2);
    assert_eq!(store.open_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
}
