use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use iap_subscriptions::{
    middleware::REQUEST_ID_HEADER, models::purchase::Purchase, routes::create_router, server,
    AppState, Config,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::common::{eventually, FakeStore};

fn test_config() -> Config {
    let sources = config::Config::builder()
        .add_source(config::File::from_str(
            r#"
catalog:
  product_ids: ["sub_a", "sub_b"]
iap:
  apple_shared_secret: "test-shared-secret"
  sandbox_url: "http://127.0.0.1:9/verifyReceipt"
  retry_attempts: 0
"#,
            config::FileFormat::Yaml,
        ))
        .build()
        .unwrap();
    Config::from_sources(sources).unwrap()
}

async fn app(store: Arc<FakeStore>) -> (Router, AppState) {
    let state = AppState::new(test_config(), store).await.unwrap();
    (create_router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_lists_loaded_products() {
    let (app, _) = app(Arc::new(FakeStore::with_products(&["sub_a", "sub_b"]))).await;

    let (status, body) = send(&app, get("/api/v1/products")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["productId"], "sub_a");
    assert_eq!(body["data"][0]["localizedPrice"], "$4.99");
}

#[tokio::test]
async fn test_subscription_is_null_before_validation() {
    let (app, _) = app(Arc::new(FakeStore::with_products(&["sub_a"]))).await;

    let (status, body) = send(&app, get("/api/v1/subscription")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_purchase_request_is_accepted() {
    let store = Arc::new(FakeStore::with_products(&["sub_a", "sub_b"]));
    let (app, _) = app(store.clone()).await;

    let (status, body) = send(
        &app,
        post_json("/api/v1/purchases", serde_json::json!({"productId": "sub_a"})),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], true);
    assert_eq!(store.purchase_requests(), vec!["sub_a"]);
}

#[tokio::test]
async fn test_purchase_of_unknown_product_is_rejected() {
    let store = Arc::new(FakeStore::with_products(&["sub_a", "sub_b"]));
    let (app, _) = app(store.clone()).await;

    let (status, body) = send(
        &app,
        post_json("/api/v1/purchases", serde_json::json!({"productId": "sub_z"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "UNKNOWN_PRODUCT");
    assert!(store.purchase_requests().is_empty());
}

#[tokio::test]
async fn test_empty_product_id_is_a_bad_request() {
    let (app, _) = app(Arc::new(FakeStore::with_products(&["sub_a"]))).await;

    let (status, body) = send(
        &app,
        post_json("/api/v1/purchases", serde_json::json!({"productId": ""})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_purchase_after_teardown_is_gone() {
    let (app, state) = app(Arc::new(FakeStore::with_products(&["sub_a"]))).await;
    state.session.teardown().await;

    let (status, body) = send(
        &app,
        post_json("/api/v1/purchases", serde_json::json!({"productId": "sub_a"})),
    )
    .await;

    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"]["code"], "SESSION_CLOSED");
}

#[tokio::test]
async fn test_failure_notifications_are_listed() {
    let store = Arc::new(FakeStore::with_products(&["sub_a"]));
    let (app, state) = app(store.clone()).await;

    store.emit_error("User cancelled");
    eventually("notification recorded", || {
        !state.notifications.recent().is_empty()
    })
    .await;

    let (status, body) = send(&app, get("/api/v1/notifications")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["kind"], "failure");
    assert_eq!(body["data"][0]["title"], "Purchase Failed");
    assert_eq!(body["data"][0]["message"], "User cancelled");
}

#[tokio::test]
async fn test_unreachable_validator_keeps_status_unset() {
    let store = Arc::new(FakeStore::with_products(&["sub_a"]));
    let (app, state) = app(store.clone()).await;

    store.emit_purchase(Purchase {
        transaction_id: "1000000001".to_string(),
        product_id: "sub_a".to_string(),
        transaction_receipt: Some(iap_subscriptions::models::receipt::Receipt::new("R1")),
    });
    eventually("purchase handled", || !state.notifications.recent().is_empty()).await;

    let (_, body) = send(&app, get("/api/v1/subscription")).await;

    assert_eq!(store.finalized(), vec!["1000000001"]);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (app, _) = app(Arc::new(FakeStore::with_products(&["sub_a"]))).await;

    let response = app.oneshot(get("/api/v1/products")).await.unwrap();

    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn test_serves_on_configured_address() {
    let mut config = test_config();
    config.server.port = 0;
    let state = AppState::new(config, Arc::new(FakeStore::with_products(&["sub_a"])))
        .await
        .unwrap();

    let listener = server::bind(&state.config.server).await.unwrap();
    let addr = listener.local_addr().unwrap();
    assert_eq!(addr.ip().to_string(), state.config.server.host);
    let serving = tokio::spawn(server::serve_on(listener, state));

    let body: Value = reqwest::get(format!("http://{addr}/api/v1/products"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["productId"], "sub_a");
    serving.abort();
}
