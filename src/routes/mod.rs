// Route modules
pub mod catalog;
pub mod notifications;
pub mod purchases;
pub mod subscription;

use crate::{app_state::AppState, middleware::logging_middleware};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the display-surface router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/reload", post(catalog::reload_products))
        .route("/subscription", get(subscription::get_subscription))
        .route("/purchases", post(purchases::request_purchase))
        .route("/notifications", get(notifications::list_notifications))
        .layer(middleware::from_fn(logging_middleware))
}
