use axum::{extract::State, Json};
use tracing::instrument;

use crate::{app_state::AppState, error::Result, models::product::ProductsResponse};

/// GET /api/v1/products
#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Json<ProductsResponse> {
    Json(ProductsResponse {
        success: true,
        data: state.session.products(),
    })
}

/// POST /api/v1/products/reload
#[instrument(skip(state))]
pub async fn reload_products(State(state): State<AppState>) -> Result<Json<ProductsResponse>> {
    let products = state.session.reload_products().await?;

    Ok(Json(ProductsResponse {
        success: true,
        data: products,
    }))
}
