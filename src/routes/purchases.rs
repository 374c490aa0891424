use axum::{extract::State, http::StatusCode, Json};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{IapError, Result},
    models::{common::MessageResponse, purchase::PurchaseRequest},
};

/// POST /api/v1/purchases
///
/// Accepted means the store took the request; the result shows up later in
/// `/subscription` and `/notifications`.
#[instrument(skip(state, request))]
pub async fn request_purchase(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    request
        .validate()
        .map_err(|e| IapError::BadRequest(format!("Validation error: {}", e)))?;

    state.session.request_purchase(&request.product_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(format!(
            "Purchase of {} requested",
            request.product_id
        ))),
    ))
}
