use axum::{extract::State, Json};

use crate::{app_state::AppState, models::subscription::SubscriptionResponse};

/// GET /api/v1/subscription
pub async fn get_subscription(State(state): State<AppState>) -> Json<SubscriptionResponse> {
    Json(SubscriptionResponse {
        success: true,
        data: state.session.status(),
    })
}
