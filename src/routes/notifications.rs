use axum::{extract::State, Json};

use crate::{app_state::AppState, models::common::NotificationsResponse};

/// GET /api/v1/notifications
pub async fn list_notifications(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        success: true,
        data: state.notifications.recent(),
    })
}
