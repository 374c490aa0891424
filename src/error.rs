use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum IapError {
    #[error("Store connection error: {0}")]
    StoreConnection(String),

    #[error("Purchase request rejected: {0}")]
    PurchaseRequest(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Failed to finalize transaction: {0}")]
    Finalize(String),

    #[error("Receipt validation failed: {0}")]
    Validation(String),

    #[error("Session has been torn down")]
    SessionClosed,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for IapError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            IapError::StoreConnection(ref msg) => {
                tracing::error!("Store connection error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "The store is not available right now".to_string(),
                )
            }
            IapError::PurchaseRequest(ref msg) => (
                StatusCode::BAD_GATEWAY,
                "PURCHASE_REQUEST_REJECTED",
                msg.clone(),
            ),
            IapError::UnknownProduct(ref id) => (
                StatusCode::NOT_FOUND,
                "UNKNOWN_PRODUCT",
                format!("Product {} is not in the catalog", id),
            ),
            IapError::Finalize(ref msg) => {
                tracing::error!("Finalize error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "FINALIZE_FAILED",
                    "Failed to finalize transaction".to_string(),
                )
            }
            IapError::Validation(ref msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_RECEIPT",
                msg.clone(),
            ),
            IapError::SessionClosed => (
                StatusCode::GONE,
                "SESSION_CLOSED",
                "Subscription session is closed".to_string(),
            ),
            IapError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            IapError::Config(ref e) => {
                tracing::error!("Configuration error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            IapError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

// Helper type for results
pub type Result<T> = std::result::Result<T, IapError>;
