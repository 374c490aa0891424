use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request bodies on this surface are tiny purchase requests
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Logs each request with a request id and echoes the id on the response
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request = if method == Method::POST {
        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(request_id = %request_id, "Failed to read request body: {}", e);
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
        };

        let body_text = String::from_utf8_lossy(&bytes);
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            body = %body_text.trim(),
            "→ Request"
        );
        Request::from_parts(parts, Body::from(bytes))
    } else {
        tracing::info!(request_id = %request_id, method = %method, uri = %uri, "→ Request");
        request
    };

    let mut response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        "← Response"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
