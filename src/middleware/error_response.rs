//! Rewrites framework-level error responses into the `{code, message}` envelope
//!
//! Extractor rejections (malformed JSON, wrong content type, bad path
//! parameters) and unmatched routes come back from axum as text/plain or
//! empty bodies. Handler errors are already JSON and pass through untouched.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Paths that answer in plain text on purpose
const PASSTHROUGH_PATHS: &[&str] = &["/health", "/ready", "/metrics"];

pub async fn normalize_error_response(request: Request<Body>, next: Next) -> Response {
    let passthrough = PASSTHROUGH_PATHS.contains(&request.uri().path());
    let response = next.run(request).await;

    let status = response.status();
    if passthrough || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        return response;
    }

    envelope_for(status)
}

fn envelope_for(status: StatusCode) -> Response {
    let (status, message) = match status {
        // axum reports undeserializable bodies as 422
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            (StatusCode::BAD_REQUEST, "Invalid request body")
        }
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            (StatusCode::BAD_REQUEST, "Expected a JSON request body")
        }
        StatusCode::UNAUTHORIZED => (status, "Authentication required"),
        StatusCode::FORBIDDEN => (status, "Access denied"),
        StatusCode::NOT_FOUND => (status, "Not found"),
        StatusCode::METHOD_NOT_ALLOWED => (status, "Method not allowed"),
        StatusCode::CONFLICT => (status, "Resource conflict"),
        _ if status.is_client_error() => (StatusCode::BAD_REQUEST, "Bad request"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred"),
    };

    let body = json!({
        "code": status.as_u16(),
        "message": message,
    });

    (status, axum::Json(body)).into_response()
}
