//! Response shaping and error mapping.
//!
//! # Body shapes
//! - API endpoints: `{"success": false, "error": "..."}`
//! - Delivery (catch-all): `{"error": "..."}`
//! - Successful delivery: the destination's body, verbatim
//!
//! Every body is served as `application/json`, including the error
//! responses produced by middleware and the method router (405, 408, 413).
//!
//! # Status mapping
//! - Malformed input → 400
//! - Unknown connection id → 404
//! - Upstream or transport failure → 500 (upstream status embedded in the message)

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::forwarding::ForwardError;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    BadRequest(String),

    /// No usable destination for the connection id.
    #[error("No webhook registered for connection_id: {0}")]
    NotRegistered(String),

    /// The forwarded call failed.
    #[error(transparent)]
    Forward(#[from] ForwardError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotRegistered(_) => StatusCode::NOT_FOUND,
            ApiError::Forward(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// An [`ApiError`] rendered in the delivery path's `{"error": ...}` shape.
#[derive(Debug)]
pub struct DeliveryError(pub ApiError);

impl From<ApiError> for DeliveryError {
    fn from(err: ApiError) -> Self {
        DeliveryError(err)
    }
}

impl From<ForwardError> for DeliveryError {
    fn from(err: ForwardError) -> Self {
        DeliveryError(ApiError::Forward(err))
    }
}

impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.0.to_string() });
        (self.0.status(), Json(body)).into_response()
    }
}

/// Relay a body that is already serialized, labelled as JSON.
pub fn raw_json(status: StatusCode, body: Bytes) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

/// `map_response` hook for the API router: non-JSON error responses get the
/// `{"success": false, "error": ...}` shape.
pub async fn api_framework_errors(response: Response) -> Response {
    reshape_framework_error(response, |message| json!({"success": false, "error": message}))
}

/// `map_response` hook for delivery-only routers: non-JSON error responses
/// get the `{"error": ...}` shape.
pub async fn delivery_framework_errors(response: Response) -> Response {
    reshape_framework_error(response, |message| json!({ "error": message }))
}

fn reshape_framework_error(response: Response, shape: impl FnOnce(&str) -> Value) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(response.headers()) {
        return response;
    }

    let message = match status {
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        StatusCode::REQUEST_TIMEOUT => "Request timed out",
        StatusCode::PAYLOAD_TOO_LARGE => "Request body too large",
        other => other.canonical_reason().unwrap_or("Request failed"),
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(shape(message).to_string()))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
