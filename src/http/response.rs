//! Response mapping for relayed calls.
//!
//! # Responsibilities
//! - Turn a `ResponseEnvelope` into an axum response
//! - Map `ServiceError` to 405 / 502 with a `detail` body
//!
//! # Design Decisions
//! - Hop-by-hop and length headers are stripped; the body is re-serialized
//! - A `null` body is sent empty

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use crate::service::{ResponseEnvelope, ServiceError};

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Downstream headers safe to relay.
pub fn relayable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut relayed = headers.clone();
    for name in &HOP_BY_HOP {
        relayed.remove(name);
    }
    relayed.remove(header::CONTENT_LENGTH);
    relayed
}

/// JSON error body in the `{"detail": ...}` shape.
pub fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({ "detail": message.into() });
    (status, axum::Json(body)).into_response()
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let (status, body, headers, content_type) = self.into_parts();

        let mut response = if body.is_null() {
            Response::new(axum::body::Body::empty())
        } else {
            Response::new(axum::body::Body::from(body_bytes(&body)))
        };
        *response.status_mut() = status;
        *response.headers_mut() = relayable_headers(&headers);

        if !body.is_null() {
            let content_type = content_type
                .and_then(|ct| HeaderValue::try_from(ct).ok())
                .unwrap_or_else(|| HeaderValue::from_static("application/json"));
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

fn body_bytes(body: &Value) -> Vec<u8> {
    serde_json::to_vec(body).unwrap_or_default()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match &self {
            ServiceError::MethodNotAllowed { .. } => detail(StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            ServiceError::Decode { .. } => detail(StatusCode::BAD_GATEWAY, self.to_string()),
        }
    }
}
