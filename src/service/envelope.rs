//! Normalized outcome of one downstream call.

use axum::http::{HeaderMap, StatusCode};
use serde_json::{json, Value};

use crate::transport::RawResponse;

/// Status, decoded body, headers and content type relayed to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    status: StatusCode,
    body: Value,
    headers: HeaderMap,
    content_type: Option<String>,
}

impl ResponseEnvelope {
    pub fn new(status: StatusCode, body: Value, headers: HeaderMap, content_type: Option<String>) -> Self {
        Self {
            status,
            body,
            headers,
            content_type,
        }
    }

    /// Envelope produced when no downstream response is available.
    pub fn connection_refused() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"detail": "connection refused"}),
            HeaderMap::new(),
            None,
        )
    }

    /// Wrap a downstream response whose body decoded to `body`.
    pub fn from_raw(raw: RawResponse, body: Value) -> Self {
        let content_type = raw.content_type().map(str::to_string);
        Self::new(raw.status, body, raw.headers, content_type)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn into_parts(self) -> (StatusCode, Value, HeaderMap, Option<String>) {
        (self.status, self.body, self.headers, self.content_type)
    }
}
