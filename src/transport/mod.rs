//! Downstream transport subsystem.
//!
//! # Data Flow
//! ```text
//! ConnectionService assembles an OutboundRequest
//!     → Transport::execute (client.rs: pooled reqwest client)
//!     → connect failure? resilience::RetryPolicy decides on another attempt
//!     → RawResponse (status, headers, buffered body) or TransportError
//! ```
//!
//! # Design Decisions
//! - `Transport` is a trait object so tests can substitute a scripted transport
//! - Bodies are buffered; envelopes need the decoded JSON anyway
//! - One transport is shared by every service built from a definition

pub mod client;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, StatusCode};
use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

pub use client::ReqwestTransport;

/// Performs one downstream HTTP exchange.
pub trait Transport: Send + Sync {
    fn execute(&self, request: OutboundRequest) -> BoxFuture<'_, Result<RawResponse, TransportError>>;
}

/// Errors raised while talking to a downstream service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No connection could be established, retries included.
    #[error("connection to {url} failed after {attempts} attempt(s): {reason}")]
    Connect {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// The exchange failed after the connection was made.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// A file sent in a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Body of a downstream request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Serialized as `application/json`.
    Json(Value),
    /// Serialized as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Sent verbatim, e.g. the inbound request body.
    Raw {
        content_type: Option<String>,
        bytes: Bytes,
    },
    /// `multipart/form-data` with plain fields and files.
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

impl Payload {
    /// Falsy JSON (`null`, `false`, zero, `""`, `[]`, `{}`) and empty field
    /// lists count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Json(value) => match value {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::String(text) => text.is_empty(),
                Value::Bool(flag) => !flag,
                Value::Number(number) => number.as_f64() == Some(0.0),
            },
            Payload::Form(fields) => fields.is_empty(),
            Payload::Raw { bytes, .. } => bytes.is_empty(),
            Payload::Multipart { fields, files } => fields.is_empty() && files.is_empty(),
        }
    }

    /// Flatten the payload into form fields.
    ///
    /// JSON objects become one field per key (strings unquoted); raw bodies are
    /// parsed according to their content type. Anything else yields no fields.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        match self {
            Payload::Json(value) => json_fields(value),
            Payload::Form(fields) => fields.clone(),
            Payload::Multipart { fields, .. } => fields.clone(),
            Payload::Raw { content_type, bytes } => {
                let content_type = content_type.as_deref().unwrap_or_default();
                if content_type.starts_with("application/x-www-form-urlencoded") {
                    url::form_urlencoded::parse(bytes)
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                } else {
                    serde_json::from_slice::<Value>(bytes)
                        .map(|value| json_fields(&value))
                        .unwrap_or_default()
                }
            }
        }
    }
}

fn json_fields(value: &Value) -> Vec<(String, String)> {
    let Some(object) = value.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Everything needed to perform one downstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub payload: Option<Payload>,
    /// `None` means no `Cookie` header at all.
    pub cookies: Option<Vec<(String, String)>>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            url: url.into(),
            headers,
            query: Vec::new(),
            payload: None,
            cookies: None,
        }
    }

    /// Value of the `Cookie` header for the attached cookies.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.as_ref().filter(|c| !c.is_empty())?;
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// A downstream response with its body fully read.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Build a response carrying a JSON document.
    pub fn json(status: StatusCode, value: &Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Self::new(status, headers, value.to_string())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Decode the body as JSON. An empty body decodes to `null`.
    pub fn decode(&self) -> Result<Value, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json() {
        let raw = RawResponse::json(StatusCode::OK, &json!({"id": 1}));
        assert_eq!(raw.decode().unwrap(), json!({"id": 1}));
        assert_eq!(raw.content_type(), Some("application/json"));
    }

    #[test]
    fn test_decode_empty_body_is_null() {
        let raw = RawResponse::new(StatusCode::NO_CONTENT, HeaderMap::new(), "");
        assert_eq!(raw.decode().unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_html_fails() {
        let raw = RawResponse::new(
            StatusCode::BAD_GATEWAY,
            HeaderMap::new(),
            "<html><head><title>502 Bad Gateway</title></head></html>",
        );
        assert!(raw.decode().is_err());
    }

    #[test]
    fn test_falsy_json_is_empty() {
        for value in [json!(null), json!({}), json!([]), json!(""), json!(false), json!(0)] {
            assert!(Payload::Json(value).is_empty());
        }
        for value in [json!({"a": 1}), json!([0]), json!("x"), json!(true), json!(0.5)] {
            assert!(!Payload::Json(value).is_empty());
        }
        assert!(Payload::Form(Vec::new()).is_empty());
    }

    #[test]
    fn test_cookie_header() {
        let mut request = OutboundRequest::new(Method::GET, "http://web:8000", HeaderMap::new());
        assert_eq!(request.cookie_header(), None);
        request.cookies = Some(vec![("sessionid".into(), "abc".into()), ("lang".into(), "en".into())]);
        assert_eq!(request.cookie_header().as_deref(), Some("sessionid=abc; lang=en"));
    }

    #[test]
    fn test_form_fields() {
        let json = Payload::Json(json!({"title": "doc", "pages": 3}));
        assert_eq!(
            json.form_fields(),
            vec![("title".to_string(), "doc".to_string()), ("pages".to_string(), "3".to_string())]
        );

        let urlencoded = Payload::Raw {
            content_type: Some("application/x-www-form-urlencoded".into()),
            bytes: Bytes::from_static(b"a=1&b=two+words"),
        };
        assert_eq!(
            urlencoded.form_fields(),
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "two words".to_string())]
        );

        let garbage = Payload::Raw {
            content_type: None,
            bytes: Bytes::from_static(b"\x00\x01"),
        };
        assert!(garbage.form_fields().is_empty());
    }
}
