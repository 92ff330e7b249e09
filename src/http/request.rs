//! Inbound request handling.
//!
//! # Responsibilities
//! - Identity extensions set by the host application (`AuthenticatedUser`)
//!   and by the remote-user middleware (`RemoteUser`)
//! - Accessors the proxying layer reads: language, cookies, query, body, host
//! - Buffer a streaming body so one request can be inspected and forwarded

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderValue};
use axum::http::Request;

use crate::transport::Payload;

/// Header carrying the on-behalf-of user id.
pub const REMOTE_USER: &str = "remote-user";

/// User authenticated by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: u64,
    pub is_admin: bool,
}

impl AuthenticatedUser {
    pub fn new(id: u64) -> Self {
        Self { id, is_admin: false }
    }

    pub fn admin(id: u64) -> Self {
        Self { id, is_admin: true }
    }
}

/// Identity derived by the remote-user middleware. `None` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteUser(pub Option<u64>);

pub fn authenticated_user<B>(request: &Request<B>) -> Option<&AuthenticatedUser> {
    request.extensions().get::<AuthenticatedUser>()
}

pub fn accept_language<B>(request: &Request<B>) -> Option<&HeaderValue> {
    request.headers().get(header::ACCEPT_LANGUAGE)
}

pub fn content_type<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Cookies from every `Cookie` header, in order.
pub fn cookies<B>(request: &Request<B>) -> Vec<(String, String)> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Decoded query string pairs.
pub fn query_pairs<B>(request: &Request<B>) -> Vec<(String, String)> {
    request
        .uri()
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// The inbound body as a raw payload, `None` when empty.
pub fn body_payload(request: &Request<Bytes>) -> Option<Payload> {
    if request.body().is_empty() {
        return None;
    }
    Some(Payload::Raw {
        content_type: content_type(request).map(str::to_string),
        bytes: request.body().clone(),
    })
}

/// Host the caller addressed: `Host` header, else the URI authority.
pub fn host<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
}

/// Scheme the caller used: URI scheme, `X-Forwarded-Proto`, else `http`.
pub fn scheme<B>(request: &Request<B>) -> &str {
    request
        .uri()
        .scheme_str()
        .or_else(|| {
            request
                .headers()
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
        })
        .unwrap_or("http")
}

/// Read the whole body, keeping method, URI, headers and extensions.
pub async fn buffer(request: Request<Body>, limit: usize) -> Result<Request<Bytes>, axum::Error> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await?;
    Ok(Request::from_parts(parts, bytes))
}
