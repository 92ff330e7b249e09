//! Remote-user identity middleware.
//!
//! Attaches a [`RemoteUser`] extension to every request:
//! - `Remote-User` header of ASCII digits → that id
//! - `Remote-User` header present but not numeric → unknown, no fallback
//! - no header → the authenticated user's id, if any

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::http::request::{authenticated_user, RemoteUser, REMOTE_USER};

/// Derive the on-behalf-of identity for a request.
pub fn derive_remote_user<B>(request: &Request<B>) -> RemoteUser {
    match request.headers().get(REMOTE_USER) {
        Some(value) => {
            let id = value
                .to_str()
                .ok()
                .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|v| v.parse().ok());
            RemoteUser(id)
        }
        None => RemoteUser(authenticated_user(request).map(|user| user.id)),
    }
}

pub async fn remote_user_middleware(mut req: Request<Body>, next: Next) -> Response {
    let remote_user = derive_remote_user(&req);
    tracing::trace!(remote_user = ?remote_user.0, "Remote user derived");
    req.extensions_mut().insert(remote_user);
    next.run(req).await
}
