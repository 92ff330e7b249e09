//! Access control middleware.
//! Enforces the configured permission checks before a request is relayed.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::config::{CredentialsConfig, SecurityConfig};
use crate::http::request;
use crate::http::response::detail;
use crate::security::{has_api_key_or_authenticated, hash_in_header_or_admin};

const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// State required for access control.
#[derive(Debug, Clone)]
pub struct AccessControlState {
    pub credentials: Arc<CredentialsConfig>,
    pub require_api_key_or_authenticated: bool,
    pub require_body_hash: bool,
    pub max_body_size: usize,
}

impl AccessControlState {
    pub fn new(credentials: CredentialsConfig, security: &SecurityConfig) -> Self {
        Self {
            credentials: Arc::new(credentials),
            require_api_key_or_authenticated: security.require_api_key_or_authenticated,
            require_body_hash: security.require_body_hash,
            max_body_size: security.max_body_size,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.require_api_key_or_authenticated || self.require_body_hash
    }
}

pub async fn access_control_middleware(
    State(state): State<AccessControlState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if state.require_api_key_or_authenticated && !has_api_key_or_authenticated(&req, &state.credentials) {
        warn!(path = %req.uri().path(), "Missing API key and no authenticated user");
        return detail(StatusCode::FORBIDDEN, PERMISSION_DENIED);
    }

    if !state.require_body_hash {
        return next.run(req).await;
    }

    // The digest needs the whole body; hand the buffered copy on.
    let buffered = match request::buffer(req, state.max_body_size).await {
        Ok(buffered) => buffered,
        Err(_) => return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response(),
    };
    if !hash_in_header_or_admin(&buffered, &state.credentials) {
        warn!(path = %buffered.uri().path(), "Body hash mismatch");
        return detail(StatusCode::FORBIDDEN, PERMISSION_DENIED);
    }

    next.run(buffered.map(Body::from)).await
}
