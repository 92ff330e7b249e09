//! Request permission predicates.
//!
//! Both checks read the inbound request only; they never fail, a malformed
//! header simply does not grant access.

use axum::body::Bytes;
use axum::http::{header, Method, Request};

use crate::config::CredentialsConfig;
use crate::http::request::authenticated_user;
use crate::security::digest::body_digest;

/// Methods whose body must carry a matching digest.
pub const HASHED_METHODS: [Method; 3] = [Method::POST, Method::PUT, Method::PATCH];

/// Allow callers presenting the service API key, or any authenticated user.
///
/// The key is read from `Authorization: <api_key_header> <api_key>`.
pub fn has_api_key_or_authenticated<B>(request: &Request<B>, credentials: &CredentialsConfig) -> bool {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|value| {
            let mut tokens = value.split(' ');
            tokens.next() == Some(credentials.api_key_header.as_str())
                && tokens.next() == Some(credentials.api_key.as_str())
        })
        .unwrap_or(false);

    presented || authenticated_user(request).is_some()
}

/// Require the hash header to match the body digest on writes, unless the
/// caller is an admin. Other methods are allowed.
pub fn hash_in_header_or_admin(request: &Request<Bytes>, credentials: &CredentialsConfig) -> bool {
    if !HASHED_METHODS.contains(request.method()) {
        return true;
    }
    if authenticated_user(request).is_some_and(|user| user.is_admin) {
        return true;
    }

    let Some(presented) = request
        .headers()
        .get(credentials.hash_header.as_str())
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    body_digest(request.body()).is_some_and(|digest| digest == presented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::AuthenticatedUser;
    use crate::security::digest::md5_hex;

    fn credentials() -> CredentialsConfig {
        CredentialsConfig {
            api_key_header: "ACCESS-KEY".into(),
            api_key: "12345-qwerty".into(),
            ..CredentialsConfig::default()
        }
    }

    fn post() -> axum::http::request::Builder {
        Request::builder().method("POST").uri("/view/")
    }

    #[test]
    fn test_api_key_accepted() {
        let request = post()
            .header("Authorization", "ACCESS-KEY 12345-qwerty")
            .body(())
            .unwrap();
        assert!(has_api_key_or_authenticated(&request, &credentials()));
    }

    #[test]
    fn test_anonymous_without_key_denied() {
        let request = post().body(()).unwrap();
        assert!(!has_api_key_or_authenticated(&request, &credentials()));

        let request = post().header("Authorization", "ACCESS-KEY").body(()).unwrap();
        assert!(!has_api_key_or_authenticated(&request, &credentials()));

        let request = post()
            .header("Authorization", "Basic dGVzdDp0ZXN0")
            .body(())
            .unwrap();
        assert!(!has_api_key_or_authenticated(&request, &credentials()));
    }

    #[test]
    fn test_authenticated_user_allowed() {
        let mut request = post()
            .header("Authorization", "Basic dGVzdDp0ZXN0")
            .body(())
            .unwrap();
        request.extensions_mut().insert(AuthenticatedUser::new(7));
        assert!(has_api_key_or_authenticated(&request, &credentials()));
    }

    #[test]
    fn test_hash_header() {
        let body = Bytes::from_static(br#"{"key":"value"}"#);
        let digest = md5_hex(r#"{"key": "value"}"#);

        let request = post().header("X-Hash", digest).body(body.clone()).unwrap();
        assert!(hash_in_header_or_admin(&request, &credentials()));

        let request = post().header("X-Hash", "bogus").body(body.clone()).unwrap();
        assert!(!hash_in_header_or_admin(&request, &credentials()));

        let mut request = post().body(body).unwrap();
        assert!(!hash_in_header_or_admin(&request, &credentials()));
        request.extensions_mut().insert(AuthenticatedUser::admin(1));
        assert!(hash_in_header_or_admin(&request, &credentials()));
    }

    #[test]
    fn test_hash_not_required_for_reads() {
        let request = Request::builder().method("GET").body(Bytes::new()).unwrap();
        assert!(hash_in_header_or_admin(&request, &credentials()));
    }
}
