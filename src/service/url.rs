//! Downstream URL resolution.

use url::Url;

/// True when `target` already names a scheme and host.
pub fn is_absolute(target: &str) -> bool {
    Url::parse(target).map(|u| u.has_host()).unwrap_or(false)
}

/// Join a host and a path with exactly one `/` between them.
///
/// An absolute `path` is returned unchanged.
pub fn join_url(host: &str, path: &str) -> String {
    if host.is_empty() || is_absolute(path) {
        return path.to_string();
    }
    if path.is_empty() {
        return host.to_string();
    }
    format!("{}/{}", host.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Strip `prefix` from the front of `target` at most once.
pub fn strip_lookup_prefix<'a>(target: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return target;
    }
    target.strip_prefix(prefix).unwrap_or(target)
}

/// Resolve the downstream URL for `target`.
pub fn resolve_url(base_location: Option<&str>, lookup_prefix: &str, target: &str) -> String {
    let path = strip_lookup_prefix(target, lookup_prefix);
    match base_location {
        Some(base) => join_url(base, path),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:9000", "api/v1/test/"),
            "http://localhost:9000/api/v1/test/"
        );
        assert_eq!(
            join_url("http://localhost:9000/", "/api/v1/test/"),
            "http://localhost:9000/api/v1/test/"
        );
        assert_eq!(join_url("http://localhost:9000", ""), "http://localhost:9000");
    }

    #[test]
    fn test_join_absolute_is_idempotent() {
        let once = join_url("http://localhost:9000", "api/v1/test/");
        assert_eq!(join_url("http://localhost:9000", &once), once);
        assert_eq!(join_url("http://other:1", "https://x.test/a"), "https://x.test/a");
    }

    #[test]
    fn test_strip_prefix_once() {
        assert_eq!(strip_lookup_prefix("/api/v2/api/v2/items/", "/api/v2"), "/api/v2/items/");
        assert_eq!(strip_lookup_prefix("/other/", "/api/v2"), "/other/");
        assert_eq!(strip_lookup_prefix("/x/api/v2/", "/api/v2"), "/x/api/v2/");
        assert_eq!(strip_lookup_prefix("/items/", ""), "/items/");
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url(Some("https://api.external-service.com"), "", "/api/v1/connect"),
            "https://api.external-service.com/api/v1/connect"
        );
        assert_eq!(
            resolve_url(Some("https://api.external-service.com"), "", "without/prefix/slash/"),
            "https://api.external-service.com/without/prefix/slash/"
        );
        assert_eq!(
            resolve_url(Some("http://container:8000"), "/api/v2", "/api/v2/products/"),
            "http://container:8000/products/"
        );
        assert_eq!(
            resolve_url(None, "", "https://jsonplaceholder.typicode.com/todos/1"),
            "https://jsonplaceholder.typicode.com/todos/1"
        );
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("http://web:8000"));
        assert!(!is_absolute("/api/v1/"));
        assert!(!is_absolute("without/prefix/"));
    }
}
