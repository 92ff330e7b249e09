//! Host rewriting for pagination links returned by a downstream.

/// Rewrite a downstream link so it points back at the gateway.
///
/// `base` (the downstream base location) is replaced with `gateway`, then
/// `before` with `after`. An empty `before` leaves the second step out.
pub fn rewrite_link(text: &str, base: Option<&str>, gateway: &str, before: &str, after: &str) -> String {
    let mut link = match base {
        Some(base) if !base.is_empty() => text.replace(base, gateway),
        _ => text.to_string(),
    };
    if !before.is_empty() {
        link = link.replace(before, after);
    }
    link
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_link() {
        let link = "http://container:8000/api/v1/products/?page=2";
        assert_eq!(
            rewrite_link(link, Some("http://container:8000"), "https://shop.io", "/api/v1/", "/products-api/"),
            "https://shop.io/products-api/products/?page=2"
        );
    }

    #[test]
    fn test_empty_pair_only_swaps_host() {
        let link = "http://container:8000/api/v1/products/?page=2";
        assert_eq!(
            rewrite_link(link, Some("http://container:8000"), "http://gw", "", "/ignored/"),
            "http://gw/api/v1/products/?page=2"
        );
    }

    #[test]
    fn test_without_base() {
        assert_eq!(rewrite_link("/api/v1/x", None, "http://gw", "/api/v1/", "/v2/"), "/v2/x");
    }
}
