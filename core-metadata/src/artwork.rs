//! Cover display URLs.
//!
//! Covers are shown through an image proxy to avoid hotlinking
//! restrictions. The stored `coverUrl` is never rewritten.

/// Public weserv endpoint.
pub const DEFAULT_IMAGE_PROXY: &str = "https://images.weserv.nl/";

/// Rewrite `url` through the image proxy at `proxy_base`.
///
/// Returns `None` for a blank URL. The proxy falls back to its default
/// image when the source cannot be fetched.
pub fn proxied_image_url(proxy_base: &str, url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    Some(format!(
        "{}?url={}&default=1",
        proxy_base,
        urlencoding::encode(url)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxied_image_url() {
        assert_eq!(
            proxied_image_url(DEFAULT_IMAGE_PROXY, "https://cdn.example.com/a b.jpg?s=1").as_deref(),
            Some("https://images.weserv.nl/?url=https%3A%2F%2Fcdn.example.com%2Fa%20b.jpg%3Fs%3D1&default=1")
        );
    }

    #[test]
    fn test_blank_url_has_no_proxy() {
        assert_eq!(proxied_image_url(DEFAULT_IMAGE_PROXY, "  "), None);
    }
}
