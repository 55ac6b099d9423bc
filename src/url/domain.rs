use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// The port is not part of the domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use skewer::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the `scheme://host[:port]` key robots policies are cached under
///
/// Default ports are omitted, so `https://example.com:443/` and
/// `https://example.com/` share a key.
///
/// ```
/// use url::Url;
/// use skewer::url::origin_key;
///
/// let url = Url::parse("http://Example.com:8080/a/b?c").unwrap();
/// assert_eq!(origin_key(&url), "http://example.com:8080");
/// ```
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Returns the robots.txt location for the origin of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    Url::parse(&origin_key(url))
        .and_then(|origin| origin.join("/robots.txt"))
        .ok()
}
