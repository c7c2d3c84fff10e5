//! URL handling module for Harvester
//!
//! This module provides the normalization used for frontier deduplication and
//! the host scoping that keeps a crawl on its seed site.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Returns the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use harvester::url::host_of;
///
/// let url = Url::parse("https://Docs.Example.com/path").unwrap();
/// assert_eq!(host_of(&url), Some("docs.example.com".to_string()));
/// ```
pub fn host_of(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a URL belongs to the crawl scope host
///
/// The comparison is case-insensitive and ignores scheme and port, so
/// `http://example.com` and `https://example.com:8443` share a scope.
pub fn is_same_host(url: &Url, scope_host: &str) -> bool {
    url.host_str()
        .map(|host| host.eq_ignore_ascii_case(scope_host))
        .unwrap_or(false)
}
