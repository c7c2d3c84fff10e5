use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL into the form used for frontier deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https` schemes (the scheme itself is kept)
/// 3. Require a host; the `url` crate lowercases it
/// 4. Drop user info and the fragment
/// 5. Empty path becomes `/`; a trailing slash is removed from any other path
/// 6. Keep the query string verbatim, parameter order included
///
/// Two URLs are the same page exactly when their normalized strings are equal.
///
/// # Examples
///
/// ```
/// use harvester::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/docs/#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_username("")
        .and_then(|()| url.set_password(None))
        .map_err(|()| UrlError::Parse(format!("cannot strip credentials from {}", url_str)))?;
    url.set_fragment(None);

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Removes the trailing slash from a non-root path
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    if path.len() > 1 && path.ends_with('/') {
        path[..path.len() - 1].to_string()
    } else {
        path.to_string()
    }
}
