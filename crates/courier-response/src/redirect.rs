//! Redirect target resolution

use http::Uri;
use url::Url;

/// Resolve a redirect target against the request URI
///
/// Absolute URLs and network-path references pass through untouched.
/// Anything else is joined onto the request path, with `.` and `..`
/// segments removed.
pub(crate) fn resolve_location(request_uri: &Uri, location: &str) -> String {
    if location.starts_with("//") || Url::parse(location).is_ok() {
        return location.to_string();
    }

    let joined = Url::parse(&format!("http://localhost{}", request_uri.path()))
        .and_then(|base| base.join(location));
    let Ok(url) = joined else {
        return location.to_string();
    };

    let mut resolved = url.path().to_string();
    if let Some(query) = url.query() {
        resolved.push('?');
        resolved.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        resolved.push('#');
        resolved.push_str(fragment);
    }
    resolved
}

/// Escape text for an HTML attribute
pub(crate) fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
