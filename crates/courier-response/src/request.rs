//! Request context kept alongside a response

use courier_core::{request_cookie, Cookie};
use http::header::ACCEPT_ENCODING;
use http::{request, HeaderMap, Method, Request, Uri};

/// Head of the request a response answers
///
/// Redirects resolve relative locations against `uri`, cookie removal looks
/// up the request's cookies, and compression negotiation reads
/// `Accept-Encoding`.
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    /// Request method
    pub method: Method,
    /// Request target
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Create a head with no headers
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
        }
    }

    /// Copy the head of a request
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }

    /// Copy the head from request parts
    pub fn from_parts(parts: &request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }

    /// Look up a request cookie by name
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        request_cookie(&self.headers, name)
    }

    /// Raw `Accept-Encoding` header
    pub fn accept_encoding(&self) -> Option<&str> {
        self.headers
            .get(ACCEPT_ENCODING)
            .and_then(|value| value.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::COOKIE;

    #[test]
    fn test_from_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/login?next=/home")
            .header(COOKIE, "sid=abc123")
            .header(ACCEPT_ENCODING, "gzip, br")
            .body(())
            .unwrap();

        let head = RequestHead::from_request(&request);
        assert_eq!(head.method, Method::POST);
        assert_eq!(head.uri.path(), "/login");
        assert_eq!(head.cookie("sid").unwrap().value(), "abc123");
        assert_eq!(head.accept_encoding(), Some("gzip, br"));
    }

    #[test]
    fn test_default_head() {
        let head = RequestHead::default();
        assert_eq!(head.method, Method::GET);
        assert_eq!(head.uri.path(), "/");
        assert!(head.cookie("sid").is_none());
        assert!(head.accept_encoding().is_none());
    }
}
