//! Response transports
//!
//! A [`Transport`] is the raw response sink underneath [`ResponseState`]:
//! it owns the header map, accepts exactly one status commit, and hands back
//! the byte sink the body is written into.
//!
//! [`ResponseState`]: crate::ResponseState

use bytes::{Bytes, BytesMut};
use courier_core::Body;
use http::{HeaderMap, Response, StatusCode};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Raw HTTP response sink
pub trait Transport {
    /// Body sink returned by [`commit`](Transport::commit)
    type Sink: Write;

    /// Headers that will be sent with the status line
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the pending headers
    ///
    /// Changes made after [`commit`](Transport::commit) are not sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Send the status line and headers and open the body
    ///
    /// Fails if the head was already committed.
    fn commit(&mut self, status: StatusCode) -> io::Result<Self::Sink>;
}

/// Transport that collects the whole response in memory
///
/// Used by the runtime to build a `hyper` response once the handler is
/// done, and by tests to inspect exactly what was committed.
#[derive(Debug, Default)]
pub struct BufferedTransport {
    headers: HeaderMap,
    committed: Option<(StatusCode, HeaderMap)>,
    body: Arc<Mutex<BytesMut>>,
    commits: usize,
}

impl BufferedTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Status sent by the commit, if any
    pub fn status(&self) -> Option<StatusCode> {
        self.committed.as_ref().map(|(status, _)| *status)
    }

    /// Headers sent by the commit, if any
    pub fn committed_headers(&self) -> Option<&HeaderMap> {
        self.committed.as_ref().map(|(_, headers)| headers)
    }

    /// Number of successful head commits
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Copy of the body bytes received so far
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.body.lock())
    }

    /// Build the final response
    ///
    /// A transport that was never committed yields `200 OK` with the pending
    /// headers and an empty body.
    pub fn into_response(self) -> Response<Body> {
        let (status, headers) = self
            .committed
            .unwrap_or((StatusCode::OK, self.headers));
        let body = std::mem::take(&mut *self.body.lock()).freeze();

        let mut response = Response::new(Body::new(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl Transport for BufferedTransport {
    type Sink = BufferSink;

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn commit(&mut self, status: StatusCode) -> io::Result<Self::Sink> {
        if self.committed.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "response head already committed",
            ));
        }

        self.committed = Some((status, self.headers.clone()));
        self.commits += 1;
        Ok(BufferSink {
            body: Arc::clone(&self.body),
        })
    }
}

/// Body sink of a [`BufferedTransport`]
#[derive(Debug, Clone)]
pub struct BufferSink {
    body: Arc<Mutex<BytesMut>>,
}

impl Write for BufferSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;
    use http_body_util::BodyExt;

    #[test]
    fn test_commit_once() {
        let mut transport = BufferedTransport::new();
        assert!(transport.commit(StatusCode::CREATED).is_ok());
        assert!(transport.commit(StatusCode::OK).is_err());
        assert_eq!(transport.commits(), 1);
        assert_eq!(transport.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_headers_snapshot_at_commit() {
        let mut transport = BufferedTransport::new();
        transport
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let _sink = transport.commit(StatusCode::OK).unwrap();
        transport.headers_mut().insert("x-late", HeaderValue::from_static("1"));

        let response = transport.into_response();
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert!(response.headers().get("x-late").is_none());
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let mut transport = BufferedTransport::new();
        let mut sink = transport.commit(StatusCode::ACCEPTED).unwrap();
        sink.write_all(b"hello ").unwrap();
        sink.write_all(b"world").unwrap();
        assert_eq!(transport.body(), Bytes::from_static(b"hello world"));

        let response = transport.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"hello world"));
    }

    #[test]
    fn test_uncommitted_defaults_to_ok() {
        let transport = BufferedTransport::new();
        let response = transport.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
