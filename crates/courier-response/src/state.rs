//! Per-request response state machine

use crate::redirect::{html_escape, resolve_location};
use crate::request::RequestHead;
use crate::transport::Transport;
use courier_compression::{CompressionConfig, CompressionRelay, StreamEncoder};
use courier_core::{detect_content_type, json_content_type, set_cookie_header, Cookie, Error, Result};
use courier_session::{SessionAccessor, SessionConfig, SessionData};
use http::header::{
    CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, SET_COOKIE, VARY,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Where body bytes go once the head is committed
enum BodyWriter<W: Write> {
    /// Head not committed yet
    Pending,
    /// Bytes go straight to the transport
    Raw(W),
    /// Bytes go through the encoder, whose output the relay forwards
    Compressed(StreamEncoder<CompressionRelay<W>>),
    /// `finish` ran
    Closed,
}

/// Session bookkeeping for one request
#[derive(Debug, Default)]
pub(crate) struct SessionSlot {
    /// Key addressing the backend row; `None` when no session is bound
    pub(crate) key: Option<String>,
    pub(crate) cache: SessionData,
    /// The cache holds the backend row (or a fresh empty row)
    pub(crate) fetched: bool,
    /// The cache changed and must be stored
    pub(crate) dirty: bool,
    /// The key was minted during this request and needs a cookie
    pub(crate) key_minted: bool,
    /// `update_session` already ran
    pub(crate) persisted: bool,
}

/// Deferred-commit HTTP response for one request
///
/// Status and headers stay buffered until the first body write. That write
/// decides, once, whether the body is compressed, binds a freshly minted
/// session key as a cookie, and commits the head to the transport. Session
/// values are read from the backend at most once and written back at most
/// once, by [`update_session`](Self::update_session).
///
/// One instance serves one request and is never shared between tasks.
pub struct ResponseState<T: Transport, S: SessionAccessor + ?Sized> {
    transport: T,
    request: RequestHead,
    status: StatusCode,
    started: bool,
    compression: CompressionConfig,
    compression_allowed: bool,
    compression_active: bool,
    body: BodyWriter<T::Sink>,
    pub(crate) sessions: Arc<S>,
    pub(crate) session_config: SessionConfig,
    pub(crate) session: SessionSlot,
}

impl<T: Transport, S: SessionAccessor + ?Sized> ResponseState<T, S> {
    /// Start building a response over `transport` backed by `sessions`
    pub fn builder(transport: T, sessions: Arc<S>) -> ResponseStateBuilder<T, S> {
        ResponseStateBuilder::new(transport, sessions)
    }

    /// Buffered status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Buffer a status code for the upcoming commit
    ///
    /// Has no effect once the head has been committed.
    pub fn set_status(&mut self, status: StatusCode) {
        if self.started {
            debug!(
                status = status.as_u16(),
                committed = self.status.as_u16(),
                "Status change after commit ignored"
            );
            return;
        }
        self.status = status;
    }

    /// Whether the head has been committed
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the body is being compressed
    pub fn is_compressing(&self) -> bool {
        self.compression_active
    }

    /// The request this response answers
    pub fn request(&self) -> &RequestHead {
        &self.request
    }

    /// Pending response headers
    pub fn headers(&self) -> &HeaderMap {
        self.transport.headers()
    }

    /// Mutable pending response headers
    ///
    /// Changes made after the first write are not sent.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.transport.headers_mut()
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Take back the transport; call [`finish`](Self::finish) first
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Write body bytes, committing the head on the first call
    ///
    /// The first call decides compression from its own length alone, so a
    /// response whose first chunk is small is never compressed, however large
    /// later chunks are. The head is committed at most once, even when that
    /// first call fails.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.started {
            let committed = self.start(buf);
            self.started = true;
            committed?;
        }

        match &mut self.body {
            BodyWriter::Raw(sink) => sink.write(buf),
            BodyWriter::Compressed(encoder) => encoder.write(buf),
            BodyWriter::Pending => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "response head was not committed",
            )),
            BodyWriter::Closed => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response already finished",
            )),
        }
    }

    fn start(&mut self, first: &[u8]) -> io::Result<()> {
        let already_encoded = self.transport.headers().contains_key(CONTENT_ENCODING);
        let compress = self.compression_allowed
            && !already_encoded
            && self.compression.should_compress(first.len());

        self.bind_session_cookie();

        if !first.is_empty() && !self.transport.headers().contains_key(CONTENT_TYPE) {
            self.transport.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static(detect_content_type(first)),
            );
        }

        if !compress {
            let sink = self.transport.commit(self.status)?;
            trace!(status = self.status.as_u16(), "Response head committed");
            self.body = BodyWriter::Raw(sink);
            return Ok(());
        }

        let algorithm = self.compression.algorithm;
        self.compression_active = true;
        let headers = self.transport.headers_mut();
        headers.insert(
            CONTENT_ENCODING,
            HeaderValue::from_static(algorithm.encoding_name()),
        );
        headers.remove(CONTENT_LENGTH);
        if self.compression.negotiate {
            headers.append(VARY, HeaderValue::from_static("accept-encoding"));
        }
        debug!(
            algorithm = %algorithm,
            first_write = first.len(),
            threshold = self.compression.threshold,
            "Compression activated"
        );

        let sink = self.transport.commit(self.status)?;
        trace!(status = self.status.as_u16(), "Response head committed");
        let encoder = StreamEncoder::new(
            algorithm,
            self.compression.effective_level(),
            CompressionRelay::new(sink),
        )?;
        self.body = BodyWriter::Compressed(encoder);
        Ok(())
    }

    /// Attach the session cookie for a key minted during this request
    ///
    /// Best effort: a cookie that cannot be encoded is logged and skipped so
    /// the body still goes out.
    fn bind_session_cookie(&mut self) {
        if !self.session.key_minted {
            return;
        }
        let Some(key) = self.session.key.as_deref() else {
            return;
        };

        let cookie = self
            .session_config
            .cookie
            .cookie(self.session_config.cookie_name.as_str(), key);
        match set_cookie_header(&cookie) {
            Ok(value) => {
                self.transport.headers_mut().append(SET_COOKIE, value);
                debug!(cookie = %self.session_config.cookie_name, "Session cookie bound");
            }
            Err(e) => {
                warn!(error = %e, cookie = %self.session_config.cookie_name, "Failed to bind session cookie");
            }
        }
    }

    /// End the response
    ///
    /// Commits an empty body if nothing was written, and writes the encoder
    /// trailer if the body is compressed. Later writes fail.
    pub fn finish(&mut self) -> io::Result<()> {
        if !self.started {
            self.write(&[])?;
        }

        match std::mem::replace(&mut self.body, BodyWriter::Closed) {
            BodyWriter::Compressed(encoder) => {
                let relay = encoder.finish()?;
                trace!(compressed_bytes = relay.bytes_forwarded(), "Compressed body finished");
                relay.into_inner().flush()
            }
            BodyWriter::Raw(mut sink) => sink.flush(),
            BodyWriter::Pending | BodyWriter::Closed => Ok(()),
        }
    }

    /// Serialize `value` as the JSON body
    ///
    /// `Content-Type` becomes `application/json`, keeping the charset sniffed
    /// from the encoded bytes. Nothing is written if encoding fails.
    pub fn write_json<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<()> {
        let body = serde_json::to_vec(value)?;
        let content_type = HeaderValue::from_str(&json_content_type(&body))?;
        self.transport.headers_mut().insert(CONTENT_TYPE, content_type);
        self.write_all(&body)?;
        Ok(())
    }

    /// Answer with `302 Found` pointing at `location`
    ///
    /// Relative locations resolve against the request path. The head is
    /// committed immediately.
    pub fn redirect(&mut self, location: &str) -> Result<()> {
        if self.started {
            return Err(Error::HeadersCommitted("redirect"));
        }

        let target = resolve_location(&self.request.uri, location);
        let is_get = self.request.method == Method::GET;
        let is_head = self.request.method == Method::HEAD;

        let headers = self.transport.headers_mut();
        headers.insert(LOCATION, HeaderValue::from_str(&target)?);
        let had_content_type = headers.contains_key(CONTENT_TYPE);
        if !had_content_type && (is_get || is_head) {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
        }

        self.status = StatusCode::FOUND;
        debug!(location = %target, "Redirecting");

        if !had_content_type && is_get {
            let body = format!("<a href=\"{}\">Found</a>.\n", html_escape(&target));
            self.write_all(body.as_bytes())?;
        } else {
            self.write(&[])?;
        }
        Ok(())
    }

    /// Add a `Set-Cookie` header
    pub fn set_cookie(&mut self, cookie: &Cookie<'_>) -> Result<()> {
        if self.started {
            return Err(Error::HeadersCommitted("set a cookie"));
        }
        let value = set_cookie_header(cookie)?;
        self.transport.headers_mut().append(SET_COOKIE, value);
        Ok(())
    }

    /// Add a plain `name=value` session cookie
    pub fn set_cookie_value(&mut self, name: &str, value: &str) -> Result<()> {
        self.set_cookie(&Cookie::new(name, value))
    }

    /// Tell the client to drop `cookie`
    pub fn remove_cookie(&mut self, mut cookie: Cookie<'_>) -> Result<()> {
        cookie.make_removal();
        self.set_cookie(&cookie)
    }

    /// Tell the client to drop the request cookie called `name`
    ///
    /// Does nothing if the request did not carry that cookie.
    pub fn remove_cookie_by_name(&mut self, name: &str) -> Result<()> {
        match self.request.cookie(name) {
            Some(cookie) => self.remove_cookie(cookie),
            None => Ok(()),
        }
    }
}

impl<T: Transport, S: SessionAccessor + ?Sized> Write for ResponseState<T, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ResponseState::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.body {
            BodyWriter::Raw(sink) => sink.flush(),
            BodyWriter::Compressed(encoder) => encoder.flush(),
            BodyWriter::Pending | BodyWriter::Closed => Ok(()),
        }
    }
}

impl<T: Transport, S: SessionAccessor + ?Sized> fmt::Debug for ResponseState<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseState")
            .field("status", &self.status)
            .field("started", &self.started)
            .field("compression_active", &self.compression_active)
            .field("session_bound", &self.session.key.is_some())
            .field("session_dirty", &self.session.dirty)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ResponseState`]
pub struct ResponseStateBuilder<T: Transport, S: SessionAccessor + ?Sized> {
    transport: T,
    sessions: Arc<S>,
    request: RequestHead,
    compression: CompressionConfig,
    session_config: SessionConfig,
    session_key: Option<String>,
}

impl<T: Transport, S: SessionAccessor + ?Sized> ResponseStateBuilder<T, S> {
    fn new(transport: T, sessions: Arc<S>) -> Self {
        Self {
            transport,
            sessions,
            request: RequestHead::default(),
            compression: CompressionConfig::default(),
            session_config: SessionConfig::default(),
            session_key: None,
        }
    }

    /// Request this response answers
    pub fn request(mut self, request: RequestHead) -> Self {
        self.request = request;
        self
    }

    /// Compression settings
    pub fn compression(mut self, config: CompressionConfig) -> Self {
        self.compression = config;
        self
    }

    /// Session settings
    pub fn session(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Bind a session key explicitly instead of reading the request cookie
    pub fn session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    /// Build the response state
    pub fn build(self) -> ResponseState<T, S> {
        let session_key = self
            .session_key
            .or_else(|| {
                self.request
                    .cookie(&self.session_config.cookie_name)
                    .map(|cookie| cookie.value_trimmed().to_string())
            })
            .filter(|key| !key.is_empty());

        let compression_allowed = self.compression.enabled
            && (!self.compression.negotiate
                || self
                    .compression
                    .algorithm
                    .accepted_by(self.request.accept_encoding()));

        ResponseState {
            transport: self.transport,
            request: self.request,
            status: StatusCode::OK,
            started: false,
            compression: self.compression,
            compression_allowed,
            compression_active: false,
            body: BodyWriter::Pending,
            sessions: self.sessions,
            session_config: self.session_config,
            session: SessionSlot {
                key: session_key,
                ..SessionSlot::default()
            },
        }
    }
}

impl<T: Transport, S: SessionAccessor + ?Sized> fmt::Debug for ResponseStateBuilder<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStateBuilder")
            .field("request", &self.request)
            .field("compression", &self.compression)
            .field("session_config", &self.session_config)
            .finish_non_exhaustive()
    }
}
