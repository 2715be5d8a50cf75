//! HTTP request handler

use async_trait::async_trait;
use bytes::Bytes;
use courier_compression::CompressionConfig;
use courier_core::{Body, Error, Result};
use courier_response::{BufferedTransport, RequestHead, ResponseState};
use courier_session::{SessionAccessor, SessionConfig};
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Response handed to application handlers
pub type Reply = ResponseState<BufferedTransport, dyn SessionAccessor>;

/// Application request handler
///
/// Handlers set status, headers, cookies and session values on the
/// [`Reply`] and write the body. Session write-back and finishing the body
/// are done by the runtime after the handler returns.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle one request
    async fn call(&self, request: &Request<Bytes>, reply: &mut Reply) -> Result<()>;
}

/// Exact-path request router
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Arc<dyn Handler>>,
    fallback: Option<Arc<dyn Handler>>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `path` to `handler`, replacing any earlier handler for it
    pub fn route(mut self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.routes.insert(path.into(), Arc::new(handler));
        self
    }

    /// Handler for paths with no route
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Find the handler for `path`
    pub fn find(&self, path: &str) -> Option<&Arc<dyn Handler>> {
        self.routes.get(path).or(self.fallback.as_ref())
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if no routes are registered
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<_> = self.routes.keys().collect();
        paths.sort();
        f.debug_struct("Router")
            .field("routes", &paths)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Drives one [`Reply`] per request through its lifecycle
#[derive(Clone)]
pub struct RequestHandler {
    router: Arc<Router>,
    sessions: Arc<dyn SessionAccessor>,
    compression: CompressionConfig,
    session_config: SessionConfig,
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("router", &self.router)
            .field("request_count", &self.request_count)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter when a request ends, however it ends
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl RequestHandler {
    /// Create a new request handler
    pub fn new(
        router: Arc<Router>,
        sessions: Arc<dyn SessionAccessor>,
        compression: CompressionConfig,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            router,
            sessions,
            compression,
            session_config,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Total requests handled
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests currently being handled
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Handle an incoming HTTP request
    pub async fn handle<B>(&self, req: Request<B>) -> Result<Response<Body>>
    where
        B: http_body::Body,
        B::Error: fmt::Display,
    {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));
        let start_time = Instant::now();

        let (parts, body) = req.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read request body: {e}")))?
            .to_bytes();
        let head = RequestHead::from_parts(&parts);
        let request = Request::from_parts(parts, body_bytes);

        let method = request.method().clone();
        let path = request.uri().path().to_string();
        debug!(method = %method, path = %path, "Handling request");

        let mut reply = ResponseState::builder(BufferedTransport::new(), Arc::clone(&self.sessions))
            .request(head)
            .compression(self.compression.clone())
            .session(self.session_config.clone())
            .build();

        match self.router.find(&path) {
            Some(handler) => {
                if let Err(e) = handler.call(&request, &mut reply).await {
                    self.handler_failed(&mut reply, &e)?;
                }
            }
            None => {
                debug!(path = %path, "No route found");
                reply.set_status(StatusCode::NOT_FOUND);
                reply.write_all(b"Not Found")?;
            }
        }

        if let Err(e) = reply.update_session().await {
            warn!(path = %path, error = %e, "Failed to persist session");
        }
        reply.finish()?;

        let status = reply.status();
        let compressed = reply.is_compressing();
        let response = reply.into_transport().into_response();

        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            compressed,
            latency_ms = %start_time.elapsed().as_millis(),
            "Request completed"
        );

        Ok(response)
    }

    /// Turn a handler error into an error body when nothing was sent yet
    fn handler_failed(&self, reply: &mut Reply, e: &Error) -> Result<()> {
        if reply.is_started() {
            error!(error = %e, "Handler failed after response head was sent");
            return Ok(());
        }

        let status = e.to_status_code();
        error!(error = %e, status = status.as_u16(), "Handler failed");
        reply.set_status(status);
        reply.write_all(status.canonical_reason().unwrap_or("Error").as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_session::InMemorySessionStore;
    use http_body_util::Full;

    struct Hello;

    #[async_trait]
    impl Handler for Hello {
        async fn call(&self, _request: &Request<Bytes>, reply: &mut Reply) -> Result<()> {
            reply.write_all(b"hello")?;
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Handler for Failing {
        async fn call(&self, _request: &Request<Bytes>, _reply: &mut Reply) -> Result<()> {
            Err(Error::InvalidRequest("missing field".to_string()))
        }
    }

    fn create_test_handler(router: Router) -> RequestHandler {
        RequestHandler::new(
            Arc::new(router),
            Arc::new(InMemorySessionStore::new()),
            CompressionConfig::default(),
            SessionConfig::default(),
        )
    }

    fn get(path: &str) -> Request<Full<Bytes>> {
        Request::builder().uri(path).body(Full::default()).unwrap()
    }

    #[test]
    fn test_router_lookup() {
        let router = Router::new().route("/", Hello).route("/fail", Failing);
        assert_eq!(router.len(), 2);
        assert!(router.find("/").is_some());
        assert!(router.find("/missing").is_none());

        let router = router.fallback(Hello);
        assert!(router.find("/missing").is_some());
    }

    #[tokio::test]
    async fn test_routes_request() {
        let handler = create_test_handler(Router::new().route("/", Hello));
        let response = handler.handle(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"hello"));
        assert_eq!(handler.request_count(), 1);
        assert_eq!(handler.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let handler = create_test_handler(Router::new());
        let response = handler.handle(get("/nowhere")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handler_error_maps_to_status() {
        let handler = create_test_handler(Router::new().route("/fail", Failing));
        let response = handler.handle(get("/fail")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"Bad Request"));
    }
}
