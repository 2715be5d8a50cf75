//! Integration tests for the Courier runtime

use async_trait::async_trait;
use bytes::Bytes;
use courier_compression::{CompressionAlgorithm, CompressionConfig};
use courier_config::ConfigBuilder;
use courier_core::Result;
use courier_runtime::{Handler, Reply, RequestHandler, Router, RuntimeState, ServerBuilder};
use courier_session::{InMemorySessionStore, SessionConfig};
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

struct Counter;

#[async_trait]
impl Handler for Counter {
    async fn call(&self, _request: &Request<Bytes>, reply: &mut Reply) -> Result<()> {
        let visits = reply
            .get_session("visits")
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
            + 1;
        reply.set_session("visits", visits).await?;
        reply.write_json(&serde_json::json!({ "visits": visits }))
    }
}

struct Peek;

#[async_trait]
impl Handler for Peek {
    async fn call(&self, _request: &Request<Bytes>, reply: &mut Reply) -> Result<()> {
        let visits = reply.get_session("visits").await?;
        reply.write_json(&serde_json::json!({ "visits": visits }))
    }
}

struct Logout;

#[async_trait]
impl Handler for Logout {
    async fn call(&self, _request: &Request<Bytes>, reply: &mut Reply) -> Result<()> {
        reply.remove_session().await?;
        reply.redirect("/")
    }
}

struct Large;

#[async_trait]
impl Handler for Large {
    async fn call(&self, _request: &Request<Bytes>, reply: &mut Reply) -> Result<()> {
        reply.write_all(&large_body())?;
        Ok(())
    }
}

struct Chunked;

#[async_trait]
impl Handler for Chunked {
    async fn call(&self, _request: &Request<Bytes>, reply: &mut Reply) -> Result<()> {
        reply.write_all(b"0123456789")?;
        reply.write_all(&large_body())?;
        Ok(())
    }
}

fn large_body() -> Vec<u8> {
    "courier streams this line again and again\n"
        .repeat(50)
        .into_bytes()
}

fn router() -> Router {
    Router::new()
        .route("/counter", Counter)
        .route("/peek", Peek)
        .route("/logout", Logout)
        .route("/large", Large)
        .route("/chunked", Chunked)
}

fn handler_with(store: Arc<InMemorySessionStore>) -> RequestHandler {
    RequestHandler::new(
        Arc::new(router()),
        store,
        CompressionConfig::default(),
        SessionConfig::default(),
    )
}

fn get(path: &str, cookie: Option<&str>) -> Request<Full<Bytes>> {
    let mut builder = Request::builder()
        .uri(path)
        .header(ACCEPT_ENCODING, "gzip, deflate");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Full::default()).unwrap()
}

async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn session_cookie(response: &Response<Full<Bytes>>) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    header.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_session_survives_across_requests() {
    let store = Arc::new(InMemorySessionStore::new());
    let handler = handler_with(Arc::clone(&store));

    let first = handler.handle(get("/counter", None)).await.unwrap();
    let cookie = session_cookie(&first);
    assert!(cookie.starts_with("courier_session="));
    assert_eq!(body_of(first).await, Bytes::from_static(br#"{"visits":1}"#));
    assert_eq!(store.len(), 1);

    let second = handler.handle(get("/counter", Some(&cookie))).await.unwrap();
    assert!(second.headers().get(SET_COOKIE).is_none());
    assert_eq!(body_of(second).await, Bytes::from_static(br#"{"visits":2}"#));

    let peek = handler.handle(get("/peek", Some(&cookie))).await.unwrap();
    assert_eq!(body_of(peek).await, Bytes::from_static(br#"{"visits":2}"#));
}

#[tokio::test]
async fn test_read_without_session_creates_nothing() {
    let store = Arc::new(InMemorySessionStore::new());
    let handler = handler_with(Arc::clone(&store));

    let response = handler.handle(get("/peek", None)).await.unwrap();
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(body_of(response).await, Bytes::from_static(br#"{"visits":null}"#));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unknown_session_cookie_is_ignored() {
    let store = Arc::new(InMemorySessionStore::new());
    let handler = handler_with(Arc::clone(&store));

    let response = handler
        .handle(get("/peek", Some("courier_session=forged")))
        .await
        .unwrap();
    assert_eq!(body_of(response).await, Bytes::from_static(br#"{"visits":null}"#));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_logout_expires_session() {
    let store = Arc::new(InMemorySessionStore::new());
    let handler = handler_with(Arc::clone(&store));

    let first = handler.handle(get("/counter", None)).await.unwrap();
    let cookie = session_cookie(&first);

    let logout = handler.handle(get("/logout", Some(&cookie))).await.unwrap();
    assert_eq!(logout.status(), StatusCode::FOUND);
    assert_eq!(logout.headers().get(LOCATION).unwrap(), "/");
    assert!(store.is_empty());

    let peek = handler.handle(get("/peek", Some(&cookie))).await.unwrap();
    assert_eq!(body_of(peek).await, Bytes::from_static(br#"{"visits":null}"#));
}

#[tokio::test]
async fn test_large_response_is_compressed() {
    let handler = handler_with(Arc::new(InMemorySessionStore::new()));

    let response = handler.handle(get("/large", None)).await.unwrap();
    assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "gzip");
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );

    let compressed = body_of(response).await;
    let mut decoded = Vec::new();
    flate2::read::GzDecoder::new(&compressed[..])
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, large_body());
}

#[tokio::test]
async fn test_small_first_chunk_stays_plain() {
    let handler = handler_with(Arc::new(InMemorySessionStore::new()));

    let response = handler.handle(get("/chunked", None)).await.unwrap();
    assert!(response.headers().get(CONTENT_ENCODING).is_none());

    let body = body_of(response).await;
    assert!(body.starts_with(b"0123456789courier"));
    assert_eq!(body.len(), 10 + large_body().len());
}

#[tokio::test]
async fn test_configured_algorithm_needs_client_support() {
    let handler = RequestHandler::new(
        Arc::new(router()),
        Arc::new(InMemorySessionStore::new()),
        CompressionConfig {
            algorithm: CompressionAlgorithm::Brotli,
            ..Default::default()
        },
        SessionConfig::default(),
    );

    // Client only offers gzip and deflate
    let response = handler.handle(get("/large", None)).await.unwrap();
    assert!(response.headers().get(CONTENT_ENCODING).is_none());
    assert_eq!(body_of(response).await, Bytes::from(large_body()));
}

#[tokio::test]
async fn test_serves_over_tcp() {
    let config = ConfigBuilder::new()
        .shutdown_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let server = Arc::new(
        ServerBuilder::new()
            .config(config)
            .router(router())
            .build()
            .unwrap(),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let running = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve(listener).await })
    };

    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) =
        hyper::client::conn::http1::handshake(hyper_util::rt::TokioIo::new(stream))
            .await
            .unwrap();
    let connection = tokio::spawn(conn);

    let request = Request::builder()
        .uri("/counter")
        .header("host", addr.to_string())
        .body(Full::<Bytes>::default())
        .unwrap();
    let response = sender.send_request(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_some());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body, Bytes::from_static(br#"{"visits":1}"#));

    drop(sender);
    let _ = connection.await;

    assert_eq!(server.request_count(), 1);
    server.shutdown_signal().trigger();
    running.await.unwrap().unwrap();
    assert_eq!(server.state().await, RuntimeState::Stopped);
}
