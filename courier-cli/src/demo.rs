//! Demo handlers served by `courier serve`

use async_trait::async_trait;
use bytes::Bytes;
use courier_core::Result;
use courier_runtime::{Handler, Reply, Router};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request};
use std::io::Write;

/// Routes for the demo server
pub(crate) fn router() -> Router {
    Router::new()
        .route("/", Index)
        .route("/counter", Counter)
        .route("/logout", Logout)
        .route("/large", Large)
}

struct Index;

#[async_trait]
impl Handler for Index {
    async fn call(&self, _request: &Request<Bytes>, reply: &mut Reply) -> Result<()> {
        let visits = reply.get_session("visits").await?;
        reply
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));

        match visits {
            Some(visits) => writeln!(reply, "Welcome back, {visits} visit(s) so far")?,
            None => reply.write_all(b"Hello from courier, try /counter\n")?,
        }
        Ok(())
    }
}

/// Counts visits in the session
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

        let body = serde_json::json!({
            "visits": visits,
            "session": reply.session_key(),
        });
        reply.write_json(&body)
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

/// Body large enough to trigger compression
struct Large;

#[async_trait]
impl Handler for Large {
    async fn call(&self, _request: &Request<Bytes>, reply: &mut Reply) -> Result<()> {
        let lines: String = (0..200)
            .map(|n| format!("line {n:03}: the quick brown fox jumps over the lazy dog\n"))
            .collect();
        reply.write_all(lines.as_bytes())?;
        Ok(())
    }
}
