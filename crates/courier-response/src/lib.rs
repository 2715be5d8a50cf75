//! # Courier Response
//!
//! Per-request response decorator. A [`ResponseState`] wraps a raw
//! [`Transport`] and:
//! - buffers status and headers until the first body write,
//! - switches the body to a compressed encoding when that first write is
//!   large enough,
//! - caches session values, reading the backend at most once and writing it
//!   back at most once per request.
//!
//! ## Example
//!
//! ```rust
//! use courier_response::{BufferedTransport, ResponseState};
//! use courier_session::InMemorySessionStore;
//! use http::StatusCode;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> courier_core::Result<()> {
//!     let store = Arc::new(InMemorySessionStore::new());
//!     let mut response = ResponseState::builder(BufferedTransport::new(), store).build();
//!
//!     response.set_status(StatusCode::CREATED);
//!     response.set_session("user", "alice").await?;
//!     response.write_json(&serde_json::json!({"created": true}))?;
//!     response.update_session().await?;
//!     response.finish()?;
//!
//!     let transport = response.into_transport();
//!     assert_eq!(transport.status(), Some(StatusCode::CREATED));
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod redirect;
mod request;
mod session;
mod state;
mod transport;

pub use request::RequestHead;
pub use state::{ResponseState, ResponseStateBuilder};
pub use transport::{BufferSink, BufferedTransport, Transport};
