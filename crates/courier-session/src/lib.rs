//! # Courier Sessions
//!
//! The backend contract behind Courier's per-response session cache.
//!
//! A backend only needs to answer four questions: what is stored under a
//! key, give me a new key, overwrite a key, and extend (or end) a key's
//! lifetime. The response layer issues at most one read and one write per
//! key per request.
//!
//! ## Example
//!
//! ```rust
//! use courier_session::{InMemorySessionStore, SessionAccessor, SessionData};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> courier_session::Result<()> {
//!     let store = InMemorySessionStore::new();
//!     let key = store.mint_key().await?;
//!
//!     let mut data = SessionData::new();
//!     data.insert("user".to_string(), serde_json::json!("alice"));
//!     store.store(&key, &data, Duration::from_secs(3600)).await?;
//!
//!     assert_eq!(store.fetch(&key).await?, data);
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

mod accessor;
mod config;
mod error;

#[cfg(feature = "inmemory")]
mod memory;

pub use accessor::{SessionAccessor, SessionData};
pub use config::{SessionConfig, MAX_TTL};
pub use error::{Error, Result};

#[cfg(feature = "mock")]
pub use accessor::MockSessionAccessor;

#[cfg(feature = "inmemory")]
pub use memory::InMemorySessionStore;
