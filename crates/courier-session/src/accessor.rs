//! Session backend contract

use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Values stored in one session row
pub type SessionData = HashMap<String, serde_json::Value>;

/// Session backend contract
///
/// Any keyed store can back sessions by implementing these four operations.
/// Implementations must make each per-key operation appear atomic; callers
/// never lock around them.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait SessionAccessor: Send + Sync + 'static {
    /// Load the full row for `key`
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) if the key is
    /// absent or expired.
    async fn fetch(&self, key: &str) -> Result<SessionData>;

    /// Generate a fresh, unused session key
    async fn mint_key(&self) -> Result<String>;

    /// Overwrite the row for `key` and set its lifetime
    async fn store(&self, key: &str, data: &SessionData, ttl: Duration) -> Result<()>;

    /// Extend the lifetime of `key` without touching its contents
    ///
    /// A zero `ttl` expires the row immediately.
    async fn refresh_ttl(&self, key: &str, ttl: Duration) -> Result<()>;
}
