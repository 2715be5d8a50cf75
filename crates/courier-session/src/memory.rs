//! In-memory session store

use crate::{Error, Result, SessionAccessor, SessionData};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, trace};

/// Row in the in-memory store
#[derive(Debug, Clone)]
struct Entry {
    data: SessionData,
    expires_at: Instant,
}

impl Entry {
    fn new(data: SessionData, ttl: Duration) -> Result<Self> {
        Ok(Self {
            data,
            expires_at: deadline(ttl)?,
        })
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Expiry instant for a row stored now with `ttl`
fn deadline(ttl: Duration) -> Result<Instant> {
    Instant::now()
        .checked_add(ttl)
        .ok_or_else(|| Error::Backend(format!("session ttl {ttl:?} is out of range")))
}

/// In-memory session store
///
/// Fast and dependency free, but sessions live in one process only.
/// Suited to development, tests, and single-node deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    rows: Arc<DashMap<String, Entry>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a background task removing expired rows
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_cleanup(cleanup_interval: Duration) -> Self {
        let store = Self::new();
        let rows = Arc::clone(&store.rows);

        tokio::spawn(async move {
            let mut ticker = interval(cleanup_interval);
            loop {
                ticker.tick().await;
                Self::cleanup_expired(&rows);
            }
        });

        store
    }

    /// Remove expired rows now
    pub fn cleanup(&self) {
        Self::cleanup_expired(&self.rows);
    }

    fn cleanup_expired(rows: &DashMap<String, Entry>) {
        let before = rows.len();
        rows.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(rows.len());

        if removed > 0 {
            debug!(removed, "Cleaned up expired sessions");
        }
    }

    /// Number of rows, expired ones included until cleanup
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl SessionAccessor for InMemorySessionStore {
    async fn fetch(&self, key: &str) -> Result<SessionData> {
        trace!(key, "InMemory FETCH");

        if let Some(entry) = self.rows.get(key) {
            if !entry.is_expired() {
                return Ok(entry.data.clone());
            }
            drop(entry); // Release read lock
            self.rows.remove(key);
        }

        Err(Error::NotFound(key.to_string()))
    }

    async fn mint_key(&self) -> Result<String> {
        loop {
            let key = uuid::Uuid::new_v4().simple().to_string();
            if !self.rows.contains_key(&key) {
                trace!(key = %key, "InMemory MINT");
                return Ok(key);
            }
        }
    }

    async fn store(&self, key: &str, data: &SessionData, ttl: Duration) -> Result<()> {
        trace!(key, ttl_secs = ttl.as_secs(), entries = data.len(), "InMemory STORE");

        if ttl.is_zero() {
            self.rows.remove(key);
            return Ok(());
        }

        let entry = Entry::new(data.clone(), ttl)?;
        self.rows.insert(key.to_string(), entry);
        Ok(())
    }

    async fn refresh_ttl(&self, key: &str, ttl: Duration) -> Result<()> {
        trace!(key, ttl_secs = ttl.as_secs(), "InMemory REFRESH");

        if ttl.is_zero() {
            self.rows.remove(key);
            return Ok(());
        }

        match self.rows.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.expires_at = deadline(ttl)?;
                Ok(())
            }
            _ => Err(Error::NotFound(key.to_string())),
        }
    }
}
