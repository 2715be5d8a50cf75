//! Session façade on [`ResponseState`]
//!
//! The backend is read at most once per request and written at most once,
//! by [`ResponseState::update_session`]. Everything in between works on the
//! local cache.

use crate::state::ResponseState;
use crate::transport::Transport;
use courier_core::Result;
use courier_session::{SessionAccessor, SessionData};
use std::time::Duration;
use tracing::{debug, trace, warn};

impl<T: Transport, S: SessionAccessor + ?Sized> ResponseState<T, S> {
    /// Key of the bound session, if any
    pub fn session_key(&self) -> Option<&str> {
        self.session.key.as_deref()
    }

    /// Read a session value
    ///
    /// Returns `None` without contacting the backend when no session is
    /// bound. The first call fetches the whole row; an absent or expired row
    /// unbinds the session.
    pub async fn get_session(&mut self, name: &str) -> Result<Option<serde_json::Value>> {
        if self.session.key.is_none() {
            return Ok(None);
        }
        if !self.load_session().await? {
            return Ok(None);
        }
        Ok(self.session.cache.get(name).cloned())
    }

    /// Set a session value
    ///
    /// Mints a key when no session is bound; its cookie is attached on the
    /// first body write. The value reaches the backend only through
    /// [`update_session`](Self::update_session).
    pub async fn set_session(
        &mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Result<()> {
        let loaded = self.session.key.is_some() && self.load_session().await?;
        if !loaded {
            self.mint_session().await?;
        }

        self.session.cache.insert(name.into(), value.into());
        self.session.dirty = true;
        Ok(())
    }

    /// Drop the session
    ///
    /// Local state is cleared first, then the backend row is expired. Later
    /// reads see no session and never reach the backend.
    pub async fn remove_session(&mut self) -> Result<()> {
        let key = self.session.key.take();
        self.session.cache = SessionData::new();
        self.session.fetched = false;
        self.session.dirty = false;
        self.session.key_minted = false;

        if let Some(key) = key {
            debug!(session = %key, "Expiring session");
            self.sessions.refresh_ttl(&key, Duration::ZERO).await?;
        }
        Ok(())
    }

    /// Write the session back at the end of the request
    ///
    /// A changed session is stored whole with the configured TTL. A bound
    /// but unchanged session only has its TTL extended. Without a session,
    /// or on a second call, nothing happens.
    pub async fn update_session(&mut self) -> Result<()> {
        if self.session.persisted {
            return Ok(());
        }
        self.session.persisted = true;

        let Some(key) = self.session.key.as_deref() else {
            trace!("No session bound, skipping update");
            return Ok(());
        };
        let ttl = self.session_config.ttl;

        if self.session.dirty {
            trace!(session = %key, values = self.session.cache.len(), "Storing session");
            self.sessions.store(key, &self.session.cache, ttl).await?;
            self.session.dirty = false;
            return Ok(());
        }

        trace!(session = %key, "Refreshing session TTL");
        match self.sessions.refresh_ttl(key, ttl).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(session = %key, "Session expired before refresh");
                self.session.key = None;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Populate the cache from the backend, at most once
    ///
    /// Returns `false` when the row is gone, after unbinding the key.
    async fn load_session(&mut self) -> Result<bool> {
        if self.session.fetched {
            return Ok(true);
        }
        let Some(key) = self.session.key.as_deref() else {
            return Ok(false);
        };

        match self.sessions.fetch(key).await {
            Ok(data) => {
                trace!(session = %key, values = data.len(), "Session fetched");
                self.session.cache = data;
                self.session.fetched = true;
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                debug!(session = %key, "Session not found, unbinding");
                self.session.key = None;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mint_session(&mut self) -> Result<()> {
        let key = self.sessions.mint_key().await?;
        debug!(session = %key, "Minted session key");
        if self.is_started() {
            warn!(session = %key, "Session minted after commit, cookie will not be sent");
        }

        self.session.key = Some(key);
        self.session.cache = SessionData::new();
        self.session.fetched = true;
        self.session.key_minted = true;
        Ok(())
    }
}
