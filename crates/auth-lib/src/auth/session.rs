// ============================
// crates/auth-lib/src/auth/session.rs
// ============================
//! Persisted login session: a single slot per device.
use std::{sync::Arc, time::Duration};

use credstore_common::Session;
use tracing::debug;

use crate::{error::AuthError, now_millis, storage::LocalStore};

/// Issues, reads, and revokes the device's login session.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn LocalStore>,
    key: String,
    ttl: Duration,
    remember_ttl: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn LocalStore>,
        key: impl Into<String>,
        ttl: Duration,
        remember_ttl: Duration,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            ttl,
            remember_ttl,
        }
    }

    /// Issue a fresh session, replacing any previous one.
    pub fn issue(&self, username: &str, remember: bool) -> Result<Session, AuthError> {
        let now = now_millis();
        let ttl = if remember { self.remember_ttl } else { self.ttl };
        let session = Session {
            username: username.to_string(),
            created_at: now,
            expires_at: now + ttl.as_millis() as i64,
        };
        self.store.set(&self.key, &serde_json::to_string(&session)?)?;
        Ok(session)
    }

    /// The active session, if any. A missing, malformed, or expired
    /// payload reports absent, and the slot is purged as a side effect
    /// of the read.
    pub fn current(&self) -> Result<Option<Session>, AuthError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let parsed = serde_json::from_str::<Session>(&raw)
            .ok()
            .filter(|session| !session.username.is_empty() && session.expires_at > 0);
        let Some(session) = parsed else {
            debug!("clearing malformed session");
            self.store.remove(&self.key)?;
            return Ok(None);
        };
        if now_millis() > session.expires_at {
            debug!(username = %session.username, "clearing expired session");
            self.store.remove(&self.key)?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Delete the persisted session unconditionally.
    pub fn revoke(&self) -> Result<(), AuthError> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}
