// ============================
// crates/auth-lib/src/auth/service.rs
// ============================
//! Public authentication surface consumed by the presentation layer.
//!
//! Every expected failure (validation, credential mismatch) comes back
//! as a typed [`AuthError`] value; nothing here panics for bad input.
use std::{path::Path, sync::Arc, time::Duration};

use credstore_common::{normalize_username, Credential, Session, UserRecord};
use tracing::debug;

use crate::{
    auth::{password, session::SessionManager},
    config::Settings,
    error::AuthError,
    now_millis,
    remote::RemoteDocStore,
    storage::{FlatFileStore, LocalStore, UserStore},
    sync::SyncEngine,
};

/// The credential store's public contract: first-user bootstrap,
/// login, logout, password change, and session queries.
#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
    sessions: SessionManager,
    sync: SyncEngine,
    settings: Settings,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteDocStore>>,
        settings: Settings,
    ) -> Self {
        let users = UserStore::new(Arc::clone(&store), settings.namespace.clone());
        let sessions = SessionManager::new(
            store,
            users.session_key(),
            Duration::from_secs(settings.session_ttl_secs),
            Duration::from_secs(settings.remember_ttl_secs),
        );
        let sync = SyncEngine::new(
            users.clone(),
            remote,
            Duration::from_secs(settings.remote_timeout_secs),
        );
        Self {
            users,
            sessions,
            sync,
            settings,
        }
    }

    /// Convenience constructor backed by the flat-file store, with
    /// settings loaded from the environment.
    pub fn new_default<P: AsRef<Path>>(
        data_dir: P,
        remote: Option<Arc<dyn RemoteDocStore>>,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(FlatFileStore::new(data_dir)?);
        let settings = Settings::load()?;
        Ok(Self::new(store, remote, settings))
    }

    /// Ensure the first synchronization has completed.
    pub async fn ready(&self) -> Result<(), AuthError> {
        self.sync.ready().await
    }

    /// Trigger a synchronization pass (coalesced with any in flight).
    pub async fn sync_now(&self) -> Result<(), AuthError> {
        self.sync.sync_now().await
    }

    pub fn has_users(&self) -> Result<bool, AuthError> {
        Ok(!self.users.load()?.is_empty())
    }

    /// Bootstrap the very first account. Any later account creation is
    /// outside this store's scope.
    pub async fn create_first_user(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<String, AuthError> {
        self.ready().await?;
        let username = username.trim().to_string();
        if self.has_users()? {
            return Err(AuthError::AlreadyInitialized);
        }
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::validation("username and password are required"));
        }
        if password.chars().count() < self.settings.min_password_len {
            return Err(AuthError::validation(format!(
                "password is too short (minimum {} characters)",
                self.settings.min_password_len
            )));
        }
        if password != confirm_password {
            return Err(AuthError::validation("password confirmation does not match"));
        }
        if username.chars().count() > self.settings.max_username_len {
            return Err(AuthError::validation("username is too long"));
        }

        let now = now_millis();
        let salt = password::random_salt();
        let password_hash = password::hash_password(password, &salt);
        let record = UserRecord {
            username: username.clone(),
            credential: Credential::Hashed {
                password_hash,
                salt,
            },
            created_at: now,
            updated_at: now,
        };
        self.users.save(&[record], true)?;
        self.sync_now().await?;
        debug!(username = %username, "created first user");
        Ok(username)
    }

    /// Verify credentials and issue a session carrying the stored
    /// display username. Unknown usernames and wrong passwords are
    /// deliberately indistinguishable in the returned error.
    pub async fn login(
        &self,
        username: &str,
        password_input: &str,
        remember: bool,
    ) -> Result<Session, AuthError> {
        self.ready().await?;
        let normalized = normalize_username(username);
        if normalized.is_empty() || password_input.is_empty() {
            return Err(AuthError::validation("username and password are required"));
        }

        let mut users = self.users.load()?;
        let slot = users
            .iter()
            .position(|user| user.normalized_username() == normalized)
            .ok_or(AuthError::InvalidCredentials)?;
        if !password::verify_credential(&users[slot].credential, password_input) {
            return Err(AuthError::InvalidCredentials);
        }

        let display_name = users[slot].username.clone();
        if users[slot].is_legacy() {
            // opportunistic upgrade now that the plaintext checked out
            let now = now_millis();
            let salt = password::random_salt();
            let password_hash = password::hash_password(password_input, &salt);
            users[slot].credential = Credential::Hashed {
                password_hash,
                salt,
            };
            if users[slot].created_at == 0 {
                users[slot].created_at = now;
            }
            users[slot].updated_at = now;
            self.users.save(&users, true)?;
            self.sync_now().await?;
            debug!(username = %display_name, "migrated legacy credential on login");
        }

        self.sessions.issue(&display_name, remember)
    }

    pub async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.ready().await?;
        let normalized = normalize_username(username);
        if normalized.is_empty() || old_password.is_empty() || new_password.is_empty() {
            return Err(AuthError::validation("all fields are required"));
        }
        if new_password.chars().count() < self.settings.min_password_len {
            return Err(AuthError::validation(format!(
                "new password is too short (minimum {} characters)",
                self.settings.min_password_len
            )));
        }

        let mut users = self.users.load()?;
        let slot = users
            .iter()
            .position(|user| user.normalized_username() == normalized)
            .ok_or(AuthError::UserNotFound)?;
        if !password::verify_credential(&users[slot].credential, old_password) {
            return Err(AuthError::IncorrectPassword);
        }

        let now = now_millis();
        let salt = password::random_salt();
        let password_hash = password::hash_password(new_password, &salt);
        users[slot].credential = Credential::Hashed {
            password_hash,
            salt,
        };
        if users[slot].created_at == 0 {
            users[slot].created_at = now;
        }
        users[slot].updated_at = now;
        self.users.save(&users, true)?;
        self.sync_now().await?;
        Ok(())
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.sessions.revoke()
    }

    pub fn session(&self) -> Result<Option<Session>, AuthError> {
        self.sessions.current()
    }

    pub fn is_logged_in(&self) -> Result<bool, AuthError> {
        Ok(self.session()?.is_some())
    }
}
