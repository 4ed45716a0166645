// ============================
// crates/auth-lib/src/sync.rs
// ============================
//! Sync orchestration: migrate, pull, merge, push, with request
//! coalescing so concurrent callers share one in-flight pass.
use std::{sync::Arc, time::Duration};

use credstore_common::{AuthDocument, StoreSnapshot, SCHEMA_VERSION};
use futures_util::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use parking_lot::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{
    auth::password,
    error::AuthError,
    merge::merge,
    now_millis,
    remote::RemoteDocStore,
    sanitize,
    storage::UserStore,
};

type SharedSync = Shared<BoxFuture<'static, Result<(), AuthError>>>;

/// Drives the migrate -> pull -> merge -> push cycle.
///
/// Two coalescing slots hold shared in-flight futures rather than
/// flags: `in_flight` is cleared by the running pass on completion so
/// the next call starts fresh work, while `first_sync` is set once and
/// kept, making the first outcome sticky for [`SyncEngine::ready`].
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    users: UserStore,
    remote: Option<Arc<dyn RemoteDocStore>>,
    remote_timeout: Duration,
    in_flight: Mutex<Option<SharedSync>>,
    first_sync: Mutex<Option<SharedSync>>,
}

impl SyncEngine {
    pub fn new(
        users: UserStore,
        remote: Option<Arc<dyn RemoteDocStore>>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                users,
                remote,
                remote_timeout,
                in_flight: Mutex::new(None),
                first_sync: Mutex::new(None),
            }),
        }
    }

    /// Run one synchronization pass. Callers arriving while a pass is
    /// in flight attach to it and receive the same outcome.
    pub async fn sync_now(&self) -> Result<(), AuthError> {
        self.share().await
    }

    /// Ensure at least one pass has completed. Every waiter shares the
    /// first invocation's result; it is never re-run from here.
    pub async fn ready(&self) -> Result<(), AuthError> {
        let handle = {
            let mut slot = self.inner.first_sync.lock();
            match slot.as_ref() {
                Some(handle) => handle.clone(),
                None => {
                    let handle = self.share();
                    *slot = Some(handle.clone());
                    handle
                }
            }
        };
        handle.await
    }

    /// Clone the in-flight handle, or start a new pass if none exists.
    fn share(&self) -> SharedSync {
        let mut slot = self.inner.in_flight.lock();
        if let Some(handle) = slot.as_ref() {
            return handle.clone();
        }
        let inner = Arc::clone(&self.inner);
        let handle: SharedSync = async move {
            let result = inner.run().await;
            // clear the slot so the next call starts fresh work
            *inner.in_flight.lock() = None;
            result
        }
        .boxed()
        .shared();
        *slot = Some(handle.clone());
        handle
    }
}

impl SyncInner {
    async fn run(&self) -> Result<(), AuthError> {
        if let Some(remote) = &self.remote {
            match timeout(self.remote_timeout, remote.init()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "remote init failed, continuing local-only"),
                Err(_) => warn!("remote init timed out, continuing local-only"),
            }
        }

        // upgrade any plaintext credentials before anything leaves the store
        let (migrated, changed) = password::migrate_legacy(self.users.load()?, now_millis());
        if changed {
            debug!(count = migrated.len(), "migrated legacy credentials");
            self.users.save(&migrated, true)?;
        }

        let remote_doc = self.pull().await;
        let remote_users = remote_doc
            .as_ref()
            .map(|doc| sanitize::sanitize(&doc.users))
            .unwrap_or_default();
        let remote_version = remote_doc.as_ref().map(|doc| doc.updated_at).unwrap_or(0);

        let local_users = self.users.load()?;
        let local_version = self.users.version()?;

        let merged = merge(&local_users, &remote_users);
        // wall-clock time is folded in as a floor, so the version never
        // moves backward even when both source versions are stale
        let merged_version = remote_version.max(local_version).max(now_millis());

        self.users.save(&merged, false)?;
        self.users.set_version(merged_version)?;

        let remote_snapshot = StoreSnapshot {
            users: remote_users,
            updated_at: remote_version,
        };
        let merged_snapshot = StoreSnapshot {
            users: merged,
            updated_at: merged_version,
        };
        if canonical(&remote_snapshot)? != canonical(&merged_snapshot)? {
            self.push(&merged_snapshot).await;
        } else {
            debug!("remote already current, skipping push");
        }
        Ok(())
    }

    /// Best-effort remote read; every failure mode collapses to `None`.
    /// The timeout spans the whole exchange, init and readiness checks
    /// included, so a stuck remote cannot stall the pass.
    async fn pull(&self) -> Option<AuthDocument> {
        let remote = self.remote.as_ref()?;
        let attempt = async {
            remote.init().await.ok()?;
            if !remote.ready().await {
                return None;
            }
            match remote.get_auth_document().await {
                Ok(doc) => doc,
                Err(err) => {
                    warn!(error = %err, "remote pull failed");
                    None
                }
            }
        };
        match timeout(self.remote_timeout, attempt).await {
            Ok(doc) => doc,
            Err(_) => {
                warn!("remote pull timed out");
                None
            }
        }
    }

    /// Best-effort remote write; failures are logged and swallowed.
    /// Timed out the same way as [`SyncInner::pull`].
    async fn push(&self, snapshot: &StoreSnapshot) {
        let Some(remote) = self.remote.as_ref() else {
            return;
        };
        let doc = AuthDocument {
            schema: SCHEMA_VERSION,
            updated_at: snapshot.updated_at,
            users: snapshot
                .users
                .iter()
                .filter_map(|user| serde_json::to_value(user).ok())
                .collect(),
        };
        let attempt = async {
            if remote.init().await.is_err() {
                return;
            }
            if !remote.ready().await {
                warn!("remote not ready, skipping push");
                return;
            }
            match remote.set_auth_document(&doc).await {
                Ok(true) => debug!(users = doc.users.len(), "pushed auth document"),
                Ok(false) => warn!("remote rejected auth document"),
                Err(err) => warn!(error = %err, "remote push failed"),
            }
        };
        if timeout(self.remote_timeout, attempt).await.is_err() {
            warn!("remote push timed out");
        }
    }
}

fn canonical(snapshot: &StoreSnapshot) -> Result<String, AuthError> {
    Ok(serde_json::to_string(snapshot)?)
}
