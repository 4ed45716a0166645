// ============================
// crates/auth-lib/src/remote.rs
// ============================
//! Remote auth-document capability.
use async_trait::async_trait;
use credstore_common::AuthDocument;
use thiserror::Error;

/// Failure reported by a remote document store. Never surfaced to
/// facade callers; the sync engine degrades to local-only instead.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct RemoteError(pub String);

/// Asynchronous, possibly-unavailable store holding the single auth
/// document for this application.
///
/// The engine treats every failure mode the same way: a failed
/// `init`, `ready() == false`, an error, or a timeout all mean
/// "capability unavailable right now".
#[async_trait]
pub trait RemoteDocStore: Send + Sync {
    /// Idempotent setup; may fail.
    async fn init(&self) -> Result<(), RemoteError>;

    /// Readiness check.
    async fn ready(&self) -> bool;

    /// Read the current auth document, if one exists.
    async fn get_auth_document(&self) -> Result<Option<AuthDocument>, RemoteError>;

    /// Write the auth document; returns whether the write was accepted.
    async fn set_auth_document(&self, doc: &AuthDocument) -> Result<bool, RemoteError>;
}
