// ================
// common/src/lib.rs
// ================
//! Shared data types for the credstore credential store.
//! These are the JSON shapes persisted locally and exchanged with the
//! remote auth document, so every wire name is fixed here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema version stamped on every pushed auth document
pub const SCHEMA_VERSION: u32 = 1;

/// Trimmed, lowercased form of a username; the unique record key.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// A stored credential.
///
/// `Legacy` is transitional plaintext awaiting migration to a salted
/// digest. Variant order matters: untagged deserialization tries
/// `Legacy` first, so a record carrying both a plaintext password and
/// hash fields reads back as `Legacy`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Credential {
    /// Plaintext password, must not persist once migrated
    Legacy { password: String },
    /// Salted one-way digest, both fields hex-encoded
    Hashed {
        #[serde(rename = "passwordHash")]
        password_hash: String,
        salt: String,
    },
}

/// One user record in the credential store
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Display form of the username
    pub username: String,
    /// Legacy or hashed credential, flattened into the record object
    #[serde(flatten)]
    pub credential: Credential,
    /// Epoch milliseconds, set once at creation
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    /// Epoch milliseconds, bumped on every credential mutation
    #[serde(rename = "updatedAt", default)]
    pub updated_at: i64,
}

impl UserRecord {
    /// The unique key this record is deduplicated and merged under.
    pub fn normalized_username(&self) -> String {
        normalize_username(&self.username)
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self.credential, Credential::Legacy { .. })
    }
}

/// The whole record set plus its version timestamp.
///
/// Field order is significant: this struct's serialization is the
/// canonical form compared to decide whether a remote push is needed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub users: Vec<UserRecord>,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

/// Wire shape of the remote auth document.
///
/// `users` stays raw JSON on the way in; the core sanitizes it before
/// anything else touches it.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AuthDocument {
    #[serde(default)]
    pub schema: u32,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: i64,
    #[serde(default)]
    pub users: Vec<Value>,
}

/// A time-bounded login session. One slot per device, not per user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}
