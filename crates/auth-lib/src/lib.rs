// ============================
// crates/auth-lib/src/lib.rs
// ============================
//! Core engine of the credstore local-first credential store:
//! sanitization, credential hashing and migration, last-write-wins
//! merging, coalesced synchronization, and login sessions.

pub mod auth;
pub mod config;
pub mod error;
pub mod merge;
pub mod remote;
pub mod sanitize;
pub mod storage;
pub mod sync;

pub use auth::AuthService;
pub use config::Settings;
pub use error::AuthError;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
