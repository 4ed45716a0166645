// ============================
// crates/auth-lib/src/auth/mod.rs
// ============================
//! Authentication: credential hashing, login sessions, and the public
//! facade consumed by the presentation layer.

pub mod password;
pub mod service;
pub mod session;

pub use service::AuthService;
pub use session::SessionManager;
