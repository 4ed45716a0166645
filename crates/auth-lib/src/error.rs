// crates/auth-lib/src/error.rs

//! Central error type for the credential store.
use thiserror::Error;

use crate::storage::StorageError;

/// Expected failures of the auth facade.
///
/// The type is `Clone` so an outcome can flow through the shared
/// in-flight sync future to every coalesced caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login failure, deliberately indistinguishable between an unknown
    /// username and a wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Password-change target does not exist
    #[error("user not found")]
    UserNotFound,

    /// Password-change verification of the current password failed
    #[error("current password is incorrect")]
    IncorrectPassword,

    /// First-user setup attempted while a user already exists
    #[error("login is already set up")]
    AlreadyInitialized,

    /// Rejected input, message suitable for display
    #[error("{0}")]
    Validation(String),

    /// Local key-value storage failed; there is no degraded mode
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Locally stored data could not be serialized
    #[error("invalid stored data: {0}")]
    Data(String),
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Data(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_mismatch_has_one_message() {
        // unknown user and wrong password both surface this exact text
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid username or password"
        );
    }

    #[test]
    fn validation_message_passes_through() {
        let err = AuthError::validation("username is too long");
        assert_eq!(err.to_string(), "username is too long");
    }
}
