// ============================
// crates/auth-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Key prefix in the local store
    pub namespace: String,
    /// Minimum accepted password length
    pub min_password_len: usize,
    /// Maximum accepted username length
    pub max_username_len: usize,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    /// Session TTL in seconds when "remember me" is set
    pub remember_ttl_secs: u64,
    /// Timeout for each remote pull/push in seconds
    pub remote_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: "auth".to_string(),
            min_password_len: 4,
            max_username_len: 32,
            session_ttl_secs: 60 * 60 * 12,       // 12 hours
            remember_ttl_secs: 60 * 60 * 24 * 30, // 30 days
            remote_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and `CREDSTORE_`-prefixed
    /// environment variables, layered over the built-in defaults.
    pub fn load() -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("CREDSTORE_"))
            .extract()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_store_policy() {
        let settings = Settings::default();
        assert_eq!(settings.min_password_len, 4);
        assert_eq!(settings.max_username_len, 32);
        assert_eq!(settings.session_ttl_secs, 12 * 60 * 60);
        assert_eq!(settings.remember_ttl_secs, 30 * 24 * 60 * 60);
    }
}
