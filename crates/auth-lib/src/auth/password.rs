// ============================
// crates/auth-lib/src/auth/password.rs
// ============================
//! Salted password digests and legacy-credential migration.
use credstore_common::{Credential, UserRecord};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Salt length in raw bytes (32 hex characters once encoded)
pub const SALT_LEN: usize = 16;

/// Fresh random salt, hex-encoded.
pub fn random_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hex SHA-256 over `salt|password`.
///
/// A single-pass digest, not a key-derivation function. Existing stored
/// hashes were produced exactly this way and must keep verifying, so no
/// iteration or stretching can be added here without a format migration.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"|");
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    format!("{digest:x}")
}

/// Check a supplied password against either credential variant.
pub fn verify_credential(credential: &Credential, password: &str) -> bool {
    match credential {
        Credential::Legacy { password: stored } => stored == password,
        Credential::Hashed {
            password_hash,
            salt,
        } => hash_password(password, salt) == *password_hash,
    }
}

/// Replace every plaintext credential with a fresh salted digest,
/// preserving `created_at` (backfilled with `now` when unset) and
/// refreshing `updated_at`. Running it again on its own output changes
/// nothing and reports `false`.
pub fn migrate_legacy(records: Vec<UserRecord>, now: i64) -> (Vec<UserRecord>, bool) {
    let mut changed = false;
    let records = records
        .into_iter()
        .map(|record| {
            let UserRecord {
                username,
                credential,
                created_at,
                updated_at,
            } = record;
            match credential {
                Credential::Legacy { password } => {
                    changed = true;
                    let salt = random_salt();
                    let password_hash = hash_password(&password, &salt);
                    UserRecord {
                        username,
                        credential: Credential::Hashed {
                            password_hash,
                            salt,
                        },
                        created_at: if created_at != 0 { created_at } else { now },
                        updated_at: now,
                    }
                }
                credential => UserRecord {
                    username,
                    credential,
                    created_at,
                    updated_at,
                },
            }
        })
        .collect();
    (records, changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_known_vectors() {
        // sha256("somesalt|password123") and sha256("aa|bb")
        assert_eq!(
            hash_password("password123", "somesalt"),
            "f03493fdd43e6a986a2bd5fd3b58a92c3da4b9bff87e50510fc86f903553b291"
        );
        assert_eq!(
            hash_password("bb", "aa"),
            "87da88297abcaddcc49ae639247e2c948656d8a31b985565bfb183ddb0ce8ed4"
        );
    }

    #[test]
    fn salts_are_hex_and_distinct() {
        let a = random_salt();
        let b = random_salt();
        assert_eq!(a.len(), SALT_LEN * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn verify_handles_both_variants() {
        let legacy = Credential::Legacy {
            password: "pw".to_string(),
        };
        assert!(verify_credential(&legacy, "pw"));
        assert!(!verify_credential(&legacy, "nope"));

        let salt = random_salt();
        let hashed = Credential::Hashed {
            password_hash: hash_password("pw", &salt),
            salt,
        };
        assert!(verify_credential(&hashed, "pw"));
        assert!(!verify_credential(&hashed, "nope"));
    }

    #[test]
    fn migration_hashes_legacy_and_is_idempotent() {
        let records = vec![
            UserRecord {
                username: "legacy".to_string(),
                credential: Credential::Legacy {
                    password: "pw".to_string(),
                },
                created_at: 0,
                updated_at: 10,
            },
            UserRecord {
                username: "modern".to_string(),
                credential: Credential::Hashed {
                    password_hash: "ab".to_string(),
                    salt: "cd".to_string(),
                },
                created_at: 5,
                updated_at: 6,
            },
        ];

        let (migrated, changed) = migrate_legacy(records, 1000);
        assert!(changed);
        assert!(migrated.iter().all(|record| !record.is_legacy()));
        // migrated record gets created_at backfilled and updated_at bumped
        assert_eq!(migrated[0].created_at, 1000);
        assert_eq!(migrated[0].updated_at, 1000);
        assert!(verify_credential(&migrated[0].credential, "pw"));
        // untouched record keeps its timestamps
        assert_eq!(migrated[1].created_at, 5);
        assert_eq!(migrated[1].updated_at, 6);

        let (again, changed) = migrate_legacy(migrated.clone(), 2000);
        assert!(!changed);
        assert_eq!(again, migrated);
    }
}
