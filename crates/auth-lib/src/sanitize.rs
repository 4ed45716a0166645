// ============================
// crates/auth-lib/src/sanitize.rs
// ============================
//! Canonicalization of raw user records.
//!
//! This is the single choke point every record passes through on its
//! way into or out of the store: anything kept has a non-empty
//! normalized username, a well-formed credential variant, and a unique
//! key within the batch.
use std::collections::HashSet;

use credstore_common::{normalize_username, Credential, UserRecord};
use serde_json::Value;

/// A record whose username has been read but whose credential has not
/// been validated yet. Deduplication keys on the username alone, so a
/// candidate with an unusable credential still occupies its key.
struct Candidate {
    username: String,
    credential: Option<Credential>,
    created_at: i64,
    updated_at: i64,
}

/// Normalize and deduplicate loosely-typed candidates (untrusted
/// storage, remote documents). Input order of first occurrences is
/// preserved; later duplicates are silently discarded.
pub fn sanitize(raw: &[Value]) -> Vec<UserRecord> {
    dedupe(raw.iter().filter_map(candidate))
}

/// The same scrub-and-dedupe pass over already-typed records, applied
/// on every write so stored data stays canonical.
pub fn sanitize_records(records: impl IntoIterator<Item = UserRecord>) -> Vec<UserRecord> {
    dedupe(records.into_iter().map(|record| Candidate {
        username: record.username,
        credential: Some(record.credential),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }))
}

fn dedupe(candidates: impl Iterator<Item = Candidate>) -> Vec<UserRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates {
        let username = candidate.username.trim().to_string();
        let key = normalize_username(&username);
        if username.is_empty() || key.is_empty() {
            continue;
        }
        // the key is claimed before the credential is checked, so a
        // record dropped here still shadows later duplicates of it
        if !seen.insert(key) {
            continue;
        }
        let Some(credential) = candidate.credential.and_then(usable_credential) else {
            continue;
        };
        out.push(UserRecord {
            username,
            credential,
            created_at: candidate.created_at,
            updated_at: candidate.updated_at,
        });
    }
    out
}

/// Per-variant well-formedness: every field non-empty.
fn usable_credential(credential: Credential) -> Option<Credential> {
    match credential {
        Credential::Legacy { password } if !password.is_empty() => {
            Some(Credential::Legacy { password })
        }
        Credential::Hashed {
            password_hash,
            salt,
        } if !password_hash.is_empty() && !salt.is_empty() => Some(Credential::Hashed {
            password_hash,
            salt,
        }),
        _ => None,
    }
}

/// Loose classification of one candidate object. A non-empty plaintext
/// `password` string wins over hash fields; otherwise both
/// `passwordHash` and `salt` are required, coerced like the username.
fn candidate(value: &Value) -> Option<Candidate> {
    let object = value.as_object()?;

    let credential = if let Some(password) = non_empty_str(object.get("password")) {
        Some(Credential::Legacy {
            password: password.to_string(),
        })
    } else {
        let password_hash = text(object.get("passwordHash"));
        let salt = text(object.get("salt"));
        if password_hash.is_empty() || salt.is_empty() {
            None
        } else {
            Some(Credential::Hashed {
                password_hash,
                salt,
            })
        }
    };

    Some(Candidate {
        username: text(object.get("username")),
        credential,
        created_at: millis(object.get("createdAt")),
        updated_at: millis(object.get("updatedAt")),
    })
}

/// Only a string qualifies here; plaintext passwords are classified
/// strictly by type.
fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

/// Loose string coercion: strings pass through, non-zero numbers and
/// `true` stringify, everything else (zero, `false`, null, absent,
/// containers) reads as empty.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) if number.as_f64() != Some(0.0) => number.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// Lenient timestamp coercion: integers, floats, and numeric strings
/// all count; anything else reads as 0.
fn millis(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or(0),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map(|float| float as i64)
            .unwrap_or(0),
        _ => 0,
    }
}
