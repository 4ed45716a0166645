// ============================
// crates/auth-lib/src/merge.rs
// ============================
//! Last-write-wins merge of local and remote record sets.
use std::collections::HashMap;

use credstore_common::UserRecord;

/// Combine two record sets into one, keyed by normalized username.
///
/// Local records are inserted first, then remote ones; a record
/// replaces the incumbent for its key iff its `updated_at` is greater
/// than or equal to the incumbent's. The non-strict comparison means
/// equal timestamps favor the remote copy. Both sides usually carry
/// the same timestamp after a successful sync and stored data relies
/// on this tie-break, so it must not be tightened to a strict compare.
pub fn merge(local: &[UserRecord], remote: &[UserRecord]) -> Vec<UserRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<UserRecord> = Vec::new();
    for record in local.iter().chain(remote) {
        let key = record.normalized_username();
        if key.is_empty() {
            continue;
        }
        match index.get(&key) {
            Some(&slot) => {
                if record.updated_at >= out[slot].updated_at {
                    out[slot] = record.clone();
                }
            }
            None => {
                index.insert(key, out.len());
                out.push(record.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::sanitize_records;
    use credstore_common::Credential;

    fn record(username: &str, hash: &str, updated_at: i64) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            credential: Credential::Hashed {
                password_hash: hash.to_string(),
                salt: "cd".to_string(),
            },
            created_at: 1,
            updated_at,
        }
    }

    #[test]
    fn self_merge_is_identity() {
        let set = vec![record("a", "h1", 100), record("b", "h2", 200)];
        let merged = merge(&set, &set);
        assert_eq!(merged, sanitize_records(set));
    }

    #[test]
    fn remote_wins_on_equal_timestamps() {
        let local = vec![record("admin", "local", 100)];
        let remote = vec![record("Admin", "remote", 100)];
        let merged = merge(&local, &remote);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].credential,
            Credential::Hashed {
                password_hash: "remote".to_string(),
                salt: "cd".to_string()
            }
        );
        // the winner carries its own display form
        assert_eq!(merged[0].username, "Admin");
    }

    #[test]
    fn newer_local_beats_older_remote() {
        let local = vec![record("admin", "local", 200)];
        let remote = vec![record("admin", "remote", 100)];
        let merged = merge(&local, &remote);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].credential,
            Credential::Hashed {
                password_hash: "local".to_string(),
                salt: "cd".to_string()
            }
        );
    }

    #[test]
    fn disjoint_sets_union() {
        let local = vec![record("a", "h1", 10)];
        let remote = vec![record("b", "h2", 20)];
        let merged = merge(&local, &remote);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].username, "a");
        assert_eq!(merged[1].username, "b");
    }
}
