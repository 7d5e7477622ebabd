//! Flat JSON file of registered users.
//!
//! The whole file is read into memory and rewritten on every mutation. All
//! mutations are serialized through one async lock so concurrent
//! registrations cannot lose each other's writes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use super::StoreError;

/// Persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
}

/// User fields supplied by the caller; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// JSON-array backed user store.
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    // Guards read-modify-write cycles and remembers the last issued id.
    write_lock: Mutex<u64>,
}

impl UserStore {
    /// Creates a store over `path`. The file is created lazily on first insert.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(0),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every user from disk.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// also treated as empty so a damaged file never locks users out of
    /// registration; the problem is logged.
    pub async fn load(&self) -> Vec<User> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<User>>(&bytes) {
                Ok(users) => users,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "User store is not a valid JSON array, treating as empty"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read user store, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Looks up a user by exact email match.
    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.load().await.into_iter().find(|user| user.email == email)
    }

    /// Appends a user, assigning a unique, increasing id.
    ///
    /// Unlike [`UserStore::load`], an unreadable or corrupt file is an error
    /// here: rewriting it would drop every existing record.
    ///
    /// # Errors
    /// - `StoreError::Duplicate` - A user with the same email already exists
    /// - `StoreError::Io` - The file could not be read or written
    /// - `StoreError::Serialize` - The file is not a user array, or the list
    ///   could not be encoded
    /// - `StoreError::IdsExhausted` - The highest stored id is `u64::MAX`
    pub async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut last_id = self.write_lock.lock().await;

        let mut users = self.load_strict().await?;
        if users.iter().any(|user| user.email == new_user.email) {
            return Err(StoreError::Duplicate {
                email: new_user.email,
            });
        }

        let highest_stored = users.iter().map(|user| user.id).max().unwrap_or(0);
        let last = (*last_id).max(highest_stored);
        let id = next_id(now_millis(), last).ok_or(StoreError::IdsExhausted { last })?;

        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
        };
        users.push(user.clone());

        self.persist(&users).await?;
        *last_id = id;

        Ok(user)
    }

    async fn load_strict(&self) -> Result<Vec<User>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrites the whole file through a temp file and rename.
    async fn persist(&self, users: &[User]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(users)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;

        tracing::debug!(path = %self.path.display(), count = users.len(), "User store written");
        Ok(())
    }
}

/// Millisecond timestamp id, bumped past `last` when the clock has not moved.
/// `None` once `last` is `u64::MAX`.
fn next_id(now: u64, last: u64) -> Option<u64> {
    last.checked_add(1).map(|floor| now.max(floor))
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use tempfile::TempDir;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "$2b$10$hash".to_string(),
        }
    }

    #[test]
    fn test_next_id_is_monotonic() {
        assert_eq!(next_id(1_000, 0), Some(1_000));
        assert_eq!(next_id(1_000, 1_000), Some(1_001));
        assert_eq!(next_id(900, 1_000), Some(1_001));
        assert_eq!(next_id(900, u64::MAX), None);
    }

    proptest! {
        #[test]
        fn prop_next_id_always_passes_last(now in any::<u64>(), last in 0..u64::MAX) {
            let id = next_id(now, last).unwrap();
            prop_assert!(id > last);
            prop_assert!(id >= now);
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = UserStore::new(&path);

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_refuses_to_overwrite_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let damaged = r#"[{"id":1,"name":"","email":"old@x.com","passwordHash":"h"},]"#;
        std::fs::write(&path, damaged).unwrap();
        let store = UserStore::new(&path);

        let err = store.insert(new_user("new@x.com")).await.unwrap_err();

        assert!(matches!(err, StoreError::Serialize(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), damaged);
    }

    #[tokio::test]
    async fn test_insert_after_max_id_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            format!(
                r#"[{{"id":{},"name":"","email":"old@x.com","passwordHash":"h"}}]"#,
                u64::MAX
            ),
        )
        .unwrap();
        let store = UserStore::new(&path);

        let err = store.insert(new_user("new@x.com")).await.unwrap_err();

        assert!(matches!(err, StoreError::IdsExhausted { last: u64::MAX }));
        assert_eq!(store.load().await.len(), 1);
        // The lock is released after the failure.
        assert!(store.insert(new_user("old@x.com")).await.is_err());
    }

    #[tokio::test]
    async fn test_insert_persists_with_camel_case_hash_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("users.json");
        let store = UserStore::new(&path);

        let user = store.insert(new_user("a@example.com")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["email"], "a@example.com");
        assert_eq!(raw[0]["passwordHash"], "$2b$10$hash");
        assert_eq!(raw[0]["id"], user.id);
        assert!(!dir.path().join("nested").join("users.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));

        store.insert(new_user("dup@example.com")).await.unwrap();
        let err = store.insert(new_user("dup@example.com")).await.unwrap_err();

        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(store.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(UserStore::new(dir.path().join("users.json")));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(new_user(&format!("u{i}@x.com"))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let users = store.load().await;
        assert_eq!(users.len(), 16);

        let mut ids: Vec<u64> = users.iter().map(|u| u.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 16, "ids must be unique");
    }

    #[tokio::test]
    async fn test_ids_continue_after_existing_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let far_future = u64::MAX / 2;
        std::fs::write(
            &path,
            format!(
                r#"[{{"id":{far_future},"name":"","email":"old@x.com","passwordHash":"h"}}]"#
            ),
        )
        .unwrap();
        let store = UserStore::new(&path);

        let user = store.insert(new_user("new@x.com")).await.unwrap();

        assert_eq!(user.id, far_future + 1);
        assert_eq!(
            store.find_by_email("old@x.com").await.map(|u| u.id),
            Some(far_future)
        );
    }
}
