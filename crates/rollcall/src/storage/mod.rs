//! Storage layer for rollcall.
//!
//! A small `SQLite` key-value store. The only value rollcall writes is the
//! registered [`UserProfile`], serialised as JSON under [`PROFILE_KEY`].

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::profile::{ProfileStore, UserProfile, PROFILE_KEY};

/// `SQLite`-backed key-value storage.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is written.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
            (key, value, Utc::now().to_rfc3339()),
        )?;
        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }

    /// Delete `key`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(deleted > 0)
    }
}

impl ProfileStore for Storage {
    fn get(&self) -> Result<Option<UserProfile>> {
        let Some(raw) = self.get_item(PROFILE_KEY)? else {
            return Ok(None);
        };
        let profile = serde_json::from_str(&raw)
            .map_err(|e| Error::corrupt_profile(PROFILE_KEY, e.to_string()))?;
        Ok(Some(profile))
    }

    fn set(&self, profile: &UserProfile) -> Result<()> {
        let raw = serde_json::to_string(profile)?;
        self.set_item(PROFILE_KEY, &raw)?;
        info!("Saved profile for {}", profile.name());
        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        self.remove_item(PROFILE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn ada() -> UserProfile {
        UserProfile::new("5551234567", "Ada").unwrap()
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.path(), Path::new(":memory:"));
    }

    #[test]
    fn test_no_profile_initially() {
        let storage = create_test_storage();
        assert!(storage.get().unwrap().is_none());
    }

    #[test]
    fn test_profile_round_trip() {
        let storage = create_test_storage();
        storage.set(&ada()).unwrap();

        assert_eq!(storage.get().unwrap(), Some(ada()));
        let raw = storage.get_item(PROFILE_KEY).unwrap().unwrap();
        assert!(raw.contains("\"phoneNumber\":\"5551234567\""));
    }

    #[test]
    fn test_set_replaces_profile() {
        let storage = create_test_storage();
        storage.set(&ada()).unwrap();
        let grace = UserProfile::new("5559876543", "Grace").unwrap();
        storage.set(&grace).unwrap();

        assert_eq!(storage.get().unwrap(), Some(grace));
    }

    #[test]
    fn test_clear_profile() {
        let storage = create_test_storage();
        storage.set(&ada()).unwrap();

        assert!(storage.clear().unwrap());
        assert!(storage.get().unwrap().is_none());
        assert!(!storage.clear().unwrap());
    }

    #[test]
    fn test_corrupt_profile_is_reported() {
        let storage = create_test_storage();
        storage.set_item(PROFILE_KEY, "{not json").unwrap();

        let err = storage.get().unwrap_err();
        assert!(matches!(err, Error::CorruptProfile { .. }));
        assert!(err.to_string().contains(PROFILE_KEY));
    }

    #[test]
    fn test_failed_write_keeps_previous_profile() {
        let storage = create_test_storage();
        storage.set(&ada()).unwrap();
        storage
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_writes BEFORE INSERT ON kv_store \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let grace = UserProfile::new("5559876543", "Grace").unwrap();
        let err = storage.set(&grace).unwrap_err();

        assert!(matches!(err, Error::DatabaseQuery(_)));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(storage.get().unwrap(), Some(ada()));
    }

    #[test]
    fn test_failed_first_write_stores_nothing() {
        let storage = create_test_storage();
        storage
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_writes BEFORE INSERT ON kv_store \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        assert!(storage.set(&ada()).is_err());
        assert!(storage.get().unwrap().is_none());
    }

    #[test]
    fn test_invalid_stored_profile_is_corrupt() {
        let storage = create_test_storage();
        storage
            .set_item(PROFILE_KEY, r#"{"phoneNumber":"1","name":""}"#)
            .unwrap();

        let err = storage.get().unwrap_err();
        assert!(matches!(err, Error::CorruptProfile { .. }));
    }

    #[test]
    fn test_other_keys_are_independent() {
        let storage = create_test_storage();
        storage.set_item("other", "1").unwrap();
        storage.set(&ada()).unwrap();
        storage.clear().unwrap();

        assert_eq!(storage.get_item("other").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("rollcall-storage-{}", std::process::id()));
        let path = dir.join("nested").join("rollcall.db");

        {
            let storage = Storage::open(&path).unwrap();
            storage.set(&ada()).unwrap();
        }
        let reopened = Storage::open(&path).unwrap();
        assert_eq!(reopened.get().unwrap(), Some(ada()));

        std::fs::remove_dir_all(dir).ok();
    }
}
