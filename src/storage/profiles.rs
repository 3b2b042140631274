//! Profile store
//!
//! Narrow get/set/update contract over user profiles. `SqliteProfileStore`
//! keeps each profile as a JSON document keyed by uid; `MemoryProfileStore`
//! backs tests and the demo binary.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::models::{ProfileUpdate, UserProfile};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>, StorageError>;
    async fn set(&self, uid: &str, profile: &UserProfile) -> Result<(), StorageError>;

    /// Merge `update` into the stored profile; missing profiles are left alone
    async fn update(&self, uid: &str, update: ProfileUpdate) -> Result<(), StorageError>;
}

/// SQLite-backed profile documents
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// Create or open the profile database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                uid TEXT PRIMARY KEY NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned: PoisonError<MutexGuard<'_, Connection>>| {
                warn!("Profile DB mutex was poisoned, recovering");
                poisoned.into_inner()
            })
    }

    fn read(&self, uid: &str) -> Result<Option<UserProfile>, StorageError> {
        let data: Option<String> = self
            .lock()
            .query_row(
                "SELECT data FROM profiles WHERE uid = ?",
                params![uid],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| serde_json::from_str(&d).map_err(StorageError::from))
            .transpose()
    }

    fn write(&self, uid: &str, profile: &UserProfile) -> Result<(), StorageError> {
        let data = serde_json::to_string(profile)?;
        self.lock().execute(
            "INSERT INTO profiles (uid, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![uid, data, Utc::now().to_rfc3339()],
        )?;
        debug!("Stored profile {}", uid);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>, StorageError> {
        self.read(uid)
    }

    async fn set(&self, uid: &str, profile: &UserProfile) -> Result<(), StorageError> {
        self.write(uid, profile)
    }

    async fn update(&self, uid: &str, update: ProfileUpdate) -> Result<(), StorageError> {
        let Some(mut profile) = self.read(uid)? else {
            warn!("Update for unknown profile {} ignored", uid);
            return Ok(());
        };
        update.apply_to(&mut profile);
        self.write(uid, &profile)
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: DashMap<String, UserProfile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>, StorageError> {
        Ok(self.profiles.get(uid).map(|p| p.value().clone()))
    }

    async fn set(&self, uid: &str, profile: &UserProfile) -> Result<(), StorageError> {
        self.profiles.insert(uid.to_string(), profile.clone());
        Ok(())
    }

    async fn update(&self, uid: &str, update: ProfileUpdate) -> Result<(), StorageError> {
        if let Some(mut profile) = self.profiles.get_mut(uid) {
            update.apply_to(profile.value_mut());
        }
        Ok(())
    }
}
