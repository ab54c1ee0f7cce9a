//! Key-value backends for preference storage.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{PrefsError, PrefsResult};

/// Durable string key-value storage.
pub trait PreferenceBackend: Send + Sync {
    fn get(&self, key: &str) -> PrefsResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PrefsResult<()>;
}

impl<B: PreferenceBackend + ?Sized> PreferenceBackend for Arc<B> {
    fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        (**self).set(key, value)
    }
}

/// Preference backend stored in a single SQLite table.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Opens (or creates) the preference database at `path`.
    pub fn open(path: impl AsRef<Path>) -> PrefsResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let backend = Self {
            conn: Arc::new(Mutex::new(Connection::open(path)?)),
        };
        backend.init_schema()?;
        Ok(backend)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> PrefsResult<Self> {
        let backend = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        backend.init_schema()?;
        Ok(backend)
    }

    fn init_schema(&self) -> PrefsResult<()> {
        let conn = self.conn.lock().map_err(|_| PrefsError::Poisoned)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

impl PreferenceBackend for SqliteBackend {
    fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| PrefsError::Poisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        let conn = self.conn.lock().map_err(|_| PrefsError::Poisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO preferences (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local backend. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        let values = self.values.lock().map_err(|_| PrefsError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        let mut values = self.values.lock().map_err(|_| PrefsError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
