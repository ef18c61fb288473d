use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{AppError, AppResult};
use crate::models::{Destination, NavigationStack, Project, StorageBackend, UserQuota};

pub const QUOTA_KEY: &str = "userQuota";
pub const NAVIGATION_KEY: &str = "navigationHistory";
pub const PROJECTS_KEY: &str = "projects";

const SQLITE_FILE: &str = "state.db";

/// Raw string key-value persistence
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Outcome of a mutation whose persistence is best-effort.
///
/// `value` reflects the in-memory state, which stays authoritative even when
/// `saved` carries an error; the next mutation writes the full state again.
#[must_use]
#[derive(Debug)]
pub struct Persisted<T> {
    pub value: T,
    pub saved: AppResult<()>,
}

impl<T> Persisted<T> {
    pub fn new(value: T, saved: AppResult<()>) -> Self {
        Self { value, saved }
    }

    pub fn is_saved(&self) -> bool {
        self.saved.is_ok()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// One `<key>.json` file per key
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key);
        let temp_path = self.dir.join(format!("{}.json.tmp", key));

        // Write to temp file, then atomic rename
        fs::write(&temp_path, value)?;
        fs::rename(temp_path, path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Key-value rows in a single SQLite `ItemTable`
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS ItemTable (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Storage("SQLite connection lock poisoned".to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM ItemTable WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO ItemTable (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM ItemTable WHERE key = ?", [key])?;
        Ok(())
    }
}

/// In-process map, nothing survives the session
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| AppError::Storage("Memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.items()?.remove(key);
        Ok(())
    }
}

/// Open the configured backend rooted at `data_dir`
pub fn open_store(backend: StorageBackend, data_dir: &Path) -> AppResult<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(data_dir.join("state"))?),
        StorageBackend::Sqlite => {
            if !data_dir.exists() {
                fs::create_dir_all(data_dir)?;
            }
            Arc::new(SqliteStore::open(&data_dir.join(SQLITE_FILE))?)
        }
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::info!("Opened {} state store in {:?}", backend, data_dir);
    Ok(store)
}

/// Typed session state on top of a [`KeyValueStore`].
///
/// Loads never fail: unreadable or malformed values are logged and reported
/// as absent so callers fall back to defaults.
#[derive(Clone)]
pub struct StateStorage {
    store: Arc<dyn KeyValueStore>,
}

impl StateStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn load_quota_state(&self) -> Option<UserQuota> {
        let quota: UserQuota = self.load_json(QUOTA_KEY)?;
        let sanitized = quota.sanitize();
        if sanitized.is_none() {
            tracing::warn!("Persisted quota has a zero daily limit, ignoring it");
        }
        sanitized
    }

    pub fn save_quota_state(&self, quota: &UserQuota) -> AppResult<()> {
        self.save_json(QUOTA_KEY, quota)
    }

    pub fn load_navigation_stack(&self) -> Option<NavigationStack> {
        let entries: Vec<Destination> = self.load_json(NAVIGATION_KEY)?;
        let stack = NavigationStack::from_entries(entries);
        if stack.is_none() {
            tracing::warn!("Persisted navigation stack does not start at the dashboard, ignoring it");
        }
        stack
    }

    pub fn save_navigation_stack(&self, entries: &[Destination]) -> AppResult<()> {
        self.save_json(NAVIGATION_KEY, &entries)
    }

    pub fn load_projects(&self) -> Option<Vec<Project>> {
        self.load_json(PROJECTS_KEY)
    }

    pub fn save_projects(&self, projects: &[Project]) -> AppResult<()> {
        self.save_json(PROJECTS_KEY, &projects)
    }

    fn load_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Malformed {} state, falling back to defaults: {}", key, e);
                None
            }
        }
    }

    fn save_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let content = serde_json::to_string_pretty(value)?;
        self.store.set(key, &content)
    }
}
