//! Local store contract and its SQLite, file and in-memory backends.
//!
//! # Responsibility
//! - Read and write the whole serialized store under one key.
//! - Keep backend-specific failure detail inside `RepoError`.
//!
//! # Invariants
//! - `read` returns `Ok(None)` when nothing was ever written.
//! - File writes go through a temp file and rename, so readers never see a
//!   partially written document.

use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key under which the whole project store is saved.
pub const LOCAL_STORE_KEY: &str = "storyCardsProjects";

pub type RepoResult<T> = Result<T, RepoError>;

/// Local persistence failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Io { path: PathBuf, source: std::io::Error },
    /// Backend lock was poisoned by a panicking writer.
    Poisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Poisoned => write!(f, "local store lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Single-key text storage for the serialized project store.
pub trait LocalStore: Send {
    /// Short backend label used in log events.
    fn backend(&self) -> &'static str;
    fn read(&self) -> RepoResult<Option<String>>;
    fn write(&self, value: &str) -> RepoResult<()>;
}

/// SQLite-backed local store using the `kv_store` table.
pub struct SqliteLocalStore {
    conn: Mutex<Connection>,
}

impl SqliteLocalStore {
    /// Opens (or creates) the database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already has migrations applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl LocalStore for SqliteLocalStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn read(&self) -> RepoResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| RepoError::Poisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [LOCAL_STORE_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, value: &str) -> RepoResult<()> {
        let conn = self.conn.lock().map_err(|_| RepoError::Poisoned)?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![LOCAL_STORE_KEY, value],
        )?;
        Ok(())
    }
}

/// Plain JSON file holding the serialized store.
pub struct JsonFileLocalStore {
    path: PathBuf,
}

impl JsonFileLocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RepoError {
        RepoError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LocalStore for JsonFileLocalStore {
    fn backend(&self) -> &'static str {
        "json_file"
    }

    fn read(&self) -> RepoResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn write(&self, value: &str) -> RepoResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, value).map_err(|err| self.io_error(err))?;
        std::fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))
    }
}

/// Process-local store; contents are lost on exit.
#[derive(Default)]
pub struct MemoryLocalStore {
    value: Mutex<Option<String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn read(&self) -> RepoResult<Option<String>> {
        let value = self.value.lock().map_err(|_| RepoError::Poisoned)?;
        Ok(value.clone())
    }

    fn write(&self, value: &str) -> RepoResult<()> {
        let mut slot = self.value.lock().map_err(|_| RepoError::Poisoned)?;
        *slot = Some(value.to_string());
        Ok(())
    }
}
