//! Scoped SQLite connections.
//!
//! Every dispatcher call opens its own connection through a
//! [`ConnectionFactory`] and drops it before returning, so a connection never
//! outlives the operation that acquired it, even when that operation fails
//! halfway.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rusqlite::{Connection, TransactionBehavior};
use tracing::{info, trace};

use crate::schema;
use crate::store::SchemaStore;
use crate::DatabaseResult;

/// Configuration applied to every connection the factory opens.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Request WAL journaling (file databases only) so readers don't block the writer.
    pub wal: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
            wal: true,
        }
    }
}

enum Location {
    File(PathBuf),
    /// Shared-cache in-memory database. The anchor connection keeps it alive
    /// between scoped connections.
    Memory {
        uri: String,
        gate: RwLock<()>,
        _anchor: Mutex<Connection>,
    },
}

/// Held by a dispatcher call for as long as it uses its connection.
///
/// Shared-cache connections fail with `SQLITE_LOCKED` instead of waiting out
/// the busy timeout when a reader meets a table another connection is
/// writing, so in-memory databases admit many readers or one writer at a
/// time. File databases are never gated.
pub enum AccessGuard<'a> {
    Ungated,
    Read(RwLockReadGuard<'a, ()>),
    Write(RwLockWriteGuard<'a, ()>),
}

/// Opens fresh connections to one notes database.
pub struct ConnectionFactory {
    location: Location,
    config: StoreConfig,
}

impl ConnectionFactory {
    /// Opens (creating if needed) a database file and brings its schema to
    /// the current version.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> DatabaseResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let factory = Self {
            location: Location::File(path.to_path_buf()),
            config,
        };
        let conn = factory.connect()?;
        schema::ensure_schema(&conn.conn)?;
        conn.close()?;

        info!(path = %path.display(), "Notes database opened");
        Ok(factory)
    }

    /// Creates a private in-memory database.
    ///
    /// Useful for testing. Every factory gets its own database.
    pub fn in_memory() -> DatabaseResult<Self> {
        let uri = format!(
            "file:notes-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        );
        let anchor = Connection::open(&uri)?;
        anchor.pragma_update(None, "foreign_keys", true)?;
        schema::ensure_schema(&anchor)?;

        Ok(Self {
            location: Location::Memory {
                uri,
                gate: RwLock::new(()),
                _anchor: Mutex::new(anchor),
            },
            config: StoreConfig::default(),
        })
    }

    /// Path of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory { .. } => None,
        }
    }

    /// Waits until a reader (or, with `write`, the writer) may use the database.
    pub fn access(&self, write: bool) -> AccessGuard<'_> {
        match &self.location {
            Location::File(_) => AccessGuard::Ungated,
            Location::Memory { gate, .. } if write => AccessGuard::Write(gate.write()),
            Location::Memory { gate, .. } => AccessGuard::Read(gate.read()),
        }
    }

    /// Opens a fresh connection with the configured pragmas applied.
    pub fn connect(&self) -> DatabaseResult<StoreConnection> {
        let conn = match &self.location {
            Location::File(path) => {
                let conn = Connection::open(path)?;
                if self.config.wal {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn
            }
            Location::Memory { uri, .. } => Connection::open(uri)?,
        };

        conn.busy_timeout(self.config.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;

        trace!("Store connection opened");
        Ok(StoreConnection { conn })
    }
}

/// A connection owned by exactly one dispatcher call.
///
/// Dropping it closes the underlying SQLite handle.
pub struct StoreConnection {
    conn: Connection,
}

impl StoreConnection {
    /// Schema store bound to this connection, outside any transaction.
    pub fn store(&self) -> SchemaStore<'_> {
        SchemaStore::new(&self.conn)
    }

    /// Runs `f` inside one `IMMEDIATE` transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls the whole unit back.
    pub fn write<T>(
        &mut self,
        f: impl FnOnce(&SchemaStore<'_>) -> DatabaseResult<T>,
    ) -> DatabaseResult<T> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&SchemaStore::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> DatabaseResult<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        trace!("Store connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;

    #[test]
    fn in_memory_factories_are_isolated() {
        let a = ConnectionFactory::in_memory().unwrap();
        let b = ConnectionFactory::in_memory().unwrap();

        let conn = a.connect().unwrap();
        conn.store().insert_note(&Note::new("only in a", "")).unwrap();

        assert_eq!(a.connect().unwrap().store().list_notes(None).unwrap().len(), 1);
        assert!(b.connect().unwrap().store().list_notes(None).unwrap().is_empty());
        assert!(a.path().is_none());
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.db");

        {
            let factory = ConnectionFactory::open(&path, StoreConfig::default()).unwrap();
            let conn = factory.connect().unwrap();
            conn.store().insert_note(&Note::new("persisted", "")).unwrap();
            conn.close().unwrap();
        }

        let factory = ConnectionFactory::open(&path, StoreConfig::default()).unwrap();
        assert_eq!(factory.path(), Some(path.as_path()));
        let notes = factory.connect().unwrap().store().list_notes(None).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].entity.title, "persisted");
    }

    #[test]
    fn only_in_memory_databases_are_gated() {
        let memory = ConnectionFactory::in_memory().unwrap();
        let first = memory.access(false);
        let second = memory.access(false);
        assert!(matches!(first, AccessGuard::Read(_)));
        assert!(matches!(second, AccessGuard::Read(_)));
        drop((first, second));
        assert!(matches!(memory.access(true), AccessGuard::Write(_)));

        let dir = tempfile::tempdir().unwrap();
        let file = ConnectionFactory::open(dir.path().join("notes.db"), StoreConfig::default()).unwrap();
        assert!(matches!(file.access(true), AccessGuard::Ungated));
    }

    #[test]
    fn failed_write_rolls_back() {
        let factory = ConnectionFactory::in_memory().unwrap();
        let mut conn = factory.connect().unwrap();

        let result: DatabaseResult<()> = conn.write(|store| {
            store.insert_note(&Note::new("rolled back", ""))?;
            Err(crate::DatabaseError::InvalidData("abort".into()))
        });

        assert!(result.is_err());
        assert!(conn.store().list_notes(None).unwrap().is_empty());
    }
}
