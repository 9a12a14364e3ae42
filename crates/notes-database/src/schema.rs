//! Schema creation.
//!
//! There are no migrations: the schema version lives in `PRAGMA user_version`
//! and the current version wins. A database at any other non-zero version has
//! its tables dropped and recreated.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::DatabaseResult;

/// Current schema version (notes + labels + associations).
pub const CURRENT_VERSION: i32 = 2;

pub(crate) const NOTES_TABLE: &str = "notes";
pub(crate) const LABELS_TABLE: &str = "labels";
pub(crate) const NOTES_LABELS_TABLE: &str = "notes_labels";

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        body TEXT NOT NULL,
        create_date INTEGER,
        change_date INTEGER
    );

    CREATE TABLE IF NOT EXISTS labels (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        color INTEGER
    );

    CREATE TABLE IF NOT EXISTS notes_labels (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        note_id INTEGER,
        label_id INTEGER,
        FOREIGN KEY (note_id) REFERENCES notes (id),
        FOREIGN KEY (label_id) REFERENCES labels (id)
    );

    CREATE INDEX IF NOT EXISTS idx_notes_labels_note_id ON notes_labels(note_id);
    CREATE INDEX IF NOT EXISTS idx_notes_labels_label_id ON notes_labels(label_id);
";

const DROP_TABLES: &str = "
    DROP TABLE IF EXISTS notes_labels;
    DROP TABLE IF EXISTS labels;
    DROP TABLE IF EXISTS notes;
";

/// Reads the schema version stored in the database header.
pub fn schema_version(conn: &Connection) -> DatabaseResult<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Brings the schema to [`CURRENT_VERSION`].
pub fn ensure_schema(conn: &Connection) -> DatabaseResult<()> {
    let version = schema_version(conn)?;

    if version == CURRENT_VERSION {
        debug!(version, "Schema is current");
        return Ok(());
    }

    if version != 0 {
        warn!(
            found = version,
            current = CURRENT_VERSION,
            "Schema version mismatch, recreating tables"
        );
        conn.execute_batch(DROP_TABLES)?;
    }

    conn.execute_batch(CREATE_TABLES)?;
    conn.pragma_update(None, "user_version", CURRENT_VERSION)?;

    info!(version = CURRENT_VERSION, "Schema created");
    Ok(())
}
