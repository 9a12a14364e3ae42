//! Row-level storage for notes, labels and their associations.
//!
//! The store has no business rules beyond physical storage: it does not
//! cascade deletes, cache anything, or notify anyone. Each method works on one
//! already-open connection (or transaction) borrowed from the caller.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    AssociationId, Label, LabelEntry, LabelId, Note, NoteEntry, NoteId, NoteSortOrder,
};
use crate::schema::{LABELS_TABLE, NOTES_LABELS_TABLE, NOTES_TABLE};
use crate::DatabaseResult;

const NOTE_COLUMNS: &str = "id, name, body, create_date, change_date";
const LABEL_COLUMNS: &str = "id, name, color";

/// Storage primitives over a borrowed connection.
pub struct SchemaStore<'c> {
    conn: &'c Connection,
}

impl<'c> SchemaStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Notes
    // ========================================================================

    /// Point lookup of a note.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a positive row id.
    pub fn get_note(&self, id: NoteId) -> DatabaseResult<Option<NoteEntry>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1");
        let entry = self
            .conn
            .query_row(&sql, params![row_id(id.0)], note_from_row)
            .optional()?;
        Ok(entry)
    }

    /// All notes, in insertion order when `order` is `None`.
    pub fn list_notes(&self, order: Option<NoteSortOrder>) -> DatabaseResult<Vec<NoteEntry>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes{}", order_suffix(order));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], note_from_row)?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    pub fn insert_note(&self, note: &Note) -> DatabaseResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (name, body, create_date, change_date) VALUES (?1, ?2, ?3, ?4)",
            params![
                note.title,
                note.body,
                note.created_at.timestamp_millis(),
                note.changed_at.timestamp_millis()
            ],
        )?;
        Ok(NoteId(self.conn.last_insert_rowid()))
    }

    /// Returns true if the note existed and was updated.
    pub fn update_note(&self, id: NoteId, note: &Note) -> DatabaseResult<bool> {
        let affected = self.conn.execute(
            "UPDATE notes SET name = ?1, body = ?2, create_date = ?3, change_date = ?4 WHERE id = ?5",
            params![
                note.title,
                note.body,
                note.created_at.timestamp_millis(),
                note.changed_at.timestamp_millis(),
                row_id(id.0)
            ],
        )?;
        Ok(affected > 0)
    }

    /// Deletes the note row only. Associations are the caller's business.
    pub fn delete_note(&self, id: NoteId) -> DatabaseResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", params![row_id(id.0)])?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Labels
    // ========================================================================

    pub fn get_label(&self, id: LabelId) -> DatabaseResult<Option<LabelEntry>> {
        let sql = format!("SELECT {LABEL_COLUMNS} FROM labels WHERE id = ?1");
        let entry = self
            .conn
            .query_row(&sql, params![row_id(id.0)], label_from_row)
            .optional()?;
        Ok(entry)
    }

    /// All labels, sorted by name.
    pub fn list_labels(&self) -> DatabaseResult<Vec<LabelEntry>> {
        let sql = format!("SELECT {LABEL_COLUMNS} FROM labels ORDER BY name ASC, id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], label_from_row)?;

        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    pub fn insert_label(&self, label: &Label) -> DatabaseResult<LabelId> {
        self.conn.execute(
            "INSERT INTO labels (name, color) VALUES (?1, ?2)",
            params![label.name, i64::from(label.color)],
        )?;
        Ok(LabelId(self.conn.last_insert_rowid()))
    }

    pub fn update_label(&self, id: LabelId, label: &Label) -> DatabaseResult<bool> {
        let affected = self.conn.execute(
            "UPDATE labels SET name = ?1, color = ?2 WHERE id = ?3",
            params![label.name, i64::from(label.color), row_id(id.0)],
        )?;
        Ok(affected > 0)
    }

    /// Deletes the label row only. Associations are the caller's business.
    pub fn delete_label(&self, id: LabelId) -> DatabaseResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM labels WHERE id = ?1", params![row_id(id.0)])?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Associations
    // ========================================================================

    /// Labels attached to a note, sorted by name when `order_by_name` is set.
    pub fn labels_for_note(
        &self,
        note_id: NoteId,
        order_by_name: bool,
    ) -> DatabaseResult<Vec<LabelEntry>> {
        let sql = format!(
            "SELECT {LABEL_COLUMNS} FROM labels \
             WHERE id IN (SELECT label_id FROM notes_labels WHERE note_id = ?1){}",
            if order_by_name {
                " ORDER BY name ASC, id ASC"
            } else {
                ""
            }
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![row_id(note_id.0)], label_from_row)?;

        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    /// Notes carrying a label.
    pub fn notes_for_label(
        &self,
        label_id: LabelId,
        order: Option<NoteSortOrder>,
    ) -> DatabaseResult<Vec<NoteEntry>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes \
             WHERE id IN (SELECT note_id FROM notes_labels WHERE label_id = ?1){}",
            order_suffix(order)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![row_id(label_id.0)], note_from_row)?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    pub fn label_ids_for_note(&self, note_id: NoteId) -> DatabaseResult<HashSet<LabelId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM labels \
             WHERE id IN (SELECT label_id FROM notes_labels WHERE note_id = ?1)",
        )?;
        let rows = stmt.query_map(params![row_id(note_id.0)], |row| {
            Ok(LabelId(row.get(0)?))
        })?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }

    pub fn all_association_pairs(&self) -> DatabaseResult<HashSet<(NoteId, LabelId)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT note_id, label_id FROM notes_labels")?;
        let rows = stmt.query_map([], |row| {
            Ok((NoteId(row.get(0)?), LabelId(row.get(1)?)))
        })?;

        let mut pairs = HashSet::new();
        for row in rows {
            pairs.insert(row?);
        }
        Ok(pairs)
    }

    /// Associations are never updated in place, only inserted and deleted.
    pub fn insert_association(
        &self,
        note_id: NoteId,
        label_id: LabelId,
    ) -> DatabaseResult<AssociationId> {
        self.conn.execute(
            "INSERT INTO notes_labels (note_id, label_id) VALUES (?1, ?2)",
            params![row_id(note_id.0), row_id(label_id.0)],
        )?;
        Ok(AssociationId(self.conn.last_insert_rowid()))
    }

    pub fn delete_association(&self, note_id: NoteId, label_id: LabelId) -> DatabaseResult<bool> {
        let affected = self.conn.execute(
            "DELETE FROM notes_labels WHERE note_id = ?1 AND label_id = ?2",
            params![row_id(note_id.0), row_id(label_id.0)],
        )?;
        Ok(affected > 0)
    }

    pub fn delete_associations_for_note(&self, note_id: NoteId) -> DatabaseResult<bool> {
        let affected = self.conn.execute(
            "DELETE FROM notes_labels WHERE note_id = ?1",
            params![row_id(note_id.0)],
        )?;
        Ok(affected > 0)
    }

    pub fn delete_associations_for_label(&self, label_id: LabelId) -> DatabaseResult<bool> {
        let affected = self.conn.execute(
            "DELETE FROM notes_labels WHERE label_id = ?1",
            params![row_id(label_id.0)],
        )?;
        Ok(affected > 0)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Deletes every row, association table first.
    pub fn wipe_all(&self) -> DatabaseResult<()> {
        for table in [NOTES_LABELS_TABLE, LABELS_TABLE, NOTES_TABLE] {
            self.conn.execute(&format!("DELETE FROM {table}"), [])?;
        }
        Ok(())
    }
}

/// Validates an id used to address one specific row.
///
/// A non-positive id here is a programmer error, never a storage condition.
fn row_id(id: i64) -> i64 {
    assert!(id >= 1, "Wrong id value: {id}");
    id
}

fn order_suffix(order: Option<NoteSortOrder>) -> String {
    order
        .map(|order| format!(" ORDER BY {}", order.order_by()))
        .unwrap_or_default()
}

fn millis_to_datetime(millis: Option<i64>) -> DateTime<Utc> {
    millis
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<NoteEntry> {
    Ok(NoteEntry::new(
        NoteId(row.get(0)?),
        Note {
            title: row.get(1)?,
            body: row.get(2)?,
            created_at: millis_to_datetime(row.get(3)?),
            changed_at: millis_to_datetime(row.get(4)?),
        },
    ))
}

fn label_from_row(row: &Row<'_>) -> rusqlite::Result<LabelEntry> {
    let color: Option<i64> = row.get(2)?;
    Ok(LabelEntry::new(
        LabelId(row.get(0)?),
        Label {
            name: row.get(1)?,
            color: color.unwrap_or_default() as u32,
        },
    ))
}
