//! Note commands.

use anyhow::Result;
use notes_database::{Note, NoteId};
use notes_facade::NotesDatabase;
use tracing::debug;

use super::require_note;
use crate::output::{self, OutputFormat};

pub fn notes_add(db: &NotesDatabase, title: &str, body: &str, format: OutputFormat) -> Result<()> {
    let id = db.insert_note(Note::new(title, body))?;
    debug!(note_id = %id, "Note added");

    match format {
        OutputFormat::Text => println!("Note added: {}", id),
        OutputFormat::Json => output::print_json(&serde_json::json!({ "id": id }))?,
    }
    Ok(())
}

pub fn notes_list(db: &NotesDatabase, format: OutputFormat) -> Result<()> {
    let notes = db.get_all_notes()?;
    match format {
        OutputFormat::Text => output::print_note_table(&notes),
        OutputFormat::Json => output::print_json(&*notes)?,
    }
    Ok(())
}

pub fn notes_show(db: &NotesDatabase, id: NoteId, format: OutputFormat) -> Result<()> {
    let note = require_note(db, id)?;
    let labels = db.get_labels_for_note(id)?;

    match format {
        OutputFormat::Text => {
            output::print_heading(&note.entity.title);
            output::print_row("ID", &note.id.to_string());
            output::print_row("Created", &output::format_time(note.entity.created_at));
            output::print_row("Changed", &output::format_time(note.entity.changed_at));
            let names: Vec<_> = labels.iter().map(|l| l.entity.name.as_str()).collect();
            output::print_row("Labels", &names.join(", "));
            output::print_divider();
            println!("{}", note.entity.body);
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "note": note,
            "labels": labels,
        }))?,
    }
    Ok(())
}

/// Change the title and/or body, keeping whichever is not given.
pub fn notes_edit(
    db: &NotesDatabase,
    id: NoteId,
    title: Option<&str>,
    body: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    if title.is_none() && body.is_none() {
        anyhow::bail!("Nothing to change: pass --title and/or --body");
    }

    let current = require_note(db, id)?.entity;
    let edited = current.edit(
        title.unwrap_or(&current.title),
        body.unwrap_or(&current.body),
    );
    if !db.update_note(id, edited)? {
        anyhow::bail!("Note {} not found", id);
    }
    output::print_success(&format!("Note {} updated", id), format);
    Ok(())
}

pub fn notes_delete(db: &NotesDatabase, id: NoteId, format: OutputFormat) -> Result<()> {
    if !db.delete_note(id)? {
        anyhow::bail!("Note {} not found", id);
    }
    output::print_success(&format!("Note {} deleted", id), format);
    Ok(())
}

pub fn notes_count(db: &NotesDatabase, format: OutputFormat) -> Result<()> {
    let count = db.get_notes_count()?;
    match format {
        OutputFormat::Text => println!("{}", count),
        OutputFormat::Json => output::print_json(&serde_json::json!({ "count": count }))?,
    }
    Ok(())
}

/// Labels attached to one note.
pub fn notes_labels(db: &NotesDatabase, id: NoteId, format: OutputFormat) -> Result<()> {
    require_note(db, id)?;
    let labels = db.get_labels_for_note(id)?;
    match format {
        OutputFormat::Text => output::print_label_table(&labels),
        OutputFormat::Json => output::print_json(&labels)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_keeps_unspecified_fields() {
        let db = NotesDatabase::in_memory().unwrap();
        let id = db.insert_note(Note::new("title", "body")).unwrap();

        notes_edit(&db, id, None, Some("new body"), OutputFormat::Json).unwrap();

        let note = db.get_note(id).unwrap().unwrap().entity;
        assert_eq!(note.title, "title");
        assert_eq!(note.body, "new body");
    }

    #[test]
    fn edit_without_changes_is_rejected() {
        let db = NotesDatabase::in_memory().unwrap();
        let id = db.insert_note(Note::new("title", "body")).unwrap();

        assert!(notes_edit(&db, id, None, None, OutputFormat::Text).is_err());
    }

    #[test]
    fn deleting_missing_note_fails() {
        let db = NotesDatabase::in_memory().unwrap();
        let err = notes_delete(&db, NoteId(9), OutputFormat::Text).unwrap_err();
        assert_eq!(err.to_string(), "Note 9 not found");
    }
}
