//! CLI command implementations.

mod labels;
mod notes;

pub use labels::{labels_add, labels_delete, labels_edit, labels_list, labels_notes, labels_show};
pub use notes::{notes_add, notes_count, notes_delete, notes_edit, notes_labels, notes_list, notes_show};

use anyhow::Result;
use notes_database::{LabelEntry, LabelId, NoteEntry, NoteId};
use notes_facade::NotesDatabase;

use crate::output::{self, OutputFormat};

/// Attach a label to a note.
pub fn tag(db: &NotesDatabase, note_id: NoteId, label_id: LabelId, format: OutputFormat) -> Result<()> {
    require_note(db, note_id)?;
    require_label(db, label_id)?;

    if db.get_label_ids_for_note(note_id)?.contains(&label_id) {
        output::print_success(
            &format!("Note {} already has label {}", note_id, label_id),
            format,
        );
        return Ok(());
    }

    db.insert_label_to_note(note_id, label_id)?;
    output::print_success(&format!("Label {} added to note {}", label_id, note_id), format);
    Ok(())
}

/// Detach a label from a note.
pub fn untag(db: &NotesDatabase, note_id: NoteId, label_id: LabelId, format: OutputFormat) -> Result<()> {
    if !db.delete_label_from_note(note_id, label_id)? {
        anyhow::bail!("Note {} does not have label {}", note_id, label_id);
    }
    output::print_success(&format!("Label {} removed from note {}", label_id, note_id), format);
    Ok(())
}

/// Delete every note, label and association.
pub fn wipe(db: &NotesDatabase, yes: bool, format: OutputFormat) -> Result<()> {
    if !yes && !confirm("Delete ALL notes and labels?") {
        println!("Aborted");
        return Ok(());
    }
    db.delete_all_data()?;
    output::print_success("All notes and labels deleted", format);
    Ok(())
}

fn require_note(db: &NotesDatabase, id: NoteId) -> Result<NoteEntry> {
    db.get_note(id)?
        .ok_or_else(|| anyhow::anyhow!("Note {} not found", id))
}

fn require_label(db: &NotesDatabase, id: LabelId) -> Result<LabelEntry> {
    db.get_label(id)?
        .ok_or_else(|| anyhow::anyhow!("Label {} not found", id))
}

/// Ask user for confirmation.
fn confirm(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} [y/N] ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
