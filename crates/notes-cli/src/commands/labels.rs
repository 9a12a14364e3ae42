//! Label commands.

use anyhow::{Context, Result};
use notes_database::{Label, LabelId};
use notes_facade::NotesDatabase;

use super::require_label;
use crate::output::{self, OutputFormat};

/// Parse `#RRGGBB`, `0xRRGGBB` or `RRGGBB` into a packed color.
pub fn parse_color(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Invalid color '{}': expected six hex digits like #FF0000", raw);
    }
    u32::from_str_radix(hex, 16).with_context(|| format!("Invalid color '{}'", raw))
}

pub fn labels_add(db: &NotesDatabase, name: &str, color: &str, format: OutputFormat) -> Result<()> {
    let id = db.insert_label(Label::new(name, parse_color(color)?))?;
    match format {
        OutputFormat::Text => println!("Label added: {}", id),
        OutputFormat::Json => output::print_json(&serde_json::json!({ "id": id }))?,
    }
    Ok(())
}

pub fn labels_list(db: &NotesDatabase, format: OutputFormat) -> Result<()> {
    let labels = db.get_all_labels()?;
    match format {
        OutputFormat::Text => output::print_label_table(&labels),
        OutputFormat::Json => output::print_json(&labels)?,
    }
    Ok(())
}

pub fn labels_show(db: &NotesDatabase, id: LabelId, format: OutputFormat) -> Result<()> {
    let label = require_label(db, id)?;
    let notes = db.get_notes_for_label(id)?;

    match format {
        OutputFormat::Text => {
            output::print_heading(&label.entity.name);
            output::print_row("ID", &label.id.to_string());
            output::print_row("Color", &output::format_color(label.entity.color));
            output::print_row("Notes", &notes.len().to_string());
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "label": label,
            "note_ids": notes.iter().map(|n| n.id).collect::<Vec<_>>(),
        }))?,
    }
    Ok(())
}

pub fn labels_edit(
    db: &NotesDatabase,
    id: LabelId,
    name: Option<&str>,
    color: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    if name.is_none() && color.is_none() {
        anyhow::bail!("Nothing to change: pass --name and/or --color");
    }

    let current = require_label(db, id)?.entity;
    let color = match color {
        Some(raw) => parse_color(raw)?,
        None => current.color,
    };
    let label = Label::new(name.unwrap_or(&current.name), color);
    if !db.update_label(id, label)? {
        anyhow::bail!("Label {} not found", id);
    }
    output::print_success(&format!("Label {} updated", id), format);
    Ok(())
}

/// Delete a label, detaching it from every note first.
pub fn labels_delete(db: &NotesDatabase, id: LabelId, format: OutputFormat) -> Result<()> {
    if !db.delete_label(id)? {
        anyhow::bail!("Label {} not found", id);
    }
    output::print_success(&format!("Label {} deleted", id), format);
    Ok(())
}

/// Notes carrying one label, in the configured sort order.
pub fn labels_notes(db: &NotesDatabase, id: LabelId, format: OutputFormat) -> Result<()> {
    require_label(db, id)?;
    let notes = db.get_notes_for_label(id)?;
    match format {
        OutputFormat::Text => output::print_note_table(&notes),
        OutputFormat::Json => output::print_json(&notes)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notes_database::Note;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#FF0000").unwrap(), 0xFF0000);
        assert_eq!(parse_color("0x00ff00").unwrap(), 0x00FF00);
        assert_eq!(parse_color(" 0000FF ").unwrap(), 0x0000FF);
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(parse_color("red").is_err());
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("#GG0000").is_err());
    }

    #[test]
    fn edit_changes_only_given_fields() {
        let db = NotesDatabase::in_memory().unwrap();
        let id = db.insert_label(Label::new("work", 0xFF0000)).unwrap();

        labels_edit(&db, id, Some("office"), None, OutputFormat::Json).unwrap();

        let label = db.get_label(id).unwrap().unwrap().entity;
        assert_eq!(label, Label::new("office", 0xFF0000));
    }

    #[test]
    fn delete_detaches_from_notes() {
        let db = NotesDatabase::in_memory().unwrap();
        let note = db.insert_note(Note::new("n", "")).unwrap();
        let id = db.insert_label(Label::new("work", 0)).unwrap();
        db.insert_label_to_note(note, id).unwrap();

        labels_delete(&db, id, OutputFormat::Text).unwrap();

        assert!(db.get_labels_for_note(note).unwrap().is_empty());
        assert!(labels_delete(&db, id, OutputFormat::Text).is_err());
    }
}
