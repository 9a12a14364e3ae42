//! Output formatting for the CLI.

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use notes_database::{LabelEntry, NoteEntry};
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message.
pub fn print_success(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "status": "success", "message": message })
        ),
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(72));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

pub fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// `#RRGGBB`.
pub fn format_color(color: u32) -> String {
    format!("#{:06X}", color & 0xFF_FFFF)
}

/// First line of a body, cut to `width` characters.
pub fn preview(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > width {
        let cut: String = line.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

pub fn print_note_table(notes: &[NoteEntry]) {
    if notes.is_empty() {
        println!("No notes found");
        return;
    }
    println!("{:<6} {:<28} {:<17} {}", "ID", "Title", "Changed", "Body");
    print_divider();
    for note in notes {
        println!(
            "{:<6} {:<28} {:<17} {}",
            note.id,
            preview(&note.entity.title, 28),
            format_time(note.entity.changed_at),
            preview(&note.entity.body, 24)
        );
    }
}

pub fn print_label_table(labels: &[LabelEntry]) {
    if labels.is_empty() {
        println!("No labels found");
        return;
    }
    println!("{:<6} {:<8} {}", "ID", "Color", "Name");
    print_divider();
    for label in labels {
        println!(
            "{:<6} {:<8} {}",
            label.id,
            format_color(label.entity.color),
            label.entity.name
        );
    }
}
