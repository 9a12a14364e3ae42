//! Notes CLI - command-line shell over the notes database.

mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use notes_config_and_utils::{init_logging, Config, Paths};
use notes_database::{LabelId, NoteId, NoteSortOrder, StoreConfig};
use notes_facade::NotesDatabase;
use tracing::{debug, info};

/// Notes CLI - keep short notes and organize them with labels.
#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Manage notes and labels from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Note order: title, created, created_desc or changed
    #[arg(long, global = true)]
    sort: Option<String>,

    /// Database file (defaults to ~/.notes/notes.db)
    #[arg(long, global = true, env = "NOTES_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// Manage labels
    Label {
        #[command(subcommand)]
        command: LabelCommands,
    },

    /// Attach a label to a note
    Tag {
        #[arg(value_parser = parse_note_id)]
        note: NoteId,
        #[arg(value_parser = parse_label_id)]
        label: LabelId,
    },

    /// Detach a label from a note
    Untag {
        #[arg(value_parser = parse_note_id)]
        note: NoteId,
        #[arg(value_parser = parse_label_id)]
        label: LabelId,
    },

    /// Delete all notes and labels
    Wipe {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Add a note
    Add {
        title: String,
        #[arg(default_value = "")]
        body: String,
    },
    /// List notes
    List,
    /// Show one note with its labels
    Show {
        #[arg(value_parser = parse_note_id)]
        id: NoteId,
    },
    /// Change a note's title and/or body
    Edit {
        #[arg(value_parser = parse_note_id)]
        id: NoteId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Delete a note
    Delete {
        #[arg(value_parser = parse_note_id)]
        id: NoteId,
    },
    /// Count notes
    Count,
    /// List a note's labels
    Labels {
        #[arg(value_parser = parse_note_id)]
        id: NoteId,
    },
}

#[derive(Subcommand)]
enum LabelCommands {
    /// Add a label
    Add {
        name: String,
        /// Color as #RRGGBB
        #[arg(short, long, default_value = "#808080")]
        color: String,
    },
    /// List labels
    List,
    /// Show one label
    Show {
        #[arg(value_parser = parse_label_id)]
        id: LabelId,
    },
    /// Change a label's name and/or color
    Edit {
        #[arg(value_parser = parse_label_id)]
        id: LabelId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Delete a label
    Delete {
        #[arg(value_parser = parse_label_id)]
        id: LabelId,
    },
    /// List notes carrying a label
    Notes {
        #[arg(value_parser = parse_label_id)]
        id: LabelId,
    },
}

fn parse_row_id(raw: &str) -> Result<i64, String> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(format!("'{}' is not a valid id (expected a positive integer)", raw)),
    }
}

fn parse_note_id(raw: &str) -> Result<NoteId, String> {
    parse_row_id(raw).map(NoteId)
}

fn parse_label_id(raw: &str) -> Result<LabelId, String> {
    parse_row_id(raw).map(LabelId)
}

/// Opens the database the command line and config point at.
fn open_database(cli: &Cli, config: &Config, paths: &Paths) -> Result<NotesDatabase> {
    let path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database_file(paths));
    let store_config = StoreConfig {
        busy_timeout: config.busy_timeout(),
        ..StoreConfig::default()
    };
    let db = NotesDatabase::open(&path, store_config)?;

    let order: NoteSortOrder = cli.sort.as_deref().unwrap_or(&config.sort_order).parse()?;
    db.set_notes_sort_order(order);

    db.add_database_change_listener(Arc::new(|| debug!("Notes database changed")));
    info!(path = %path.display(), %order, "Database ready");
    Ok(db)
}

fn run(cli: Cli) -> Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths)?;

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging("notes-cli", &level, &paths);

    let db = open_database(&cli, &config, &paths)?;
    let format = cli.format;

    let result = match cli.command {
        Commands::Note { command } => match command {
            NoteCommands::Add { title, body } => commands::notes_add(&db, &title, &body, format),
            NoteCommands::List => commands::notes_list(&db, format),
            NoteCommands::Show { id } => commands::notes_show(&db, id, format),
            NoteCommands::Edit { id, title, body } => {
                commands::notes_edit(&db, id, title.as_deref(), body.as_deref(), format)
            }
            NoteCommands::Delete { id } => commands::notes_delete(&db, id, format),
            NoteCommands::Count => commands::notes_count(&db, format),
            NoteCommands::Labels { id } => commands::notes_labels(&db, id, format),
        },
        Commands::Label { command } => match command {
            LabelCommands::Add { name, color } => commands::labels_add(&db, &name, &color, format),
            LabelCommands::List => commands::labels_list(&db, format),
            LabelCommands::Show { id } => commands::labels_show(&db, id, format),
            LabelCommands::Edit { id, name, color } => {
                commands::labels_edit(&db, id, name.as_deref(), color.as_deref(), format)
            }
            LabelCommands::Delete { id } => commands::labels_delete(&db, id, format),
            LabelCommands::Notes { id } => commands::labels_notes(&db, id, format),
        },
        Commands::Tag { note, label } => commands::tag(&db, note, label, format),
        Commands::Untag { note, label } => commands::untag(&db, note, label, format),
        Commands::Wipe { yes } => commands::wipe(&db, yes, format),
    };

    db.flush_notifications();
    result
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ids_must_be_positive() {
        assert_eq!(parse_note_id("4"), Ok(NoteId(4)));
        assert!(parse_note_id("0").is_err());
        assert!(parse_label_id("-2").is_err());
        assert!(parse_label_id("abc").is_err());
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from(["notes", "--format", "json", "note", "edit", "3", "--title", "x"])
            .unwrap();
        assert!(matches!(cli.format, output::OutputFormat::Json));
        match cli.command {
            Commands::Note {
                command: NoteCommands::Edit { id, title, body },
            } => {
                assert_eq!(id, NoteId(3));
                assert_eq!(title.as_deref(), Some("x"));
                assert!(body.is_none());
            }
            _ => panic!("expected note edit"),
        }
    }
}
