//! Behaviour tests for the facade, grouped by property.

mod concurrency;
mod scenarios;

use std::sync::Arc;

use notes_database::{Label, Note, NoteId};

use crate::{NotesDatabase, RecordingDatabaseListener, RecordingNoteListener};

fn database() -> NotesDatabase {
    NotesDatabase::in_memory().unwrap()
}

fn insert(db: &NotesDatabase, title: &str, body: &str) -> NoteId {
    db.insert_note(Note::new(title, body)).unwrap()
}

fn work_label() -> Label {
    Label::new("work", 0xFF0000)
}

fn watch_database(db: &NotesDatabase) -> Arc<RecordingDatabaseListener> {
    let listener = Arc::new(RecordingDatabaseListener::new());
    db.add_database_change_listener(listener.clone());
    listener
}

fn watch_note(db: &NotesDatabase, id: NoteId) -> Arc<RecordingNoteListener> {
    let listener = Arc::new(RecordingNoteListener::new(id));
    db.add_note_change_listener(listener.clone());
    listener
}
