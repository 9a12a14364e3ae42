//! Caching, change-notifying facade over the notes database.
//!
//! [`NotesDatabase`] is the only object an application shell talks to. It
//! keeps two caches in front of the store:
//!
//! - the most recently fetched single note
//! - the full note list in the current sort order, with its count
//!
//! Writes are serialized and, once committed, invalidate exactly the cached
//! data they can have made stale. Registered listeners are then told about the
//! change from a background thread.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use notes_facade::{NotesDatabase, RecordingDatabaseListener};
//! use notes_database::Note;
//!
//! let db = NotesDatabase::in_memory().unwrap();
//! let listener = Arc::new(RecordingDatabaseListener::new());
//! db.add_database_change_listener(listener.clone());
//!
//! let id = db.insert_note(Note::new("Title", "Body")).unwrap();
//! assert_eq!(db.get_note(id).unwrap().unwrap().entity.title, "Title");
//! assert_eq!(db.get_notes_count().unwrap(), 1);
//!
//! db.flush_notifications();
//! assert_eq!(listener.calls(), 1);
//! ```

mod cache;
mod facade;
mod listener;
mod notifier;

#[cfg(test)]
mod tests;

pub use facade::NotesDatabase;
pub use listener::{
    ChangeEvent, DatabaseChangeListener, ListenerRegistry, NoteChangeListener, NoteScope,
    RecordingDatabaseListener, RecordingNoteListener,
};
