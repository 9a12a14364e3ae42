//! Change listeners and their registry.
//!
//! # Design Principles
//!
//! - Listeners are told *that* something changed, never *what* the new value is
//! - Callbacks run on the notifier thread, never on the writer's thread
//! - Delivery iterates a snapshot of the registry, so a listener may register
//!   or unregister (itself included) from inside its callback; the change
//!   takes effect from the next event on

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use notes_database::NoteId;
use parking_lot::{Mutex, RwLock};
use tracing::error;

/// Which notes a note-change event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteScope {
    /// The change may concern any note (bulk label operations, wipes).
    Any,
    /// The change concerns exactly this note.
    Note(NoteId),
}

impl NoteScope {
    /// Whether a listener watching `note_id` should hear about this change.
    pub fn includes(self, note_id: NoteId) -> bool {
        match self {
            NoteScope::Any => true,
            NoteScope::Note(id) => id == note_id,
        }
    }
}

/// Told after any committed write that changed stored data.
pub trait DatabaseChangeListener: Send + Sync {
    /// Called from the notifier thread. Hop to the UI thread before rendering.
    fn on_database_changed(&self);
}

impl<F> DatabaseChangeListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_database_changed(&self) {
        self()
    }
}

/// Told after a committed write that changed one watched note.
pub trait NoteChangeListener: Send + Sync {
    /// Called from the notifier thread. Hop to the UI thread before rendering.
    fn on_note_changed(&self);

    /// Id of the note this listener watches.
    fn note_id(&self) -> NoteId;
}

/// An event the notifier delivers to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    DatabaseChanged,
    NoteChanged(NoteScope),
}

/// Registered listeners, shared between the facade and the notifier thread.
#[derive(Default)]
pub struct ListenerRegistry {
    database: RwLock<Vec<Arc<dyn DatabaseChangeListener>>>,
    note: RwLock<Vec<Arc<dyn NoteChangeListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_database_listener(&self, listener: Arc<dyn DatabaseChangeListener>) -> bool {
        self.database.write().push(listener);
        true
    }

    /// Removes the first registration of `listener`. Returns false if it was not registered.
    pub fn remove_database_listener<L>(&self, listener: &Arc<L>) -> bool
    where
        L: DatabaseChangeListener + ?Sized,
    {
        remove_by_address(&mut *self.database.write(), listener)
    }

    pub fn add_note_listener(&self, listener: Arc<dyn NoteChangeListener>) -> bool {
        self.note.write().push(listener);
        true
    }

    /// Removes the first registration of `listener`. Returns false if it was not registered.
    pub fn remove_note_listener<L>(&self, listener: &Arc<L>) -> bool
    where
        L: NoteChangeListener + ?Sized,
    {
        remove_by_address(&mut *self.note.write(), listener)
    }

    #[cfg(test)]
    pub(crate) fn database_listener_count(&self) -> usize {
        self.database.read().len()
    }

    /// Delivers one event to every interested listener.
    ///
    /// A panicking listener is logged and skipped; the others still run.
    pub fn dispatch(&self, event: ChangeEvent) {
        match event {
            ChangeEvent::DatabaseChanged => {
                let snapshot = self.database.read().clone();
                for listener in snapshot {
                    guarded("database", || listener.on_database_changed());
                }
            }
            ChangeEvent::NoteChanged(scope) => {
                let snapshot = self.note.read().clone();
                for listener in snapshot {
                    if scope.includes(listener.note_id()) {
                        guarded("note", || listener.on_note_changed());
                    }
                }
            }
        }
    }
}

fn remove_by_address<T, L>(listeners: &mut Vec<Arc<T>>, listener: &Arc<L>) -> bool
where
    T: ?Sized,
    L: ?Sized,
{
    let target = Arc::as_ptr(listener).cast::<()>();
    match listeners
        .iter()
        .position(|registered| Arc::as_ptr(registered).cast::<()>() == target)
    {
        Some(index) => {
            listeners.remove(index);
            true
        }
        None => false,
    }
}

fn guarded(kind: &'static str, callback: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
        error!(kind, "Change listener panicked");
    }
}

/// A database listener that counts its invocations.
#[derive(Debug, Default)]
pub struct RecordingDatabaseListener {
    calls: Mutex<usize>,
}

impl RecordingDatabaseListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications received.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    pub fn clear(&self) {
        *self.calls.lock() = 0;
    }
}

impl DatabaseChangeListener for RecordingDatabaseListener {
    fn on_database_changed(&self) {
        *self.calls.lock() += 1;
    }
}

/// A note listener for one note id that counts its invocations.
#[derive(Debug)]
pub struct RecordingNoteListener {
    note_id: NoteId,
    calls: Mutex<usize>,
}

impl RecordingNoteListener {
    pub fn new(note_id: NoteId) -> Self {
        Self {
            note_id,
            calls: Mutex::new(0),
        }
    }

    /// Number of notifications received.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    pub fn clear(&self) {
        *self.calls.lock() = 0;
    }
}

impl NoteChangeListener for RecordingNoteListener {
    fn on_note_changed(&self) {
        *self.calls.lock() += 1;
    }

    fn note_id(&self) -> NoteId {
        self.note_id
    }
}
