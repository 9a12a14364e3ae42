//! The notes database facade.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use notes_database::{
    AssociationId, Committed, ConnectionFactory, DatabaseError, DatabaseResult, Dispatcher, Label,
    LabelEntry, LabelId, Note, NoteEntry, NoteId, NoteSortOrder, StoreConfig, Transaction,
    TransactionOutput,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::{Lookup, NoteCache, NotesListCache};
use crate::listener::{
    ChangeEvent, DatabaseChangeListener, ListenerRegistry, NoteChangeListener, NoteScope,
};
use crate::notifier::Notifier;

/// Moves the expected payload out of a committed transaction, or returns
/// [`DatabaseError::UnexpectedOutput`] from the enclosing function.
macro_rules! expect_output {
    ($committed:expr, $variant:ident) => {{
        let committed: Committed = $committed;
        match committed.output {
            TransactionOutput::$variant(value) => value,
            other => {
                return Err(DatabaseError::UnexpectedOutput {
                    kind: committed.kind,
                    output: other.name(),
                })
            }
        }
    }};
}

/// Entry point for everything that reads or writes notes and labels.
///
/// Create one per database at startup and share it (usually behind an
/// [`Arc`]) with every collaborator that needs it. Reads run concurrently;
/// writes are serialized. After each committed write that changed data, the
/// affected caches are invalidated and listeners are notified on a
/// background thread.
pub struct NotesDatabase {
    dispatcher: Dispatcher,
    write_lock: Mutex<()>,
    note_cache: NoteCache,
    list_cache: NotesListCache,
    sort_order: RwLock<NoteSortOrder>,
    listeners: Arc<ListenerRegistry>,
    notifier: Notifier,
}

impl NotesDatabase {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> DatabaseResult<Self> {
        Self::new(ConnectionFactory::open(path, config)?)
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> DatabaseResult<Self> {
        Self::new(ConnectionFactory::in_memory()?)
    }

    pub fn new(connections: ConnectionFactory) -> DatabaseResult<Self> {
        let listeners = Arc::new(ListenerRegistry::new());
        let notifier = Notifier::spawn(Arc::clone(&listeners))?;

        info!(path = ?connections.path(), "Notes database facade ready");
        Ok(Self {
            dispatcher: Dispatcher::new(connections),
            write_lock: Mutex::new(()),
            note_cache: NoteCache::default(),
            list_cache: NotesListCache::default(),
            sort_order: RwLock::new(NoteSortOrder::default()),
            listeners,
            notifier,
        })
    }

    // ========================================================================
    // Notes
    // ========================================================================

    /// Returns the note with `id`, from the cache when it is still actual.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a positive row id.
    pub fn get_note(&self, id: NoteId) -> DatabaseResult<Option<NoteEntry>> {
        let generation = match self.note_cache.lookup(id) {
            Lookup::Hit(entry) => {
                debug!(note_id = %id, "Cached note is actual");
                return Ok(Some(entry));
            }
            Lookup::Miss { generation } => generation,
        };

        debug!(note_id = %id, "Cached note NOT actual, querying");
        let entry = expect_output!(self.dispatcher.perform(Transaction::GetNote(id))?, Note);
        self.note_cache.store(entry.clone(), generation);
        Ok(entry)
    }

    /// Returns every note in the current sort order.
    pub fn get_all_notes(&self) -> DatabaseResult<Arc<[NoteEntry]>> {
        let generation = match self.list_cache.lookup() {
            Lookup::Hit(notes) => {
                debug!(count = notes.len(), "Cached notes list is actual");
                return Ok(notes);
            }
            Lookup::Miss { generation } => generation,
        };

        let order = self.notes_sort_order();
        debug!(%order, "Cached notes list NOT actual, querying");
        let notes: Arc<[NoteEntry]> =
            expect_output!(self.dispatcher.perform(Transaction::GetAllNotes(order))?, Notes).into();
        self.list_cache.store(Arc::clone(&notes), generation);
        Ok(notes)
    }

    /// Number of notes, consistent with the list [`get_all_notes`](Self::get_all_notes)
    /// returns for the same refresh.
    pub fn get_notes_count(&self) -> DatabaseResult<usize> {
        match self.list_cache.count() {
            Some(count) => Ok(count),
            None => Ok(self.get_all_notes()?.len()),
        }
    }

    pub fn insert_note(&self, note: Note) -> DatabaseResult<NoteId> {
        Ok(expect_output!(self.write(Transaction::InsertNote(note))?, NoteInserted))
    }

    /// Replaces the stored note. Returns false if no note has `id`.
    pub fn update_note(&self, id: NoteId, note: Note) -> DatabaseResult<bool> {
        Ok(expect_output!(self.write(Transaction::UpdateNote(id, note))?, Changed))
    }

    /// Deletes the note and its label associations. Returns false if no note has `id`.
    pub fn delete_note(&self, id: NoteId) -> DatabaseResult<bool> {
        Ok(expect_output!(self.write(Transaction::DeleteNote(id))?, Changed))
    }

    pub fn notes_sort_order(&self) -> NoteSortOrder {
        *self.sort_order.read()
    }

    /// Changes the order of [`get_all_notes`](Self::get_all_notes) and
    /// [`get_notes_for_label`](Self::get_notes_for_label).
    ///
    /// Nothing is written, so no listener is notified.
    pub fn set_notes_sort_order(&self, order: NoteSortOrder) {
        let mut current = self.sort_order.write();
        if *current != order {
            *current = order;
            self.list_cache.invalidate();
            debug!(%order, "Notes sort order changed");
        }
    }

    // ========================================================================
    // Labels
    // ========================================================================

    pub fn get_label(&self, id: LabelId) -> DatabaseResult<Option<LabelEntry>> {
        Ok(expect_output!(self.dispatcher.perform(Transaction::GetLabel(id))?, Label))
    }

    /// Returns every label ordered by name.
    pub fn get_all_labels(&self) -> DatabaseResult<Vec<LabelEntry>> {
        Ok(expect_output!(self.dispatcher.perform(Transaction::GetAllLabels)?, Labels))
    }

    pub fn insert_label(&self, label: Label) -> DatabaseResult<LabelId> {
        Ok(expect_output!(self.write(Transaction::InsertLabel(label))?, LabelInserted))
    }

    pub fn update_label(&self, id: LabelId, label: Label) -> DatabaseResult<bool> {
        Ok(expect_output!(self.write(Transaction::UpdateLabel(id, label))?, Changed))
    }

    /// Deletes the label and detaches it from every note.
    pub fn delete_label(&self, id: LabelId) -> DatabaseResult<bool> {
        Ok(expect_output!(self.write(Transaction::DeleteLabel(id))?, Changed))
    }

    // ========================================================================
    // Associations
    // ========================================================================

    /// Labels attached to a note, ordered by name.
    pub fn get_labels_for_note(&self, note_id: NoteId) -> DatabaseResult<Vec<LabelEntry>> {
        Ok(expect_output!(
            self.dispatcher.perform(Transaction::GetLabelsForNote(note_id))?,
            Labels
        ))
    }

    pub fn get_label_ids_for_note(&self, note_id: NoteId) -> DatabaseResult<HashSet<LabelId>> {
        Ok(expect_output!(
            self.dispatcher.perform(Transaction::GetLabelIdsForNote(note_id))?,
            LabelIds
        ))
    }

    /// Notes carrying a label, in the current sort order.
    pub fn get_notes_for_label(&self, label_id: LabelId) -> DatabaseResult<Vec<NoteEntry>> {
        let order = self.notes_sort_order();
        Ok(expect_output!(
            self.dispatcher.perform(Transaction::GetNotesForLabel(label_id, order))?,
            Notes
        ))
    }

    pub fn get_all_note_label_pairs(&self) -> DatabaseResult<HashSet<(NoteId, LabelId)>> {
        Ok(expect_output!(self.dispatcher.perform(Transaction::GetAllNoteLabelPairs)?, Pairs))
    }

    pub fn insert_label_to_note(
        &self,
        note_id: NoteId,
        label_id: LabelId,
    ) -> DatabaseResult<AssociationId> {
        Ok(expect_output!(
            self.write(Transaction::InsertLabelToNote { note_id, label_id })?,
            AssociationInserted
        ))
    }

    pub fn delete_label_from_note(&self, note_id: NoteId, label_id: LabelId) -> DatabaseResult<bool> {
        Ok(expect_output!(
            self.write(Transaction::DeleteLabelFromNote { note_id, label_id })?,
            Changed
        ))
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Deletes every note, label and association.
    pub fn delete_all_data(&self) -> DatabaseResult<()> {
        let committed = self.write(Transaction::WipeAll)?;
        match committed.output {
            TransactionOutput::Wiped => {
                info!("All notes data deleted");
                Ok(())
            }
            other => Err(DatabaseError::UnexpectedOutput {
                kind: committed.kind,
                output: other.name(),
            }),
        }
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn add_database_change_listener(&self, listener: Arc<dyn DatabaseChangeListener>) -> bool {
        self.listeners.add_database_listener(listener)
    }

    pub fn remove_database_change_listener<L>(&self, listener: &Arc<L>) -> bool
    where
        L: DatabaseChangeListener + ?Sized,
    {
        self.listeners.remove_database_listener(listener)
    }

    pub fn add_note_change_listener(&self, listener: Arc<dyn NoteChangeListener>) -> bool {
        self.listeners.add_note_listener(listener)
    }

    pub fn remove_note_change_listener<L>(&self, listener: &Arc<L>) -> bool
    where
        L: NoteChangeListener + ?Sized,
    {
        self.listeners.remove_note_listener(listener)
    }

    /// Blocks until every notification queued so far has been delivered.
    pub fn flush_notifications(&self) {
        self.notifier.flush();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Runs one write transaction under the write lock, then invalidates
    /// caches and queues notifications before releasing it, so listeners
    /// hear about writes in commit order.
    fn write(&self, transaction: Transaction) -> DatabaseResult<Committed> {
        let _guard = self.write_lock.lock();
        let committed = self.dispatcher.perform(transaction)?;
        if committed.output.changed_data() {
            self.after_change(&committed);
        }
        Ok(committed)
    }

    fn after_change(&self, committed: &Committed) {
        self.list_cache.invalidate();

        if committed.kind.modifies_existing_note() {
            let scope = committed
                .affected_note
                .map_or(NoteScope::Any, NoteScope::Note);
            self.note_cache.invalidate(scope);
            self.notifier.notify(ChangeEvent::NoteChanged(scope));
        }
        self.notifier.notify(ChangeEvent::DatabaseChanged);
    }

    #[cfg(test)]
    pub(crate) fn caches(&self) -> (&NoteCache, &NotesListCache) {
        (&self.note_cache, &self.list_cache)
    }

    #[cfg(test)]
    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
