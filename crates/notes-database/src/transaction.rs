//! Transaction dispatcher.
//!
//! Translates one [`Transaction`] into one or more [`SchemaStore`] calls on a
//! connection opened for that call alone, and reports which note (if any) the
//! transaction touched.
//!
//! # Write path
//!
//! 1. Open a fresh connection
//! 2. Run every statement of the transaction inside one `IMMEDIATE` SQLite
//!    transaction (cascading deletes included)
//! 3. Commit, close the connection, return
//!
//! If any statement fails the SQLite transaction is rolled back, so a cascade
//! can never stop halfway and leave orphaned associations behind. The
//! connection is dropped on every path. Once a write has committed, a failure
//! to close the connection is logged and the committed output still returned.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::connection::ConnectionFactory;
use crate::models::{
    AssociationId, Label, LabelEntry, LabelId, Note, NoteEntry, NoteId, NoteSortOrder,
};
use crate::store::SchemaStore;
use crate::DatabaseResult;

/// One logical operation against the notes database.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    GetNote(NoteId),
    GetAllNotes(NoteSortOrder),
    InsertNote(Note),
    UpdateNote(NoteId, Note),
    DeleteNote(NoteId),

    GetLabel(LabelId),
    GetAllLabels,
    InsertLabel(Label),
    UpdateLabel(LabelId, Label),
    DeleteLabel(LabelId),

    GetLabelsForNote(NoteId),
    GetLabelIdsForNote(NoteId),
    GetNotesForLabel(LabelId, NoteSortOrder),
    GetAllNoteLabelPairs,
    InsertLabelToNote { note_id: NoteId, label_id: LabelId },
    DeleteLabelFromNote { note_id: NoteId, label_id: LabelId },

    WipeAll,
}

/// Payload-free discriminant of a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    GetNote,
    GetAllNotes,
    InsertNote,
    UpdateNote,
    DeleteNote,

    GetLabel,
    GetAllLabels,
    InsertLabel,
    UpdateLabel,
    DeleteLabel,

    GetLabelsForNote,
    GetLabelIdsForNote,
    GetNotesForLabel,
    GetAllNoteLabelPairs,
    InsertLabelToNote,
    DeleteLabelFromNote,

    WipeAll,
}

impl TransactionKind {
    /// Whether the transaction writes to the database.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            TransactionKind::InsertNote
                | TransactionKind::UpdateNote
                | TransactionKind::DeleteNote
                | TransactionKind::InsertLabel
                | TransactionKind::UpdateLabel
                | TransactionKind::DeleteLabel
                | TransactionKind::InsertLabelToNote
                | TransactionKind::DeleteLabelFromNote
                | TransactionKind::WipeAll
        )
    }

    /// Whether the transaction can change data an existing note is shown with.
    ///
    /// Inserting a note creates one rather than modifying one, and label
    /// inserts reference no note yet.
    pub fn modifies_existing_note(self) -> bool {
        matches!(
            self,
            TransactionKind::UpdateNote
                | TransactionKind::DeleteNote
                | TransactionKind::UpdateLabel
                | TransactionKind::DeleteLabel
                | TransactionKind::InsertLabelToNote
                | TransactionKind::DeleteLabelFromNote
                | TransactionKind::WipeAll
        )
    }
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::GetNote(_) => TransactionKind::GetNote,
            Transaction::GetAllNotes(_) => TransactionKind::GetAllNotes,
            Transaction::InsertNote(_) => TransactionKind::InsertNote,
            Transaction::UpdateNote(..) => TransactionKind::UpdateNote,
            Transaction::DeleteNote(_) => TransactionKind::DeleteNote,
            Transaction::GetLabel(_) => TransactionKind::GetLabel,
            Transaction::GetAllLabels => TransactionKind::GetAllLabels,
            Transaction::InsertLabel(_) => TransactionKind::InsertLabel,
            Transaction::UpdateLabel(..) => TransactionKind::UpdateLabel,
            Transaction::DeleteLabel(_) => TransactionKind::DeleteLabel,
            Transaction::GetLabelsForNote(_) => TransactionKind::GetLabelsForNote,
            Transaction::GetLabelIdsForNote(_) => TransactionKind::GetLabelIdsForNote,
            Transaction::GetNotesForLabel(..) => TransactionKind::GetNotesForLabel,
            Transaction::GetAllNoteLabelPairs => TransactionKind::GetAllNoteLabelPairs,
            Transaction::InsertLabelToNote { .. } => TransactionKind::InsertLabelToNote,
            Transaction::DeleteLabelFromNote { .. } => TransactionKind::DeleteLabelFromNote,
            Transaction::WipeAll => TransactionKind::WipeAll,
        }
    }

    /// The note this transaction targets, when exactly one is known up front.
    fn target_note(&self) -> Option<NoteId> {
        match self {
            Transaction::GetNote(id)
            | Transaction::UpdateNote(id, _)
            | Transaction::DeleteNote(id)
            | Transaction::GetLabelsForNote(id)
            | Transaction::GetLabelIdsForNote(id) => Some(*id),
            Transaction::InsertLabelToNote { note_id, .. }
            | Transaction::DeleteLabelFromNote { note_id, .. } => Some(*note_id),
            _ => None,
        }
    }
}

/// What a transaction produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutput {
    Note(Option<NoteEntry>),
    Notes(Vec<NoteEntry>),
    Label(Option<LabelEntry>),
    Labels(Vec<LabelEntry>),
    LabelIds(HashSet<LabelId>),
    Pairs(HashSet<(NoteId, LabelId)>),
    NoteInserted(NoteId),
    LabelInserted(LabelId),
    AssociationInserted(AssociationId),
    /// Result of an update or delete: whether a row matched.
    Changed(bool),
    Wiped,
}

impl TransactionOutput {
    /// Variant name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TransactionOutput::Note(_) => "Note",
            TransactionOutput::Notes(_) => "Notes",
            TransactionOutput::Label(_) => "Label",
            TransactionOutput::Labels(_) => "Labels",
            TransactionOutput::LabelIds(_) => "LabelIds",
            TransactionOutput::Pairs(_) => "Pairs",
            TransactionOutput::NoteInserted(_) => "NoteInserted",
            TransactionOutput::LabelInserted(_) => "LabelInserted",
            TransactionOutput::AssociationInserted(_) => "AssociationInserted",
            TransactionOutput::Changed(_) => "Changed",
            TransactionOutput::Wiped => "Wiped",
        }
    }

    /// Whether a write actually changed stored data.
    ///
    /// Reads always report false.
    pub fn changed_data(&self) -> bool {
        match self {
            TransactionOutput::NoteInserted(_)
            | TransactionOutput::LabelInserted(_)
            | TransactionOutput::AssociationInserted(_)
            | TransactionOutput::Wiped => true,
            TransactionOutput::Changed(changed) => *changed,
            _ => false,
        }
    }
}

/// A completed transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub kind: TransactionKind,
    pub output: TransactionOutput,
    /// The single note the transaction touched, `None` for label-only and
    /// bulk operations.
    pub affected_note: Option<NoteId>,
}

/// Executes transactions, one fresh connection per call.
pub struct Dispatcher {
    connections: ConnectionFactory,
}

impl Dispatcher {
    pub fn new(connections: ConnectionFactory) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &ConnectionFactory {
        &self.connections
    }

    /// Performs one transaction to completion.
    pub fn perform(&self, transaction: Transaction) -> DatabaseResult<Committed> {
        let kind = transaction.kind();
        let affected_note = transaction.target_note();
        let _access = self.connections.access(kind.is_write());
        let mut conn = self.connections.connect()?;

        let output = if kind.is_write() {
            conn.write(|store| execute(store, transaction))?
        } else {
            execute(&conn.store(), transaction)?
        };
        if let Err(error) = conn.close() {
            warn!(?kind, %error, "Failed to close store connection");
        }

        debug!(?kind, note_id = ?affected_note, output = output.name(), "Database transaction performed");

        Ok(Committed {
            kind,
            output,
            affected_note,
        })
    }
}

fn execute(store: &SchemaStore<'_>, transaction: Transaction) -> DatabaseResult<TransactionOutput> {
    let output = match transaction {
        Transaction::GetNote(id) => TransactionOutput::Note(store.get_note(id)?),
        Transaction::GetAllNotes(order) => TransactionOutput::Notes(store.list_notes(Some(order))?),
        Transaction::InsertNote(note) => TransactionOutput::NoteInserted(store.insert_note(&note)?),
        Transaction::UpdateNote(id, note) => TransactionOutput::Changed(store.update_note(id, &note)?),
        Transaction::DeleteNote(id) => {
            for label in store.labels_for_note(id, false)? {
                store.delete_association(id, label.id)?;
            }
            TransactionOutput::Changed(store.delete_note(id)?)
        }

        Transaction::GetLabel(id) => TransactionOutput::Label(store.get_label(id)?),
        Transaction::GetAllLabels => TransactionOutput::Labels(store.list_labels()?),
        Transaction::InsertLabel(label) => {
            TransactionOutput::LabelInserted(store.insert_label(&label)?)
        }
        Transaction::UpdateLabel(id, label) => {
            TransactionOutput::Changed(store.update_label(id, &label)?)
        }
        Transaction::DeleteLabel(id) => {
            for note in store.notes_for_label(id, None)? {
                store.delete_association(note.id, id)?;
            }
            TransactionOutput::Changed(store.delete_label(id)?)
        }

        Transaction::GetLabelsForNote(note_id) => {
            TransactionOutput::Labels(store.labels_for_note(note_id, true)?)
        }
        Transaction::GetLabelIdsForNote(note_id) => {
            TransactionOutput::LabelIds(store.label_ids_for_note(note_id)?)
        }
        Transaction::GetNotesForLabel(label_id, order) => {
            TransactionOutput::Notes(store.notes_for_label(label_id, Some(order))?)
        }
        Transaction::GetAllNoteLabelPairs => {
            TransactionOutput::Pairs(store.all_association_pairs()?)
        }
        Transaction::InsertLabelToNote { note_id, label_id } => {
            TransactionOutput::AssociationInserted(store.insert_association(note_id, label_id)?)
        }
        Transaction::DeleteLabelFromNote { note_id, label_id } => {
            TransactionOutput::Changed(store.delete_association(note_id, label_id)?)
        }

        Transaction::WipeAll => {
            store.wipe_all()?;
            TransactionOutput::Wiped
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::StoreConfig;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(ConnectionFactory::in_memory().unwrap())
    }

    fn insert_note(d: &Dispatcher, title: &str) -> NoteId {
        match d.perform(Transaction::InsertNote(Note::new(title, ""))).unwrap().output {
            TransactionOutput::NoteInserted(id) => id,
            other => panic!("unexpected output {other:?}"),
        }
    }

    fn insert_label(d: &Dispatcher, name: &str) -> LabelId {
        match d.perform(Transaction::InsertLabel(Label::new(name, 0))).unwrap().output {
            TransactionOutput::LabelInserted(id) => id,
            other => panic!("unexpected output {other:?}"),
        }
    }

    fn pairs(d: &Dispatcher) -> HashSet<(NoteId, LabelId)> {
        match d.perform(Transaction::GetAllNoteLabelPairs).unwrap().output {
            TransactionOutput::Pairs(pairs) => pairs,
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn kinds_classify_writes() {
        assert!(!TransactionKind::GetNote.is_write());
        assert!(!TransactionKind::GetAllNoteLabelPairs.is_write());
        assert!(TransactionKind::InsertNote.is_write());
        assert!(TransactionKind::WipeAll.is_write());

        assert!(!TransactionKind::InsertNote.modifies_existing_note());
        assert!(!TransactionKind::InsertLabel.modifies_existing_note());
        assert!(TransactionKind::UpdateLabel.modifies_existing_note());
        assert!(TransactionKind::DeleteLabelFromNote.modifies_existing_note());
    }

    #[test]
    fn reports_affected_note() {
        let d = dispatcher();
        let note = insert_note(&d, "n");
        let label = insert_label(&d, "l");

        let committed = d
            .perform(Transaction::InsertLabelToNote {
                note_id: note,
                label_id: label,
            })
            .unwrap();
        assert_eq!(committed.kind, TransactionKind::InsertLabelToNote);
        assert_eq!(committed.affected_note, Some(note));
        assert!(committed.output.changed_data());

        let committed = d.perform(Transaction::DeleteLabel(label)).unwrap();
        assert_eq!(committed.affected_note, None);
        assert_eq!(committed.output, TransactionOutput::Changed(true));
    }

    #[test]
    fn delete_note_cascades_to_associations() {
        let d = dispatcher();
        let keep = insert_note(&d, "keep");
        let doomed = insert_note(&d, "doomed");
        let labels: Vec<_> = ["a", "b", "c"].iter().map(|n| insert_label(&d, n)).collect();
        for &label in &labels {
            d.perform(Transaction::InsertLabelToNote { note_id: doomed, label_id: label })
                .unwrap();
        }
        d.perform(Transaction::InsertLabelToNote { note_id: keep, label_id: labels[0] })
            .unwrap();

        let committed = d.perform(Transaction::DeleteNote(doomed)).unwrap();
        assert_eq!(committed.output, TransactionOutput::Changed(true));
        assert_eq!(pairs(&d), HashSet::from([(keep, labels[0])]));
    }

    #[test]
    fn delete_label_cascades_to_associations() {
        let d = dispatcher();
        let n1 = insert_note(&d, "one");
        let n2 = insert_note(&d, "two");
        let label = insert_label(&d, "shared");
        let other = insert_label(&d, "other");
        for note in [n1, n2] {
            d.perform(Transaction::InsertLabelToNote { note_id: note, label_id: label })
                .unwrap();
        }
        d.perform(Transaction::InsertLabelToNote { note_id: n2, label_id: other })
            .unwrap();

        d.perform(Transaction::DeleteLabel(label)).unwrap();

        assert_eq!(pairs(&d), HashSet::from([(n2, other)]));
        match d.perform(Transaction::GetLabel(label)).unwrap().output {
            TransactionOutput::Label(entry) => assert!(entry.is_none()),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn failed_cascade_keeps_every_association() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        let d = Dispatcher::new(ConnectionFactory::open(&path, StoreConfig::default()).unwrap());
        let note = insert_note(&d, "tagged");
        let labels: Vec<_> = ["a", "b", "c"].iter().map(|n| insert_label(&d, n)).collect();
        for &label in &labels {
            d.perform(Transaction::InsertLabelToNote { note_id: note, label_id: label })
                .unwrap();
        }

        // Refuse to detach a note's last label, after the others are gone.
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER refuse_last_detach BEFORE DELETE ON notes_labels
                 WHEN (SELECT COUNT(*) FROM notes_labels WHERE note_id = OLD.note_id) = 1
                 BEGIN SELECT RAISE(ABORT, 'detach refused'); END;",
            )
            .unwrap();

        assert!(d.perform(Transaction::DeleteNote(note)).is_err());

        let expected: HashSet<_> = labels.iter().map(|&label| (note, label)).collect();
        assert_eq!(pairs(&d), expected);
        match d.perform(Transaction::GetNote(note)).unwrap().output {
            TransactionOutput::Note(entry) => assert!(entry.is_some()),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn writes_release_the_in_memory_gate() {
        let d = dispatcher();
        let note = insert_note(&d, "first");
        let committed = d
            .perform(Transaction::UpdateNote(note, Note::new("second", "")))
            .unwrap();
        assert_eq!(committed.output, TransactionOutput::Changed(true));

        assert!(matches!(d.connections().access(true), crate::AccessGuard::Write(_)));
        match d.perform(Transaction::GetNote(note)).unwrap().output {
            TransactionOutput::Note(Some(entry)) => assert_eq!(entry.entity.title, "second"),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn deleting_missing_rows_changes_nothing() {
        let d = dispatcher();
        let output = d.perform(Transaction::DeleteNote(NoteId(7))).unwrap().output;
        assert_eq!(output, TransactionOutput::Changed(false));
        assert!(!output.changed_data());

        let output = d.perform(Transaction::DeleteLabel(LabelId(7))).unwrap().output;
        assert!(!output.changed_data());
    }

    #[test]
    fn failed_association_insert_is_an_error() {
        let d = dispatcher();
        let label = insert_label(&d, "l");

        let result = d.perform(Transaction::InsertLabelToNote {
            note_id: NoteId(404),
            label_id: label,
        });
        assert!(result.is_err());
        assert!(pairs(&d).is_empty());
    }

    #[test]
    fn reads_use_requested_order() {
        let d = dispatcher();
        insert_note(&d, "b");
        insert_note(&d, "a");

        match d.perform(Transaction::GetAllNotes(NoteSortOrder::Title)).unwrap().output {
            TransactionOutput::Notes(notes) => {
                assert_eq!(notes[0].entity.title, "a");
                assert_eq!(notes[1].entity.title, "b");
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn wipe_all_reports_wiped() {
        let d = dispatcher();
        insert_note(&d, "n");
        let committed = d.perform(Transaction::WipeAll).unwrap();
        assert_eq!(committed.output, TransactionOutput::Wiped);
        assert_eq!(committed.affected_note, None);
    }
}
