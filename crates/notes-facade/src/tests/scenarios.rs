use notes_database::{Label, Note, NoteId};

use super::{database, work_label};

#[test]
fn note_lifecycle() {
    let db = database();

    let id = db.insert_note(Note::new("A", "B")).unwrap();
    assert_eq!(id, NoteId(1));

    let entry = db.get_note(id).unwrap().unwrap();
    assert_eq!(entry.entity.title, "A");
    assert_eq!(entry.entity.body, "B");

    assert!(db.update_note(id, entry.entity.edit("A2", "B")).unwrap());
    assert_eq!(db.get_note(id).unwrap().unwrap().entity.title, "A2");

    assert!(db.delete_note(id).unwrap());
    assert_eq!(db.get_note(id).unwrap(), None);
    assert_eq!(db.get_notes_count().unwrap(), 0);
}

#[test]
fn label_lifecycle() {
    let db = database();

    let label = db.insert_label(work_label()).unwrap();
    assert_eq!(label.get(), 1);
    let note = db.insert_note(Note::new("A", "B")).unwrap();
    assert_eq!(note.get(), 1);

    db.insert_label_to_note(note, label).unwrap();
    let labels = db.get_labels_for_note(note).unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].id, label);
    assert_eq!(labels[0].entity, Label::new("work", 0xFF0000));

    assert!(db.delete_label(label).unwrap());
    assert!(db.get_labels_for_note(note).unwrap().is_empty());
    assert_eq!(db.get_label(label).unwrap(), None);
}
