use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use notes_database::{Label, Note, StoreConfig};
use tempfile::TempDir;

use crate::{NotesDatabase, RecordingDatabaseListener};

fn file_database() -> (TempDir, Arc<NotesDatabase>) {
    let dir = tempfile::tempdir().unwrap();
    let db = NotesDatabase::open(dir.path().join("notes.db"), StoreConfig::default()).unwrap();
    (dir, Arc::new(db))
}

#[test]
fn concurrent_writers_are_serialized() {
    let (_dir, db) = file_database();
    let listener = Arc::new(RecordingDatabaseListener::new());
    db.add_database_change_listener(listener.clone());

    let writers: Vec<_> = (0..4)
        .map(|worker| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for i in 0..25 {
                    db.insert_note(Note::new(format!("w{worker}-{i}"), "")).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    db.flush_notifications();

    assert_eq!(db.get_notes_count().unwrap(), 100);
    assert_eq!(listener.calls(), 100);
}

#[test]
fn readers_see_every_completed_write() {
    let (_dir, db) = file_database();
    let id = db.insert_note(Note::new("v0", "")).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let db = Arc::clone(&db);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    assert!(db.get_note(id).unwrap().is_some());
                    assert!(!db.get_all_notes().unwrap().is_empty());
                }
            })
        })
        .collect();

    for version in 1..=50 {
        db.update_note(id, Note::new(format!("v{version}"), "")).unwrap();
        db.insert_note(Note::new("filler", "")).unwrap();
    }
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(db.get_note(id).unwrap().unwrap().entity.title, "v50");
    assert_eq!(db.get_notes_count().unwrap(), 51);
    assert_eq!(db.get_all_notes().unwrap().len(), 51);
}

#[test]
fn in_memory_reads_run_alongside_writes() {
    let db = Arc::new(NotesDatabase::in_memory().unwrap());
    let id = db.insert_note(Note::new("v0", "")).unwrap();
    let label = db.insert_label(Label::new("work", 0)).unwrap();
    db.insert_label_to_note(id, label).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let db = Arc::clone(&db);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    assert!(!db.get_all_notes().unwrap().is_empty());
                    assert_eq!(db.get_labels_for_note(id).unwrap().len(), 1);
                }
            })
        })
        .collect();

    for version in 1..=200 {
        db.update_note(id, Note::new(format!("v{version}"), "")).unwrap();
        db.insert_note(Note::new("filler", "")).unwrap();
    }
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(db.get_note(id).unwrap().unwrap().entity.title, "v200");
    assert_eq!(db.get_notes_count().unwrap(), 201);
}

#[test]
fn writes_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");
    {
        let db = NotesDatabase::open(&path, StoreConfig::default()).unwrap();
        db.insert_note(Note::new("persisted", "body")).unwrap();
    }

    let db = NotesDatabase::open(&path, StoreConfig::default()).unwrap();
    let notes = db.get_all_notes().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].entity.title, "persisted");
}
