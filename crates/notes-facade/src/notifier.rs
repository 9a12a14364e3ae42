//! Background delivery of change events.
//!
//! Events are queued on a channel in commit order and drained by one
//! dedicated thread, so listeners never run on the writer's thread and always
//! observe writes in the order they were committed.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tracing::{debug, trace, warn};

use crate::listener::{ChangeEvent, ListenerRegistry};

enum Message {
    Event(ChangeEvent),
    /// Acknowledged once every message queued before it has been handled.
    Flush(Sender<()>),
}

/// Owns the notifier thread. Dropping it closes the queue and lets the
/// thread finish delivering what is already queued.
pub(crate) struct Notifier {
    sender: Sender<Message>,
    thread: ThreadId,
}

impl Notifier {
    pub(crate) fn spawn(listeners: Arc<ListenerRegistry>) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("notes-notifier".into())
            .spawn(move || {
                for message in receiver {
                    match message {
                        Message::Event(event) => {
                            trace!(?event, "Delivering change event");
                            listeners.dispatch(event);
                        }
                        Message::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
                trace!("Notifier queue closed");
            })?;

        Ok(Self {
            sender,
            thread: handle.thread().id(),
        })
    }

    /// Queues an event for delivery.
    pub(crate) fn notify(&self, event: ChangeEvent) {
        if self.sender.send(Message::Event(event)).is_err() {
            warn!(?event, "Notifier thread is gone, change event dropped");
        }
    }

    /// Blocks until every event queued before this call has been delivered.
    ///
    /// Called from a listener callback it returns at once: the notifier
    /// thread cannot wait on its own queue.
    pub(crate) fn flush(&self) {
        if thread::current().id() == self.thread {
            debug!("Flush requested from the notifier thread, skipping");
            return;
        }
        let (ack, done) = mpsc::channel();
        if self.sender.send(Message::Flush(ack)).is_ok() {
            let _ = done.recv();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{NoteScope, RecordingDatabaseListener, RecordingNoteListener};
    use notes_database::NoteId;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn delivers_events_after_flush() {
        let registry = Arc::new(ListenerRegistry::new());
        let db = Arc::new(RecordingDatabaseListener::new());
        let note = Arc::new(RecordingNoteListener::new(NoteId(5)));
        registry.add_database_listener(db.clone());
        registry.add_note_listener(note.clone());

        let notifier = Notifier::spawn(registry).unwrap();
        notifier.notify(ChangeEvent::DatabaseChanged);
        notifier.notify(ChangeEvent::NoteChanged(NoteScope::Note(NoteId(5))));
        notifier.notify(ChangeEvent::NoteChanged(NoteScope::Note(NoteId(6))));
        notifier.flush();

        assert_eq!(db.calls(), 1);
        assert_eq!(note.calls(), 1);
    }

    #[test]
    fn callbacks_run_off_the_calling_thread() {
        let registry = Arc::new(ListenerRegistry::new());
        let caller = thread::current().id();
        let ran_elsewhere = Arc::new(AtomicBool::new(false));
        let flag = ran_elsewhere.clone();
        registry.add_database_listener(Arc::new(move || {
            flag.store(thread::current().id() != caller, Ordering::SeqCst);
        }));

        let notifier = Notifier::spawn(registry).unwrap();
        notifier.notify(ChangeEvent::DatabaseChanged);
        notifier.flush();

        assert!(ran_elsewhere.load(Ordering::SeqCst));
    }

    #[test]
    fn flush_from_a_callback_returns() {
        let registry = Arc::new(ListenerRegistry::new());
        let notifier = Arc::new(Notifier::spawn(Arc::clone(&registry)).unwrap());
        let flushed = Arc::new(AtomicBool::new(false));

        let weak = Arc::downgrade(&notifier);
        let flag = flushed.clone();
        registry.add_database_listener(Arc::new(move || {
            if let Some(notifier) = weak.upgrade() {
                notifier.flush();
                flag.store(true, Ordering::SeqCst);
            }
        }));

        notifier.notify(ChangeEvent::DatabaseChanged);
        notifier.flush();

        assert!(flushed.load(Ordering::SeqCst));
    }

    #[test]
    fn flush_without_events_returns() {
        let notifier = Notifier::spawn(Arc::new(ListenerRegistry::new())).unwrap();
        notifier.flush();
        notifier.flush();
    }
}
