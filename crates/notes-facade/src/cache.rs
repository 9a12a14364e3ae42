//! Freshness-tracked caches for the most recent note and the note list.
//!
//! Each cache carries a generation counter that every invalidation bumps.
//! A reader that missed remembers the generation it saw and hands it back
//! with the refreshed value; the value only becomes fresh if no write
//! invalidated the cache in between.

use std::sync::Arc;

use notes_database::{NoteEntry, NoteId};
use parking_lot::RwLock;

use crate::listener::NoteScope;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lookup<T> {
    Hit(T),
    /// Refresh from storage, then store with this generation.
    Miss { generation: u64 },
}

#[derive(Default)]
struct NoteSlot {
    entry: Option<NoteEntry>,
    fresh: bool,
    generation: u64,
}

/// One-entry cache of the most recently fetched note.
#[derive(Default)]
pub(crate) struct NoteCache {
    slot: RwLock<NoteSlot>,
}

impl NoteCache {
    pub(crate) fn lookup(&self, id: NoteId) -> Lookup<NoteEntry> {
        let slot = self.slot.read();
        match &slot.entry {
            Some(entry) if slot.fresh && entry.id == id => Lookup::Hit(entry.clone()),
            _ => Lookup::Miss {
                generation: slot.generation,
            },
        }
    }

    /// Caches a refreshed result. Returns false if a write invalidated the
    /// cache since `generation` was observed.
    ///
    /// An absent note is never cached: the slot just stops being fresh.
    pub(crate) fn store(&self, entry: Option<NoteEntry>, generation: u64) -> bool {
        let mut slot = self.slot.write();
        if slot.generation != generation {
            return false;
        }
        slot.fresh = entry.is_some();
        slot.entry = entry;
        true
    }

    /// Records a committed write that may have changed notes in `scope`.
    pub(crate) fn invalidate(&self, scope: NoteScope) {
        let mut slot = self.slot.write();
        slot.generation += 1;
        let cached = slot.entry.as_ref().map(|entry| entry.id);
        if cached.is_some_and(|id| scope.includes(id)) {
            slot.fresh = false;
        }
    }

    #[cfg(test)]
    pub(crate) fn is_fresh_for(&self, id: NoteId) -> bool {
        matches!(self.lookup(id), Lookup::Hit(_))
    }
}

#[derive(Default)]
struct ListSlot {
    notes: Option<Arc<[NoteEntry]>>,
    fresh: bool,
    generation: u64,
}

/// Cache of the full note list in the current sort order.
#[derive(Default)]
pub(crate) struct NotesListCache {
    slot: RwLock<ListSlot>,
}

impl NotesListCache {
    pub(crate) fn lookup(&self) -> Lookup<Arc<[NoteEntry]>> {
        let slot = self.slot.read();
        match &slot.notes {
            Some(notes) if slot.fresh => Lookup::Hit(Arc::clone(notes)),
            _ => Lookup::Miss {
                generation: slot.generation,
            },
        }
    }

    /// Number of notes in the cached list, known only while it is fresh.
    pub(crate) fn count(&self) -> Option<usize> {
        let slot = self.slot.read();
        match &slot.notes {
            Some(notes) if slot.fresh => Some(notes.len()),
            _ => None,
        }
    }

    pub(crate) fn store(&self, notes: Arc<[NoteEntry]>, generation: u64) -> bool {
        let mut slot = self.slot.write();
        if slot.generation != generation {
            return false;
        }
        slot.notes = Some(notes);
        slot.fresh = true;
        true
    }

    pub(crate) fn invalidate(&self) {
        let mut slot = self.slot.write();
        slot.generation += 1;
        slot.fresh = false;
    }

    #[cfg(test)]
    pub(crate) fn is_fresh(&self) -> bool {
        self.slot.read().fresh
    }
}
