//! Model types for the notes database.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DatabaseError;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw row id.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

row_id!(
    /// Row id of a note. Positive once persisted.
    NoteId
);
row_id!(
    /// Row id of a label. Positive once persisted.
    LabelId
);
row_id!(
    /// Row id of a note/label association row.
    AssociationId
);

/// A short text note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

impl Note {
    /// Creates a note stamped with the current time for both timestamps.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            title: title.into(),
            body: body.into(),
            created_at: now,
            changed_at: now,
        }
    }

    /// Returns an edited copy that keeps the creation time and refreshes the change time.
    pub fn edit(&self, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            created_at: self.created_at,
            changed_at: now_millis().max(self.created_at),
        }
    }
}

/// A label that can be attached to any number of notes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Packed `0xRRGGBB` color.
    pub color: u32,
}

impl Label {
    pub fn new(name: impl Into<String>, color: u32) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// An entity paired with the id of the row it was read from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry<I, T> {
    pub id: I,
    #[serde(flatten)]
    pub entity: T,
}

impl<I, T> DatabaseEntry<I, T> {
    pub fn new(id: I, entity: T) -> Self {
        Self { id, entity }
    }
}

pub type NoteEntry = DatabaseEntry<NoteId, Note>;
pub type LabelEntry = DatabaseEntry<LabelId, Label>;

/// Order in which notes are listed.
///
/// Every order ends with an `id` tie-break so listings are total and stable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSortOrder {
    /// By title, case-respecting.
    Title,
    /// Oldest first.
    CreatedAscending,
    /// Newest first.
    CreatedDescending,
    /// Most recently touched first.
    #[default]
    ChangedDescending,
}

impl NoteSortOrder {
    /// SQL `ORDER BY` clause body for this order.
    pub(crate) fn order_by(self) -> &'static str {
        match self {
            NoteSortOrder::Title => "name ASC, id ASC",
            NoteSortOrder::CreatedAscending => "create_date ASC, id ASC",
            NoteSortOrder::CreatedDescending => "create_date DESC, id DESC",
            NoteSortOrder::ChangedDescending => "change_date DESC, id DESC",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteSortOrder::Title => "title",
            NoteSortOrder::CreatedAscending => "created",
            NoteSortOrder::CreatedDescending => "created_desc",
            NoteSortOrder::ChangedDescending => "changed",
        }
    }
}

impl fmt::Display for NoteSortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteSortOrder {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(NoteSortOrder::Title),
            "created" | "created_asc" | "created_ascending" => Ok(NoteSortOrder::CreatedAscending),
            "created_desc" | "created_descending" => Ok(NoteSortOrder::CreatedDescending),
            "changed" | "changed_desc" | "changed_descending" => {
                Ok(NoteSortOrder::ChangedDescending)
            }
            other => Err(DatabaseError::InvalidData(format!(
                "unsupported sort order: {other}"
            ))),
        }
    }
}

/// Current time truncated to the millisecond precision the schema stores.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
