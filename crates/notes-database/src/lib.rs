//! SQLite persistence for notes, labels and the many-to-many association
//! between them.
//!
//! This crate provides:
//! - Schema creation with "current version wins" versioning
//! - Scoped connections opened per operation
//! - Row-level CRUD and join queries ([`SchemaStore`])
//! - A dispatcher that runs one [`Transaction`] per call, cascading deletes
//!   of notes and labels to their associations atomically
//!
//! # Example
//!
//! ```
//! use notes_database::{ConnectionFactory, Dispatcher, Note, Transaction, TransactionOutput};
//!
//! let dispatcher = Dispatcher::new(ConnectionFactory::in_memory().unwrap());
//! let committed = dispatcher
//!     .perform(Transaction::InsertNote(Note::new("Groceries", "milk, eggs")))
//!     .unwrap();
//! assert!(matches!(committed.output, TransactionOutput::NoteInserted(_)));
//! ```
//!
//! Caching and change notification live one layer up, in `notes-facade`.

mod connection;
mod error;
mod models;
pub mod schema;
mod store;
mod transaction;

pub use connection::{AccessGuard, ConnectionFactory, StoreConfig, StoreConnection};
pub use error::{DatabaseError, DatabaseResult};
pub use models::*;
pub use store::SchemaStore;
pub use transaction::{Committed, Dispatcher, Transaction, TransactionKind, TransactionOutput};
