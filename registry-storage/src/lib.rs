//! Document storage for the registry API.
//!
//! Documents are JSON objects stored with an optimistic revision. A write
//! names the revision it was based on and fails with
//! [`StorageError::RevisionConflict`] if someone else wrote first.
//!
//! Two ordered views back the listing endpoints:
//! - [`View::DateModified`] keyed by the `dateModified` string
//! - [`View::Changes`] keyed by a store-wide update sequence
//!
//! Keys collate like CouchDB: every sequence number sorts before every
//! string, which is what makes the `"now"` and `"9"` start sentinels work.

mod document_store;
mod error;
mod sqlite;

pub use document_store::{
    DocumentStore, Staleness, StoredDocument, View, ViewKey, ViewMode, ViewQuery, ViewRow,
};
pub use error::{StorageError, StorageResult};
pub use sqlite::SqliteStore;
