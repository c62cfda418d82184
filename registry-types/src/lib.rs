//! Core type definitions for the registry API.
//!
//! This crate defines the small, schema-agnostic types shared by every
//! other crate in the workspace:
//! - Document identifiers (UUID v4 rendered as 32 lowercase hex digits)
//! - ISO-8601 timestamps localised to a configured default offset
//! - The [`Revision`] audit record appended on every committed write
//!
//! Business schemas (organizations, items, documents, ...) live in
//! `registry-model`, not here.

mod ids;
mod revision;
mod timestamp;

pub use ids::generate_id;
pub use revision::Revision;
pub use timestamp::{parse_offset, Timestamp};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not parse {0}. Should be ISO8601.")]
    InvalidTimestamp(String),

    #[error("invalid UTC offset: {0}")]
    InvalidOffset(String),
}
