//! JSON Patch support for partial document updates.
//!
//! - [`diff`] computes the operations needed to overlay a client-submitted
//!   (possibly partial) document onto a stored one. Keys the client omits are
//!   left alone and arrays follow the client's length.
//! - [`full_diff`] computes a complete RFC 6902 patch between two documents.
//!   Revision audit trails use it because removed keys matter there.
//! - [`apply`] applies a batch of operations to a copy of a document. Either
//!   every operation succeeds or the caller gets a [`PatchError`] and the
//!   original is untouched.

mod apply;
mod diff;
mod error;
mod op;

pub use apply::apply;
pub use diff::{diff, full_diff};
pub use error::{PatchError, PatchResult};
pub use op::{join_path, parse_pointer, PatchOperation};

use serde_json::Value;

/// Overlays `changes` onto `item`.
///
/// Returns `Ok(None)` when the overlay produces no operations, so callers can
/// skip re-importing an unchanged document.
pub fn apply_data_patch(item: &Value, changes: &Value) -> PatchResult<Option<Value>> {
    let operations = diff(item, changes);
    if operations.is_empty() {
        return Ok(None);
    }
    apply(item, &operations).map(Some)
}
