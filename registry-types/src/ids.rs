//! Identifier types used throughout the registry.
//!
//! Documents, nested items and access tokens are all identified by random
//! UUID v4 values rendered in their 32-character "simple" hex form.

use uuid::Uuid;

/// Generates a fresh 32-character hex identifier.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
