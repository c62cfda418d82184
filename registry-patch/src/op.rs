//! Patch operations and JSON Pointer paths.

use crate::error::{PatchError, PatchResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single RFC 6902 operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
}

impl PatchOperation {
    /// Returns the JSON Pointer this operation targets.
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Remove { path } | Self::Replace { path, .. } => path,
        }
    }
}

/// Appends one reference token to a pointer, escaping `~` and `/`.
pub fn join_path(base: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{base}/{escaped}")
}

/// Splits a pointer into unescaped reference tokens. `""` is the root.
pub fn parse_pointer(path: &str) -> PatchResult<Vec<String>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer(path.to_string()));
    };
    rest.split('/')
        .map(|token| {
            if !valid_escapes(token) {
                return Err(PatchError::InvalidPointer(path.to_string()));
            }
            Ok(token.replace("~1", "/").replace("~0", "~"))
        })
        .collect()
}

fn valid_escapes(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes
        .iter()
        .enumerate()
        .all(|(i, b)| *b != b'~' || matches!(bytes.get(i + 1), Some(b'0' | b'1')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_escapes_special_characters() {
        assert_eq!(join_path("", "a/b"), "/a~1b");
        assert_eq!(join_path("/x", "m~n"), "/x/m~0n");
    }

    #[test]
    fn parse_inverts_join() {
        let path = join_path(&join_path("", "a/b"), "c~d");
        assert_eq!(parse_pointer(&path).unwrap(), vec!["a/b", "c~d"]);
    }

    #[test]
    fn parse_root_and_empty_token() {
        assert!(parse_pointer("").unwrap().is_empty());
        assert_eq!(parse_pointer("/").unwrap(), vec![""]);
    }

    #[test]
    fn parse_rejects_missing_slash_and_bad_escape() {
        assert!(parse_pointer("a/b").is_err());
        assert!(parse_pointer("/a~2").is_err());
        assert!(parse_pointer("/a~").is_err());
    }
}
