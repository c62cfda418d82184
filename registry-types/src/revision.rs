use serde::{Deserialize, Serialize};

/// One entry of a document's audit trail.
///
/// `changes` holds the JSON-Patch operations that turn the new state back
/// into the previous one, so any revision can be reconstructed by applying
/// the trail in reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub date: String,
    #[serde(default)]
    pub changes: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}
