use crate::error::StorageResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// A document as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub rev: String,
    pub doc_type: String,
    pub body: Map<String, Value>,
}

/// The two ordered views over one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    DateModified,
    Changes,
}

/// Which documents a view query returns, by their `mode` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Everything except test-mode documents.
    #[default]
    Real,
    Test,
    All,
}

impl ViewMode {
    /// Maps the `mode` query parameter. Unknown names give `None`.
    pub fn from_param(mode: &str) -> Option<Self> {
        match mode {
            "" => Some(Self::Real),
            "test" => Some(Self::Test),
            "_all_" => Some(Self::All),
            _ => None,
        }
    }
}

/// Index freshness requested for a view read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Staleness {
    /// Bring the index up to date before answering.
    #[default]
    Fresh,
    /// Answer from the current index and refresh it afterwards.
    UpdateAfter,
}

/// A view key. Sequence numbers collate before strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewKey {
    Seq(u64),
    Text(String),
}

impl Ord for ViewKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Seq(a), Self::Seq(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Seq(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Seq(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for ViewKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seq(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ViewKey {
    fn from(n: u64) -> Self {
        Self::Seq(n)
    }
}

impl From<&str> for ViewKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Parameters of a view read.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    pub doc_type: String,
    pub view: View,
    pub mode: ViewMode,
    /// Rows start at this key, inclusive, in the direction of `descending`.
    pub start: ViewKey,
    pub descending: bool,
    pub limit: usize,
    pub include_docs: bool,
    pub stale: Staleness,
    /// Body fields copied into each row's `value`.
    pub value_fields: Vec<String>,
}

impl ViewQuery {
    pub fn new(doc_type: &str, view: View, start: ViewKey) -> Self {
        Self {
            doc_type: doc_type.into(),
            view,
            mode: ViewMode::Real,
            start,
            descending: false,
            limit: 100,
            include_docs: false,
            stale: Staleness::Fresh,
            value_fields: Vec::new(),
        }
    }
}

/// One row of a view read.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub id: String,
    pub key: ViewKey,
    /// `dateModified` plus the requested value fields.
    pub value: Map<String, Value>,
    /// Full body, when the query asked for it.
    pub doc: Option<Map<String, Value>>,
}

/// The document database the API runs against.
pub trait DocumentStore: Send + Sync {
    /// Database name. Part of the cursor key.
    fn name(&self) -> &str;

    fn get(&self, id: &str) -> StorageResult<Option<StoredDocument>>;

    /// Inserts or replaces a document and returns its new revision.
    ///
    /// `expected_rev` must equal the stored revision (`None` for a new
    /// document), otherwise the write fails with a revision conflict.
    fn save(
        &self,
        id: &str,
        doc_type: &str,
        body: &Map<String, Value>,
        expected_rev: Option<&str>,
    ) -> StorageResult<String>;

    fn query_view(&self, query: &ViewQuery) -> StorageResult<Vec<ViewRow>>;
}
