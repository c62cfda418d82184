//! Paged listings over the `dateModified` view and the changes feed.
//!
//! A page is read from the store starting at the offset key, inclusive. When
//! the caller supplied an offset one extra row is fetched: if the first row is
//! the offset itself it is the previous page's last row and gets dropped.
//! Changes-feed offsets are sequence numbers and leave the server sealed by
//! the cursor codec.

use crate::config::ResourceSettings;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use registry_model::Serializer;
use registry_storage::{Staleness, View, ViewKey, ViewMode, ViewQuery, ViewRow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;
pub const MAX_LIMIT_WITH_FIELDS: usize = 100;

const CHANGES_FEED: &str = "changes";
const DATE_MODIFIED_FEED: &str = "dateModified";

/// Query string of a listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingParams {
    pub opt_fields: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub descending: Option<String>,
    pub feed: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLink {
    pub offset: String,
    pub path: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub data: Vec<Value>,
    pub next_page: PageLink,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<PageLink>,
}

/// Page size for a raw `limit` parameter. Anything that is not a positive
/// integer within the cap falls back to [`DEFAULT_LIMIT`].
pub fn clamp_limit(raw: &str, with_fields: bool) -> usize {
    let cap = if with_fields {
        MAX_LIMIT_WITH_FIELDS
    } else {
        MAX_LIMIT
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return DEFAULT_LIMIT;
    }
    match raw.parse::<usize>() {
        Ok(n) if n > 0 && n <= cap => n,
        _ => DEFAULT_LIMIT,
    }
}

pub struct Paginator<'a> {
    state: &'a AppState,
    resource: &'a ResourceSettings,
}

impl<'a> Paginator<'a> {
    pub fn new(state: &'a AppState, resource: &'a ResourceSettings) -> Self {
        Self { state, resource }
    }

    pub fn list(&self, params: &ListingParams, base_url: &str) -> ApiResult<PageResult> {
        // Query parameters of the next and previous page links.
        let mut next = BTreeMap::new();
        let mut prev = BTreeMap::new();
        let mut both = |key: &'static str, value: &str| {
            next.insert(key, value.to_string());
            prev.insert(key, value.to_string());
        };

        let fields: Vec<String> = match non_empty(&params.opt_fields) {
            Some(raw) => {
                both("opt_fields", raw);
                raw.split(',').map(str::to_string).collect()
            }
            None => Vec::new(),
        };
        let raw_limit = non_empty(&params.limit).unwrap_or_default();
        if !raw_limit.is_empty() {
            both("limit", raw_limit);
        }
        let limit = clamp_limit(raw_limit, !fields.is_empty());

        let feed = non_empty(&params.feed).unwrap_or_default();
        let view = if feed == CHANGES_FEED {
            View::Changes
        } else {
            View::DateModified
        };
        if feed == CHANGES_FEED || feed == DATE_MODIFIED_FEED {
            both("feed", feed);
        }
        let mode_param = non_empty(&params.mode).unwrap_or_default();
        let mode = match ViewMode::from_param(mode_param) {
            Some(mode) => {
                if !mode_param.is_empty() {
                    both("mode", mode_param);
                }
                mode
            }
            None => ViewMode::Real,
        };

        let descending = non_empty(&params.descending).is_some();
        if descending {
            next.insert("descending", "1".to_string());
        } else {
            prev.insert("descending", "1".to_string());
        }

        let offset = non_empty(&params.offset).unwrap_or_default();
        let view_offset = self.start_key(view, offset, descending)?;
        let mut query = ViewQuery::new(&self.resource.schema, view, view_offset.clone());
        query.mode = mode;
        query.descending = descending;
        query.limit = if offset.is_empty() { limit } else { limit + 1 };
        if self.state.settings.update_after {
            query.stale = Staleness::UpdateAfter;
        }

        let mut results = self.fetch(query, &fields)?;

        let bounds = results
            .first()
            .zip(results.last())
            .map(|((_, first), (_, last))| (first.clone(), last.clone()));
        let (next_offset, prev_offset) = match bounds {
            Some((first, last)) => {
                let mut next_key = last;
                let mut prev_key = first.clone();
                if !offset.is_empty() && first == view_offset {
                    results.remove(0);
                } else if !offset.is_empty() {
                    results.truncate(limit);
                    if let Some((_, last)) = results.last() {
                        next_key = last.clone();
                    }
                    prev_key = view_offset;
                }
                (self.publish(view, &next_key)?, self.publish(view, &prev_key)?)
            }
            None => (offset.to_string(), offset.to_string()),
        };

        next.insert("offset", next_offset.clone());
        prev.insert("offset", prev_offset.clone());
        let next_page = self.link(base_url, next_offset, &next);
        let prev_page = (descending || !offset.is_empty())
            .then(|| self.link(base_url, prev_offset, &prev));

        Ok(PageResult {
            data: results
                .into_iter()
                .map(|(item, _)| Value::Object(item))
                .collect(),
            next_page,
            prev_page,
        })
    }

    fn start_key(&self, view: View, offset: &str, descending: bool) -> ApiResult<ViewKey> {
        Ok(match view {
            View::Changes if !offset.is_empty() => {
                let raw = self
                    .state
                    .cursor
                    .decode(offset)
                    .map_err(|_| ApiError::offset_invalid())?;
                if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ApiError::offset_invalid());
                }
                ViewKey::Seq(raw.parse().map_err(|_| ApiError::offset_invalid())?)
            }
            View::Changes if descending => ViewKey::from("now"),
            View::Changes => ViewKey::Seq(0),
            View::DateModified if !offset.is_empty() => ViewKey::from(offset),
            View::DateModified if descending => ViewKey::from("9"),
            View::DateModified => ViewKey::from(""),
        })
    }

    /// Reads one page and shapes each row, keeping its view key.
    fn fetch(
        &self,
        mut query: ViewQuery,
        fields: &[String],
    ) -> ApiResult<Vec<(Map<String, Value>, ViewKey)>> {
        let changes = query.view == View::Changes;
        if fields.is_empty() {
            let rows = self.state.store.query_view(&query)?;
            return Ok(rows
                .into_iter()
                .map(|row| {
                    let mut item = Map::new();
                    item.insert("id".into(), Value::String(row.id.clone()));
                    item.insert("dateModified".into(), date_modified(&row, changes));
                    (item, row.key)
                })
                .collect());
        }

        let mut view_fields = fields.to_vec();
        view_fields.extend(["dateModified".to_string(), "id".to_string()]);

        let listing_fields = &self.resource.listing_fields;
        if fields.iter().all(|f| listing_fields.contains(f)) {
            query.value_fields = listing_fields.clone();
            let rows = self.state.store.query_view(&query)?;
            return Ok(rows
                .into_iter()
                .map(|row| {
                    let mut item: Map<String, Value> = row
                        .value
                        .iter()
                        .filter(|(k, _)| view_fields.contains(*k))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    item.insert("id".into(), Value::String(row.id.clone()));
                    if !changes {
                        item.insert("dateModified".into(), Value::String(row.key.to_string()));
                    }
                    (item, row.key)
                })
                .collect());
        }

        let mut sorted = fields.to_vec();
        sorted.sort();
        tracing::info!(
            message_id = %format!("{}_list_custom", self.resource.item_name()),
            "Used custom fields for {} list: {}",
            self.resource.name,
            sorted.join(",")
        );
        query.include_docs = true;
        let serializer = Serializer::new(&self.state.registry);
        self.state
            .store
            .query_view(&query)?
            .into_iter()
            .filter_map(|row| row.doc.map(|doc| (doc, row.key)))
            .map(|(doc, key)| {
                let item =
                    serializer.serialize_fields(&self.resource.schema, &doc, "view", &view_fields)?;
                Ok::<_, ApiError>((item, key))
            })
            .collect()
    }

    /// Offset as handed to clients.
    fn publish(&self, view: View, key: &ViewKey) -> ApiResult<String> {
        match view {
            View::Changes => Ok(self.state.cursor.encode(&key.to_string())?),
            View::DateModified => Ok(key.to_string()),
        }
    }

    fn link(&self, base_url: &str, offset: String, query: &BTreeMap<&str, String>) -> PageLink {
        let mut encoded = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in query {
            encoded.append_pair(key, value);
        }
        let path = format!(
            "{}/{}?{}",
            self.state.settings.route_prefix(),
            self.resource.name,
            encoded.finish()
        );
        PageLink {
            offset,
            uri: format!("{}{}", base_url.trim_end_matches('/'), path),
            path,
        }
    }
}

fn non_empty(param: &Option<String>) -> Option<&str> {
    param.as_deref().filter(|s| !s.is_empty())
}

fn date_modified(row: &ViewRow, changes: bool) -> Value {
    if changes {
        row.value.get("dateModified").cloned().unwrap_or(Value::Null)
    } else {
        Value::String(row.key.to_string())
    }
}
