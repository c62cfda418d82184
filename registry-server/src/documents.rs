//! Attachment sub-resources under `/<resource>/<id>/documents`.
//!
//! Every version of an attachment stays in the parent's `documents` list;
//! versions share an `id` and the last one is current.

use crate::auth::{access_token, authenticated_role, Principal};
use crate::config::ResourceSettings;
use crate::error::{ApiError, ApiResult};
use crate::resource::{
    base_url, blocking, check_writable, commit, load, now, require_principal, AccessQuery, Created,
    Document,
};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use registry_model::{validate_json_data, RootContext, Serializer, ValidationPipeline};
use registry_patch::apply_data_patch;
use registry_storage::StoredDocument;
use registry_types::generate_id;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

const SCHEMA: &str = "Document";

/// Fields a new version always inherits from the previous one.
const VERSION_WHITELIST: &[&str] = &["id", "datePublished", "author"];
/// Fields a new version never inherits.
const VERSION_BLACKLIST: &[&str] = &["title", "format", "url", "dateModified", "hash"];

#[derive(Debug, Default, Deserialize)]
pub struct DocumentsQuery {
    pub all: Option<String>,
}

fn documents(parent: &Document) -> Vec<Document> {
    parent
        .get("documents")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect()
        })
        .unwrap_or_default()
}

fn id_of(document: &Document) -> &str {
    document.get("id").and_then(Value::as_str).unwrap_or_default()
}

fn view(state: &AppState, document: &Document) -> ApiResult<Value> {
    Ok(Value::Object(
        Serializer::new(&state.registry).serialize(SCHEMA, document, "view")?,
    ))
}

/// Versions of one attachment in upload order.
fn versions(parent: &Document, document_id: &str) -> ApiResult<Vec<Document>> {
    let versions: Vec<_> = documents(parent)
        .into_iter()
        .filter(|d| id_of(d) == document_id)
        .collect();
    if versions.is_empty() {
        return Err(ApiError::not_found("document_id"));
    }
    Ok(versions)
}

/// Parent, caller role and a write check, for every mutating request.
fn writable_parent(
    state: &AppState,
    resource: &ResourceSettings,
    principal: &Principal,
    id: &str,
    token: Option<&str>,
) -> ApiResult<(StoredDocument, String)> {
    let parent = load(state, resource, id)?;
    let role = authenticated_role(Some(principal), &parent.body, token, &resource.owner_role);
    check_writable(resource, &parent.body, &role).map_err(|e| e.for_role(&role))?;
    Ok((parent, role))
}

fn replace_documents(parent: &StoredDocument, items: Vec<Document>) -> Document {
    let mut updated = parent.body.clone();
    updated.insert(
        "documents".into(),
        Value::Array(items.into_iter().map(Value::Object).collect()),
    );
    updated
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
    Query(query): Query<DocumentsQuery>,
) -> ApiResult<Json<Value>> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let parent = load(&state, resource, &id)?;
        let items = documents(&parent.body);
        let data = if query.all.is_some_and(|all| !all.is_empty()) {
            items
                .iter()
                .map(|d| view(&state, d))
                .collect::<ApiResult<Vec<_>>>()?
        } else {
            let mut latest: BTreeMap<String, Document> = BTreeMap::new();
            for item in items {
                latest.insert(id_of(&item).to_string(), item);
            }
            let mut current: Vec<_> = latest.into_values().collect();
            current.sort_by(|a, b| {
                let key = |d: &Document| d.get("dateModified").and_then(Value::as_str).map(str::to_string);
                key(a).cmp(&key(b))
            });
            current
                .iter()
                .map(|d| view(&state, d))
                .collect::<ApiResult<Vec<_>>>()?
        };
        Ok(Json(json!({ "data": data })))
    })
    .await
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
    Query(access): Query<AccessQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Created> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let principal = require_principal(&state, &headers)?;
        let token = access_token(access.acc_token.as_deref(), &headers);
        let (parent, role) = writable_parent(&state, resource, &principal, &id, token.as_deref())?;

        let inner = || -> ApiResult<Created> {
            let data = validate_json_data(&body)?;
            let pipeline = ValidationPipeline::new(&state.registry, state.timezone);
            let mut document = pipeline.validate_data(SCHEMA, &data, None, &RootContext::new(&role))?;
            let document_id = generate_id();
            let date = now(&state);
            document.insert("id".into(), json!(document_id));
            document.insert("datePublished".into(), json!(date));
            document.insert("dateModified".into(), json!(date));
            document.insert("author".into(), json!(role));

            let mut items = documents(&parent.body);
            items.push(document.clone());
            commit(
                &state,
                resource,
                &parent.id,
                Some(&parent),
                replace_documents(&parent, items),
                &principal.name,
            )?;
            tracing::info!(
                message_id = %format!("{}_document_create", resource.item_name()),
                document_id = %document_id,
                "Created {} document {}",
                resource.item_name(),
                document_id
            );
            let location = format!(
                "{}{}/{}/{}/documents/{}",
                base_url(&state, &headers),
                state.settings.route_prefix(),
                resource.name,
                parent.id,
                document_id
            );
            Ok((
                StatusCode::CREATED,
                [(LOCATION, location)],
                Json(json!({ "data": view(&state, &document)? })),
            ))
        };
        inner().map_err(|e| e.for_role(&role))
    })
    .await
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path((name, id, document_id)): Path<(String, String, String)>,
) -> ApiResult<Json<Value>> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let parent = load(&state, resource, &id)?;
        let mut versions = versions(&parent.body, &document_id)?;
        let Some(latest) = versions.pop() else {
            return Err(ApiError::not_found("document_id"));
        };
        let url = latest.get("url").cloned();
        let previous = versions
            .iter()
            .filter(|d| d.get("url").cloned() != url)
            .map(|d| view(&state, d))
            .collect::<ApiResult<Vec<_>>>()?;
        let mut data = view(&state, &latest)?;
        if let Value::Object(data) = &mut data {
            data.insert("previousVersions".into(), Value::Array(previous));
        }
        Ok(Json(json!({ "data": data })))
    })
    .await
}

/// Builds a new version from the uploaded fields and the current version.
fn next_version(uploaded: Document, previous: &Document, date: &str) -> Document {
    let mut version: Document = uploaded;
    for field in VERSION_WHITELIST {
        if let Some(value) = previous.get(*field) {
            version.insert((*field).to_string(), value.clone());
        }
    }
    for (field, value) in previous {
        if !VERSION_BLACKLIST.contains(&field.as_str()) && !version.contains_key(field) {
            version.insert(field.clone(), value.clone());
        }
    }
    version.insert("dateModified".into(), Value::String(date.to_string()));
    version
}

pub async fn put_document(
    State(state): State<Arc<AppState>>,
    Path((name, id, document_id)): Path<(String, String, String)>,
    Query(access): Query<AccessQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let principal = require_principal(&state, &headers)?;
        let token = access_token(access.acc_token.as_deref(), &headers);
        let (parent, role) = writable_parent(&state, resource, &principal, &id, token.as_deref())?;

        let inner = || -> ApiResult<Json<Value>> {
            let mut history = versions(&parent.body, &document_id)?;
            let Some(previous) = history.pop() else {
                return Err(ApiError::not_found("document_id"));
            };
            let data = validate_json_data(&body)?;
            let pipeline = ValidationPipeline::new(&state.registry, state.timezone);
            let uploaded = pipeline.validate_data(SCHEMA, &data, None, &RootContext::new(&role))?;
            let version = next_version(uploaded, &previous, &now(&state));

            let mut items = documents(&parent.body);
            items.push(version.clone());
            commit(
                &state,
                resource,
                &parent.id,
                Some(&parent),
                replace_documents(&parent, items),
                &principal.name,
            )?;
            tracing::info!(
                message_id = %format!("{}_document_put", resource.item_name()),
                document_id = %document_id,
                "Updated {} document {}",
                resource.item_name(),
                document_id
            );
            Ok(Json(json!({ "data": view(&state, &version)? })))
        };
        inner().map_err(|e| e.for_role(&role))
    })
    .await
}

pub async fn patch_document(
    State(state): State<Arc<AppState>>,
    Path((name, id, document_id)): Path<(String, String, String)>,
    Query(access): Query<AccessQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let principal = require_principal(&state, &headers)?;
        let token = access_token(access.acc_token.as_deref(), &headers);
        let (parent, role) = writable_parent(&state, resource, &principal, &id, token.as_deref())?;

        let inner = || -> ApiResult<Json<Value>> {
            let mut items = documents(&parent.body);
            let Some(index) = items.iter().rposition(|d| id_of(d) == document_id) else {
                return Err(ApiError::not_found("document_id"));
            };
            let data = validate_json_data(&body)?;
            let pipeline = ValidationPipeline::new(&state.registry, state.timezone);
            let validated =
                pipeline.validate_data(SCHEMA, &data, Some(&items[index]), &RootContext::new(&role))?;
            let patched = apply_data_patch(
                &Value::Object(items[index].clone()),
                &Value::Object(validated),
            )?;
            let Some(Value::Object(mut updated)) = patched else {
                return Ok(Json(json!({ "data": view(&state, &items[index])? })));
            };
            updated.insert("dateModified".into(), Value::String(now(&state)));
            items[index] = updated.clone();
            commit(
                &state,
                resource,
                &parent.id,
                Some(&parent),
                replace_documents(&parent, items),
                &principal.name,
            )?;
            tracing::info!(
                message_id = %format!("{}_document_patch", resource.item_name()),
                document_id = %document_id,
                "Updated {} document {}",
                resource.item_name(),
                document_id
            );
            Ok(Json(json!({ "data": view(&state, &updated)? })))
        };
        inner().map_err(|e| e.for_role(&role))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_version_inherits_identity_but_not_content() {
        let previous: Map<String, Value> = json!({
            "id": "d1",
            "datePublished": "2026-01-01T00:00:00.000000+02:00",
            "author": "asset_owner",
            "title": "old.pdf",
            "url": "http://old",
            "format": "application/pdf",
            "documentType": "notice",
            "description": "kept"
        })
        .as_object()
        .cloned()
        .unwrap();
        let uploaded: Map<String, Value> = json!({
            "id": "ignored",
            "title": "new.pdf",
            "url": "http://new",
            "format": "application/pdf",
            "description": "replaced"
        })
        .as_object()
        .cloned()
        .unwrap();

        let version = next_version(uploaded, &previous, "2026-02-01T00:00:00.000000+02:00");
        assert_eq!(
            Value::Object(version),
            json!({
                "id": "d1",
                "title": "new.pdf",
                "url": "http://new",
                "format": "application/pdf",
                "description": "replaced",
                "datePublished": "2026-01-01T00:00:00.000000+02:00",
                "author": "asset_owner",
                "documentType": "notice",
                "dateModified": "2026-02-01T00:00:00.000000+02:00"
            })
        );
    }
}
