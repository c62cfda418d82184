//! Top-level resource handlers: listing, create, read and patch.

use crate::auth::{access_token, authenticate, authenticated_role, Principal};
use crate::config::ResourceSettings;
use crate::error::{ApiError, ApiResult};
use crate::listing::{ListingParams, PageResult, Paginator};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{HOST, LOCATION};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::Json;
use registry_model::status::{check_editing, check_terminated, check_transition};
use registry_model::{validate_json_data, RootContext, Serializer, ValidationPipeline, ADMINISTRATOR};
use registry_patch::{apply_data_patch, full_diff};
use registry_storage::StoredDocument;
use registry_types::{generate_id, Revision, Timestamp};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub(crate) type Document = Map<String, Value>;

/// `201 Created` with a `Location` header.
pub(crate) type Created = (StatusCode, [(HeaderName, String); 1], Json<Value>);

const TEST_TITLE_MARKS: [(&str, &str); 3] = [
    ("title", "[ТЕСТУВАННЯ]"),
    ("title_en", "[TESTING]"),
    ("title_ru", "[ТЕСТИРОВАНИЕ]"),
];

#[derive(Debug, Default, Deserialize)]
pub struct AccessQuery {
    pub acc_token: Option<String>,
}

/// Runs store-bound request work on the blocking pool; SQLite calls never
/// run on the async workers.
pub(crate) async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
}

pub(crate) fn now(state: &AppState) -> String {
    Timestamp::now(state.timezone).to_iso()
}

/// Scheme and host for absolute links.
pub(crate) fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.settings.public_url {
        return url.clone();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

pub(crate) fn require_principal(state: &AppState, headers: &HeaderMap) -> ApiResult<Principal> {
    authenticate(&state.settings.auth, headers).ok_or_else(ApiError::forbidden)
}

/// Fetches a document of the resource's type; anything else is not found.
pub(crate) fn load(
    state: &AppState,
    resource: &ResourceSettings,
    id: &str,
) -> ApiResult<StoredDocument> {
    state
        .store
        .get(id)?
        .filter(|stored| stored.doc_type == resource.schema)
        .ok_or_else(|| ApiError::not_found(&format!("{}_id", resource.item_name())))
}

pub(crate) fn status_of(document: &Document) -> &str {
    document
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Terminal-status and editing-role checks shared by every write to an
/// existing document.
pub(crate) fn check_writable(
    resource: &ResourceSettings,
    document: &Document,
    role: &str,
) -> ApiResult<()> {
    let status = status_of(document);
    check_terminated(resource.item_name(), status, &resource.terminal_statuses)?;
    check_editing(resource.item_name(), status, role, &resource.statuses)?;
    Ok(())
}

/// Appends a revision holding the patch from `updated` back to `previous`
/// and stores `updated`.
pub(crate) fn commit(
    state: &AppState,
    resource: &ResourceSettings,
    id: &str,
    previous: Option<&StoredDocument>,
    mut updated: Document,
    author: &str,
) -> ApiResult<Document> {
    let serializer = Serializer::new(&state.registry);
    let old_plain = match previous {
        Some(stored) => serializer.serialize(&resource.schema, &stored.body, "plain")?,
        None => Map::new(),
    };
    let new_plain = serializer.serialize(&resource.schema, &updated, "plain")?;
    let changes = full_diff(&Value::Object(new_plain), &Value::Object(old_plain))
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let date = now(state);
    let revision = Revision {
        author: Some(author.to_string()),
        date: date.clone(),
        changes,
        rev: previous.map(|stored| stored.rev.clone()),
    };
    let revision = serde_json::to_value(revision).map_err(|e| ApiError::internal(e.to_string()))?;
    match updated.get_mut("revisions") {
        Some(Value::Array(revisions)) => revisions.push(revision),
        _ => {
            updated.insert("revisions".into(), Value::Array(vec![revision]));
        }
    }
    updated.insert("dateModified".into(), Value::String(date));

    let expected = previous.map(|stored| stored.rev.as_str());
    let rev = state.store.save(id, &resource.schema, &updated, expected)?;
    tracing::debug!(id, rev = %rev, "revision stored");
    Ok(updated)
}

/// Prefixes the titles of test-mode documents with a marker.
fn mark_test_titles(document: &mut Document) {
    for (field, marker) in TEST_TITLE_MARKS {
        let current = document.get(field).and_then(Value::as_str).unwrap_or_default();
        if !current.contains(marker) {
            let marked = format!("{marker} {current}");
            document.insert(field.to_string(), Value::String(marked));
        }
    }
}

fn view(state: &AppState, resource: &ResourceSettings, document: &Document) -> ApiResult<Value> {
    Ok(Value::Object(Serializer::new(&state.registry).serialize(
        &resource.schema,
        document,
        "view",
    )?))
}

pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<ListingParams>,
    headers: HeaderMap,
) -> ApiResult<Json<PageResult>> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let page = Paginator::new(&state, resource).list(&params, &base_url(&state, &headers))?;
        Ok(Json(page))
    })
    .await
}

pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Created> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let principal = require_principal(&state, &headers)?;
        let role = if principal.is_admin() {
            ADMINISTRATOR
        } else {
            principal.group.as_str()
        };
        create(&state, resource, &principal, role, &body, &headers).map_err(|e| e.for_role(role))
    })
    .await
}

fn create(
    state: &AppState,
    resource: &ResourceSettings,
    principal: &Principal,
    role: &str,
    body: &[u8],
    headers: &HeaderMap,
) -> ApiResult<Created> {
    if !principal.is_admin() && !resource.create_groups.contains(&principal.group) {
        return Err(ApiError::forbidden());
    }
    let data = validate_json_data(body)?;
    let pipeline = ValidationPipeline::new(&state.registry, state.timezone);
    let mut document =
        pipeline.validate_data(&resource.schema, &data, None, &RootContext::new(role))?;

    let id = generate_id();
    let token = generate_id();
    let date = now(state);
    document.insert("id".into(), json!(id));
    document.insert("date".into(), json!(date));
    document.insert("owner".into(), json!(principal.name));
    document.insert("owner_token".into(), json!(token));
    document.insert("status".into(), json!(resource.initial_status));
    document.insert("doc_type".into(), json!(resource.schema));
    if document.get("mode").and_then(Value::as_str) == Some("test") {
        mark_test_titles(&mut document);
    }

    let saved = commit(state, resource, &id, None, document, &principal.name)?;
    tracing::info!(
        message_id = %format!("{}_create", resource.item_name()),
        id = %id,
        "Created {} {}",
        resource.item_name(),
        id
    );
    let location = format!(
        "{}{}/{}/{}",
        base_url(state, headers),
        state.settings.route_prefix(),
        resource.name,
        id
    );
    let body = json!({
        "data": view(state, resource, &saved)?,
        "access": {"token": token},
    });
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(body)))
}

pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let stored = load(&state, resource, &id)?;
        Ok(Json(json!({"data": view(&state, resource, &stored.body)?})))
    })
    .await
}

pub async fn patch_resource(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
    Query(access): Query<AccessQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    blocking(move || {
        let resource = state.resource(&name)?;
        let principal = require_principal(&state, &headers)?;
        let stored = load(&state, resource, &id)?;
        let token = access_token(access.acc_token.as_deref(), &headers);
        let role = authenticated_role(
            Some(&principal),
            &stored.body,
            token.as_deref(),
            &resource.owner_role,
        );
        patch(&state, resource, &principal, &role, stored, &body).map_err(|e| e.for_role(&role))
    })
    .await
}

fn patch(
    state: &AppState,
    resource: &ResourceSettings,
    principal: &Principal,
    role: &str,
    stored: StoredDocument,
    body: &[u8],
) -> ApiResult<Json<Value>> {
    check_writable(resource, &stored.body, role)?;
    let data = validate_json_data(body)?;
    let pipeline = ValidationPipeline::new(&state.registry, state.timezone);
    let validated = pipeline.validate_data(
        &resource.schema,
        &data,
        Some(&stored.body),
        &RootContext::new(role),
    )?;
    check_transition(
        resource.item_name(),
        status_of(&stored.body),
        validated.get("status").and_then(Value::as_str),
        role,
        &resource.statuses,
    )?;

    let updated = match apply_data_patch(
        &Value::Object(stored.body.clone()),
        &Value::Object(validated),
    )? {
        Some(Value::Object(updated)) => updated,
        _ => {
            return Ok(Json(json!({"data": view(state, resource, &stored.body)?})));
        }
    };
    let saved = commit(state, resource, &stored.id, Some(&stored), updated, &principal.name)?;
    tracing::info!(
        message_id = %format!("{}_patch", resource.item_name()),
        id = %stored.id,
        "Updated {} {}",
        resource.item_name(),
        stored.id
    );
    Ok(Json(json!({"data": view(state, resource, &saved)?})))
}
